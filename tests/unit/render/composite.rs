use super::*;
use crate::foundation::core::{Placement, UVec2};
use crate::receiver::plane::{ReceiverDesc, ReceiverPlane};
use crate::receiver::registry::ReceiverRegistry;
use crate::render::frame::PositionBuffer;
use std::sync::Arc;

fn lit_receiver(registry: &ReceiverRegistry, z: f32, value: f32, two_sided: bool) -> Arc<ReceiverPlane> {
    let desc = ReceiverDesc {
        placement: Placement::from_euler_degrees(Vec3::new(0.0, 0.0, z), Vec3::ZERO).unwrap(),
        resolution: UVec2::new(4, 4),
        two_sided,
        ..ReceiverDesc::default()
    };
    let r = ReceiverPlane::new(format!("plane@{z}"), desc).unwrap();
    r.activate(registry).unwrap();
    r.with_texture_mut(|t| t.texels_mut().fill(value));
    r
}

fn positions(points: &[Option<Vec3>]) -> PositionBuffer {
    PositionBuffer::new(points.len() as u32, 1, points.to_vec()).unwrap()
}

#[test]
fn additive_and_multiply_blend_formulas() {
    let mut px = [100, 50, 0, 255];
    blend_pixel(&mut px, 0.1, Vec3::ONE, BlendMode::Additive);
    assert_eq!(px, [126, 76, 26, 255]);

    let mut px = [100, 50, 0, 255];
    blend_pixel(&mut px, 0.5, Vec3::ONE, BlendMode::Multiply);
    assert_eq!(px, [150, 75, 0, 255]);

    let mut px = [250, 0, 0, 255];
    blend_pixel(&mut px, 1.0, Vec3::ONE, BlendMode::Additive);
    assert_eq!(px[0], 255);
}

#[test]
fn translucent_pixels_stay_premultiplied() {
    let mut px = [60, 60, 60, 128];
    blend_pixel(&mut px, 10.0, Vec3::ONE, BlendMode::Additive);
    assert_eq!(px, [128, 128, 128, 128]);
}

#[test]
fn batch_truncates_and_binds_black_for_missing_textures() {
    let registry = ReceiverRegistry::new();
    for i in 0..5 {
        lit_receiver(&registry, i as f32, 1.0, false);
    }
    let bare = ReceiverPlane::new("bare", ReceiverDesc::default()).unwrap();
    registry.register(&bare);

    let stage = CompositeStage::default();
    let batch = stage.build_batch(&registry.snapshot());
    assert_eq!(batch.count(), MAX_RECEIVERS);
    assert_eq!(batch.slots[3], TextureSlot::Receiver(3));
    assert_eq!(batch.uniforms.plane_info(0), Vec4::new(6.0, 3.0, 0.02, 0.0));

    let limited = CompositeStage::new(CompositeSettings {
        max_receivers: 0,
        ..CompositeSettings::default()
    });
    assert_eq!(limited.build_batch(&registry.snapshot()).count(), 1);
}

#[test]
fn no_op_paths_leave_the_frame_and_pool_untouched() {
    let registry = ReceiverRegistry::new();
    let stage = CompositeStage::default();
    let mut pool = SurfacePool::default();
    let mut frame = FrameRGBA::filled(2, 1, [10, 10, 10, 255]);
    let before = frame.clone();
    let world = positions(&[Some(Vec3::ZERO), None]);

    let mut targets = FrameTargets {
        color: Some(&mut frame),
        world: Some(WorldSource::Positions(&world)),
    };
    assert_eq!(stage.execute(&registry.snapshot(), &mut targets, &mut pool), CompositeReport::default());

    lit_receiver(&registry, 0.0, 1.0, false);
    let mut targets = FrameTargets {
        color: Some(&mut frame),
        world: None,
    };
    stage.execute(&registry.snapshot(), &mut targets, &mut pool);

    assert_eq!(frame, before);
    assert_eq!(pool.stats().alloc_surfaces, 0);
}

#[test]
fn first_registered_receiver_wins_and_misses_are_copied() {
    let registry = ReceiverRegistry::new();
    lit_receiver(&registry, 0.0, 0.1, false);
    lit_receiver(&registry, 0.01, 0.5, false);

    let stage = CompositeStage::default();
    let mut pool = SurfacePool::default();
    let mut frame = FrameRGBA::filled(3, 1, [0, 0, 0, 255]);
    let world = positions(&[Some(Vec3::new(0.0, 0.0, 0.005)), Some(Vec3::new(9.0, 0.0, 0.0)), None]);
    let mut targets = FrameTargets {
        color: Some(&mut frame),
        world: Some(WorldSource::Positions(&world)),
    };
    let report = stage.execute(&registry.snapshot(), &mut targets, &mut pool);

    assert_eq!(report.receivers_bound, 2);
    assert_eq!(report.pixels_matched, 1);
    assert_eq!(frame.pixel(0, 0), Some([26, 26, 26, 255]));
    assert_eq!(frame.pixel(1, 0), Some([0, 0, 0, 255]));
    assert_eq!(pool.stats().retained_surfaces, 1);
}

#[test]
fn one_sided_receivers_ignore_points_behind_them() {
    let behind = Some(Vec3::new(0.0, 0.0, -0.01));
    for (two_sided, expected) in [(false, 0), (true, 1)] {
        let registry = ReceiverRegistry::new();
        lit_receiver(&registry, 0.0, 1.0, two_sided);
        let mut frame = FrameRGBA::filled(1, 1, [0, 0, 0, 255]);
        let world = positions(&[behind]);
        let mut targets = FrameTargets {
            color: Some(&mut frame),
            world: Some(WorldSource::Positions(&world)),
        };
        let report = CompositeStage::default().execute(
            &registry.snapshot(),
            &mut targets,
            &mut SurfacePool::default(),
        );
        assert_eq!(report.pixels_matched, expected);
    }
}
