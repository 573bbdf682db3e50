use super::*;
use crate::foundation::core::{UVec2, Vec2, Vec3};
use crate::receiver::plane::{ReceiverDesc, ReceiverPlane};
use crate::render::frame::{FrameRGBA, PositionBuffer, WorldSource};
use crate::water::provider::StaticWater;

#[test]
fn zero_threads_is_rejected() {
    let opts = PipelineOpts {
        threads: Some(0),
        ..PipelineOpts::default()
    };
    assert!(CausticsPipeline::new(Arc::new(ReceiverRegistry::new()), opts).is_err());
}

#[test]
fn generate_only_reports_fingerprints_in_registration_order() {
    let registry = Arc::new(ReceiverRegistry::new());
    let desc = ReceiverDesc {
        resolution: UVec2::new(8, 4),
        ..ReceiverDesc::default()
    };
    let a = ReceiverPlane::new("a", desc).unwrap();
    let b = ReceiverPlane::new("b", desc).unwrap();
    a.activate(&registry).unwrap();
    registry.register(&b);

    let mut pipeline = CausticsPipeline::new(registry, PipelineOpts::default()).unwrap();
    let stats = pipeline.generate_only();
    assert_eq!(stats.fingerprints.len(), 2);
    assert_eq!(stats.fingerprints[0].0, "a");
    assert!(stats.fingerprints[0].1.is_some());
    assert_eq!(stats.fingerprints[1], ("b".to_owned(), None));
    assert_eq!(stats.composite, CompositeReport::default());
}

#[test]
fn render_frame_runs_both_stages() {
    let registry = Arc::new(ReceiverRegistry::new());
    registry.set_water(Arc::new(StaticWater::flat(Vec2::new(0.5, 0.5))));
    let desc = ReceiverDesc {
        resolution: UVec2::new(8, 4),
        ..ReceiverDesc::default()
    };
    let plane = ReceiverPlane::new("wall", desc).unwrap();
    plane.activate(&registry).unwrap();

    let mut pipeline = CausticsPipeline::new(
        Arc::clone(&registry),
        PipelineOpts {
            threads: Some(2),
            ..PipelineOpts::default()
        },
    )
    .unwrap();

    let mut frame = FrameRGBA::filled(1, 1, [0, 0, 0, 255]);
    let world = PositionBuffer::new(1, 1, vec![Some(Vec3::ZERO)]).unwrap();
    let mut targets = FrameTargets {
        color: Some(&mut frame),
        world: Some(WorldSource::Positions(&world)),
    };
    let stats = pipeline.render_frame(&mut targets);
    assert_eq!(stats.generation.receivers_rendered, 1);
    assert_eq!(stats.composite.receivers_bound, 1);
    assert_eq!(stats.composite.pixels_matched, 1);
    assert_eq!(pipeline.pool_stats().retained_surfaces, 1);
}
