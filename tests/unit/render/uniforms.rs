use super::*;
use crate::foundation::core::{Placement, Quat, Rgb};
use crate::receiver::registry::SunLight;
use crate::water::provider::StaticWater;

#[test]
fn blocks_are_sixteen_byte_multiples() {
    assert_eq!(std::mem::size_of::<GenUniforms>() % 16, 0);
    assert_eq!(std::mem::size_of::<ReceiverUniforms>() % 16, 0);
    assert_eq!(std::mem::size_of::<CompositeUniforms>() % 16, 0);
    let c = CompositeUniforms::default();
    assert_eq!(c.as_bytes().len(), std::mem::size_of::<CompositeUniforms>());
}

#[test]
fn default_composite_slots_are_identity_and_empty() {
    let c = CompositeUniforms::default();
    for i in 0..MAX_RECEIVERS {
        assert_eq!(c.world_to_plane(i), Mat4::IDENTITY);
        assert_eq!(c.plane_info(i), Vec4::ZERO);
    }
    assert_eq!(c.receiver_count, 0);
    let batch = CompositeBatch {
        uniforms: c,
        slots: [TextureSlot::Black; MAX_RECEIVERS],
    };
    assert_eq!(batch.count(), 0);
}

#[test]
fn gen_uniforms_carry_grid_and_normalised_sun() {
    let water = StaticWater::flat(Vec2::new(8.0, 4.0));
    let view = WaterView::new(&water);
    let light = LightingParams {
        sun: Some(SunLight {
            forward: Vec3::new(0.0, -2.0, 0.0),
        }),
        tint: Rgb::new(0.5, 0.25, 1.0),
        ..LightingParams::default()
    };
    let u = GenUniforms::new(&view, UVec2::new(64, 32), &light);
    assert_eq!(u.grid(), UVec2::new(64, 32));
    assert_eq!(u.water_grid_params[2], 1.0 / 64.0);
    assert!((u.sun_dir() - Vec3::NEG_Y).length() < 1e-6);
    assert_eq!(u.water_size(), Vec2::new(8.0, 4.0));
    assert_eq!(u.water_size[2], 1.0 / 8.0);
    assert_eq!(u.tint, [0.5, 0.25, 1.0, 1.0]);
}

#[test]
fn receiver_uniforms_guard_reciprocals() {
    let desc = ReceiverDesc {
        placement: Placement::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY).unwrap(),
        two_sided: true,
        ..ReceiverDesc::default()
    };
    let u = ReceiverUniforms::new(&desc, UVec2::new(1024, 512));
    assert_eq!(u.plane_size, [6.0, 3.0, 1.0 / 6.0, 1.0 / 3.0]);
    assert_eq!(u.receiver_resolution[3], 1.0 / 512.0);
    assert_eq!(u.plane_two_sided, 1.0);
    let to_world = Mat4::from_cols_array(&u.plane_to_world);
    assert_eq!(to_world.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));

    let tiny = ReceiverDesc {
        size_meters: Vec2::new(1e-6, 1.0),
        ..ReceiverDesc::default()
    };
    let u = ReceiverUniforms::new(&tiny, UVec2::new(1, 1));
    assert_eq!(u.plane_size[2], 1.0 / TEXEL_EPSILON);
}
