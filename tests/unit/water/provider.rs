use super::*;
use crate::foundation::core::Quat;

#[test]
fn static_water_defaults_follow_dummy_provider() {
    let w = StaticWater::default();
    assert_eq!(w.size_meters(), Vec2::new(8.0, 8.0));
    assert_eq!(w.water_to_world(), Mat4::IDENTITY);
    assert!((w.normal_texel_size() - 1.0 / 512.0).abs() < 1e-9);
    assert!(w.normal_texture().is_none());
    assert!(w.height_texture().is_none());
}

#[test]
fn texel_size_follows_normal_width() {
    let w = StaticWater::default().with_fields(None, Some(NormalField::filled(64, 32, Vec3::Y).unwrap()));
    assert!((w.normal_texel_size() - 1.0 / 64.0).abs() < 1e-9);
}

#[test]
fn missing_fields_resolve_to_flat_zero_surface() {
    let w = StaticWater::flat(Vec2::new(4.0, 2.0));
    let view = WaterView::new(&w);
    let p = view.surface_at(Vec2::new(1.0, 0.0));
    assert!((p.position - Vec3::new(2.0, 0.0, -1.0)).length() < 1e-6);
    assert_eq!(p.normal, Vec3::Y);
}

#[test]
fn transform_moves_positions_and_rotates_normals() {
    let m = Mat4::from_rotation_translation(
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Vec3::new(0.0, 1.0, 0.0),
    );
    let w = StaticWater::flat(Vec2::new(2.0, 2.0)).with_transform(m);
    let view = WaterView::new(&w);
    let p = view.surface_at(Vec2::new(0.5, 0.5));
    assert!((p.position - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    assert!((p.normal - Vec3::NEG_X).length() < 1e-5);
}

#[test]
fn texel_size_is_floored_in_the_view() {
    struct Tiny;
    impl WaterSurfaceProvider for Tiny {
        fn normal_texture(&self) -> Option<&NormalField> {
            None
        }
        fn height_texture(&self) -> Option<&HeightField> {
            None
        }
        fn size_meters(&self) -> Vec2 {
            Vec2::ONE
        }
        fn water_to_world(&self) -> Mat4 {
            Mat4::IDENTITY
        }
        fn normal_texel_size(&self) -> f32 {
            0.0
        }
    }
    let view = WaterView::new(&Tiny);
    assert_eq!(view.normal_texel_size, crate::foundation::math::TEXEL_EPSILON);
}
