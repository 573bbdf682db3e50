use super::*;

#[test]
fn grid_dimension_tracks_normal_texel_size() {
    let g = grid_dimension(Vec2::new(8.0, 4.0), 0.5).unwrap();
    assert_eq!(g, UVec2::new(16, 8));
}

#[test]
fn grid_dimension_floors_texel_and_clamps_to_bounds() {
    let g = grid_dimension(Vec2::new(8.0, 8.0), 0.0).unwrap();
    assert_eq!(g, UVec2::new(MAX_GRID_DIMENSION, MAX_GRID_DIMENSION));

    let g = grid_dimension(Vec2::new(0.01, 0.01), 1.0).unwrap();
    assert_eq!(g, UVec2::new(1, 1));
}

#[test]
fn grid_dimension_rejects_zero_area_water() {
    assert!(grid_dimension(Vec2::new(0.0, 4.0), 0.1).is_none());
    assert!(grid_dimension(Vec2::new(4.0, -1.0), 0.1).is_none());
    assert!(grid_dimension(Vec2::new(f32::NAN, 1.0), 0.1).is_none());
}

#[test]
fn schlick_endpoints() {
    assert!((fresnel_schlick(0.02, 1.0) - 0.02).abs() < 1e-6);
    assert!((fresnel_schlick(0.02, 0.0) - 1.0).abs() < 1e-6);
    let mid = fresnel_schlick(0.02, 0.5);
    assert!(mid > 0.02 && mid < 1.0);
}

#[test]
fn reflect_flips_normal_component() {
    let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
    assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
}

#[test]
fn refract_at_normal_incidence_goes_straight() {
    let t = refract(Vec3::NEG_Y, Vec3::Y, 1.0 / 1.333).unwrap();
    assert!((t - Vec3::NEG_Y).length() < 1e-6);
}

#[test]
fn refract_reports_total_internal_reflection() {
    let d = Vec3::new(0.95, -0.312_25, 0.0).normalize();
    assert!(refract(d, Vec3::Y, 1.333).is_none());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}
