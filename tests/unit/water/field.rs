use super::*;

#[test]
fn from_vec_rejects_wrong_length() {
    assert!(HeightField::from_vec(2, 2, vec![0.0; 3]).is_err());
    assert!(HeightField::from_vec(0, 2, vec![]).is_err());
}

#[test]
fn sample_interpolates_between_texel_centres() {
    let f = HeightField::from_vec(2, 1, vec![0.0, 1.0]).unwrap();
    assert!((f.sample(Vec2::new(0.25, 0.5)) - 0.0).abs() < 1e-6);
    assert!((f.sample(Vec2::new(0.75, 0.5)) - 1.0).abs() < 1e-6);
    assert!((f.sample(Vec2::new(0.5, 0.5)) - 0.5).abs() < 1e-6);
}

#[test]
fn sample_clamps_outside_the_unit_square() {
    let f = HeightField::from_vec(2, 1, vec![3.0, 5.0]).unwrap();
    assert_eq!(f.sample(Vec2::new(-1.0, 0.5)), 3.0);
    assert_eq!(f.sample(Vec2::new(2.0, 0.5)), 5.0);
}

#[test]
fn flat_normal_map_decodes_to_up() {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([128, 128, 255]));
    let f = NormalField::from_tangent_rgb_image(&img).unwrap();
    let n = f.sample(Vec2::new(0.5, 0.5));
    assert!((n - Vec3::Y).length() < 0.01);
}

#[test]
fn luma_image_scales_heights() {
    let img = image::GrayImage::from_pixel(2, 2, image::Luma([255]));
    let f = HeightField::from_luma_image(&img, 0.5).unwrap();
    assert!((f.sample(Vec2::new(0.5, 0.5)) - 0.5).abs() < 1e-6);
}
