use super::*;
use crate::foundation::core::Vec3;

#[test]
fn filled_frame_is_consistent() {
    let f = FrameRGBA::filled(3, 2, [10, 20, 30, 255]);
    assert!(f.is_consistent());
    assert_eq!(f.pixel(2, 1), Some([10, 20, 30, 255]));
    assert_eq!(f.pixel(3, 0), None);
}

#[test]
fn position_buffer_rejects_wrong_length() {
    assert!(PositionBuffer::new(2, 2, vec![None; 3]).is_err());
    let mut p = PositionBuffer::empty(2, 2);
    p.set(1, 1, Some(Vec3::ONE));
    assert_eq!(p.get(3), Some(Vec3::ONE));
    assert_eq!(p.get(0), None);
}

#[test]
fn depth_reconstruction_inverts_projection() {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
    let view_proj = proj * view;

    let w = 5;
    let target = Vec3::new(0.0, 0.0, 1.0);
    let clip = view_proj * target.extend(1.0);
    let ndc_z = clip.z / clip.w;

    let mut depth = vec![1.0; w * w];
    depth[2 * w + 2] = ndc_z;
    let buf = DepthBuffer::new(w as u32, w as u32, depth, view_proj.inverse()).unwrap();

    let p = buf.world_position(2 * w + 2).unwrap();
    assert!((p - target).length() < 1e-3, "{p:?}");
    assert_eq!(buf.world_position(0), None);
}
