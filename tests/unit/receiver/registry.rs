use super::*;
use crate::foundation::core::Vec2;
use crate::receiver::plane::ReceiverDesc;
use crate::water::provider::StaticWater;

fn plane(name: &str) -> Arc<ReceiverPlane> {
    ReceiverPlane::new(name, ReceiverDesc::default()).unwrap()
}

#[test]
fn register_is_idempotent() {
    let r = ReceiverRegistry::new();
    let a = plane("a");
    r.register(&a);
    r.register(&a);
    assert_eq!(r.len(), 1);
}

#[test]
fn unregister_absent_is_noop() {
    let r = ReceiverRegistry::new();
    let a = plane("a");
    let b = plane("b");
    r.register(&a);
    r.unregister(&b);
    assert_eq!(r.len(), 1);
}

#[test]
fn registration_order_is_preserved() {
    let r = ReceiverRegistry::new();
    let (a, b, c) = (plane("a"), plane("b"), plane("c"));
    r.register(&b);
    r.register(&a);
    r.register(&c);
    r.unregister(&a);
    r.register(&a);
    let names: Vec<String> = r.receivers().iter().map(|p| p.name().to_owned()).collect();
    assert_eq!(names, vec!["b", "c", "a"]);
}

#[test]
fn identity_is_by_pointer_not_name() {
    let r = ReceiverRegistry::new();
    r.register(&plane("same"));
    r.register(&plane("same"));
    assert_eq!(r.len(), 2);
}

#[test]
fn light_direction_defaults_to_down() {
    assert_eq!(resolve_light_direction(None), Vec3::NEG_Y);
    assert_eq!(
        resolve_light_direction(Some(SunLight {
            forward: Vec3::splat(1e-5)
        })),
        Vec3::NEG_Y
    );
    let d = resolve_light_direction(Some(SunLight {
        forward: Vec3::new(0.0, -2.0, 2.0),
    }));
    assert!((d.length() - 1.0).abs() < 1e-6);
}

#[test]
fn setters_store_raw_values_and_snapshot_clamps() {
    let r = ReceiverRegistry::new();
    r.set_f0(1.7);
    r.set_intensity(-3.0);
    r.set_jacobian_gain(f32::NAN);
    assert_eq!(r.f0(), 1.7);
    assert_eq!(r.intensity(), -3.0);

    let s = r.snapshot();
    assert_eq!(s.lighting.f0, 1.0);
    assert_eq!(s.lighting.intensity, 0.0);
    assert_eq!(s.lighting.jacobian_gain, 0.0);
}

#[test]
fn snapshot_is_isolated_from_later_mutation() {
    let r = ReceiverRegistry::new();
    let a = plane("a");
    r.register(&a);
    r.set_water(Arc::new(StaticWater::flat(Vec2::ONE)));
    let snap = r.snapshot();

    r.unregister(&a);
    r.clear_water();
    r.set_intensity(9.0);

    assert_eq!(snap.receivers.len(), 1);
    assert!(snap.water.is_some());
    assert_eq!(snap.lighting.intensity, 1.0);
    assert!(!r.has_water());
}

#[test]
fn empty_snapshot_is_idle() {
    let r = ReceiverRegistry::new();
    assert!(r.snapshot().is_idle());
}
