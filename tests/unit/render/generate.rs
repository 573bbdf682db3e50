use super::*;
use crate::foundation::core::{Placement, Vec3};
use crate::receiver::plane::ReceiverDesc;
use crate::receiver::registry::ReceiverRegistry;
use crate::water::field::NormalField;
use crate::water::provider::StaticWater;
use std::sync::Arc;

/// 8x8 m flat water sampled on a 128x128 grid (0.0625 m cells).
fn aligned_water() -> Arc<StaticWater> {
    let normal = NormalField::filled(16, 16, Vec3::Y).unwrap();
    Arc::new(StaticWater::flat(Vec2::new(8.0, 8.0)).with_fields(None, Some(normal)))
}

/// 6x3 m receiver with 0.0625 m texels, `height` metres above the water, facing it.
fn receiver_at(height: f32, pitch_deg: f32) -> Arc<ReceiverPlane> {
    let desc = ReceiverDesc {
        placement: Placement::from_euler_degrees(
            Vec3::new(0.0, height, 0.0),
            Vec3::new(pitch_deg, 0.0, 0.0),
        )
        .unwrap(),
        resolution: UVec2::new(96, 48),
        ..ReceiverDesc::default()
    };
    ReceiverPlane::new("ceiling", desc).unwrap()
}

fn registry_with(receiver: &Arc<ReceiverPlane>) -> ReceiverRegistry {
    let registry = ReceiverRegistry::new();
    registry.set_water(aligned_water());
    receiver.activate(&registry).unwrap();
    registry
}

fn assert_uniform(texture: &IntensityTexture, expected: f32) {
    for &v in texture.texels().unwrap() {
        assert!((v - expected).abs() < 1e-4, "texel {v} != {expected}");
    }
}

#[test]
fn invalid_settings_disable_the_stage() {
    let bad_ior = GenerationSettings {
        ior: 0.0,
        ..GenerationSettings::default()
    };
    let bad_band = GenerationSettings {
        band_rows: 0,
        ..GenerationSettings::default()
    };
    assert!(bad_ior.validate().is_err());
    assert!(bad_band.validate().is_err());

    let receiver = receiver_at(2.0, 90.0);
    let registry = registry_with(&receiver);
    receiver.with_texture_mut(|t| t.texels_mut().fill(3.0));

    let mut stage = GenerationStage::new(bad_ior);
    assert!(!stage.is_enabled());
    assert_eq!(stage.execute(&registry.snapshot()), GenerationReport::default());
    assert_eq!(receiver.texture_snapshot().unwrap().max_value(), 3.0);
}

#[test]
fn missing_water_leaves_textures_untouched() {
    let receiver = receiver_at(2.0, 90.0);
    let registry = registry_with(&receiver);
    registry.clear_water();
    receiver.with_texture_mut(|t| t.texels_mut().fill(1.5));

    let report = GenerationStage::default().execute(&registry.snapshot());
    assert_eq!(report.receivers_rendered, 0);
    assert_eq!(receiver.texture_snapshot().unwrap().max_value(), 1.5);
}

#[test]
fn receivers_without_texture_are_skipped() {
    let receiver = receiver_at(2.0, 90.0);
    let registry = ReceiverRegistry::new();
    registry.set_water(aligned_water());
    registry.register(&receiver);

    let report = GenerationStage::default().execute(&registry.snapshot());
    assert_eq!(report.receivers_skipped, 1);
    assert_eq!(report.receivers_rendered, 0);
    assert!(!receiver.has_texture());
}

#[test]
fn flat_water_under_a_ceiling_reflects_f0_everywhere() {
    let receiver = receiver_at(2.0, 90.0);
    let registry = registry_with(&receiver);

    let report = GenerationStage::default().execute(&registry.snapshot());
    assert_eq!(report.receivers_rendered, 1);
    assert_eq!(report.samples, 128 * 128);
    assert_eq!(report.splats, 96 * 48);
    assert_uniform(&receiver.texture_snapshot().unwrap(), 0.02);
}

#[test]
fn full_pass_matches_point_grid_on_flat_water() {
    let receiver = receiver_at(2.0, 90.0);
    let registry = registry_with(&receiver);

    let mut stage = GenerationStage::new(GenerationSettings {
        mode: GenerationMode::FullPass,
        ..GenerationSettings::default()
    });
    let report = stage.execute(&registry.snapshot());
    assert_eq!(report.samples, 96 * 48);
    assert_eq!(report.splats, 96 * 48);
    assert_uniform(&receiver.texture_snapshot().unwrap(), 0.02);
}

#[test]
fn refraction_lights_a_floor_with_the_transmitted_fraction() {
    let receiver = receiver_at(-2.0, -90.0);
    let registry = registry_with(&receiver);

    let mut stage = GenerationStage::new(GenerationSettings {
        transport: TransportMode::Refract,
        ..GenerationSettings::default()
    });
    stage.execute(&registry.snapshot());
    assert_uniform(&receiver.texture_snapshot().unwrap(), 0.98);
}

#[test]
fn debug_textures_describe_the_first_receiver() {
    let receiver = receiver_at(2.0, 90.0);
    let registry = registry_with(&receiver);

    let mut stage = GenerationStage::new(GenerationSettings {
        publish_debug: true,
        ..GenerationSettings::default()
    });
    stage.execute(&registry.snapshot());

    let debug = stage.debug_textures();
    assert_uniform(debug.get(FRESNEL_TEXTURE).unwrap(), 0.02);
    assert_uniform(debug.get(JACOBIAN_TEXTURE).unwrap(), 1.0);
    assert_uniform(debug.get(PLANE_DISTANCE_TEXTURE).unwrap(), 0.0);
    assert!(debug.get(crate::render::debug::SHADOW_MASK_TEXTURE).is_none());
}

#[test]
fn zero_distance_tolerance_keeps_every_on_plane_hit() {
    use crate::receiver::registry::SunLight;
    use crate::water::waves::{GerstnerParams, synthesize};

    let size = Vec2::splat(8.0);
    let (h, n) = synthesize(size, (64, 64), &GerstnerParams::default(), 0.75).unwrap();
    let water = Arc::new(StaticWater::flat(size).with_fields(Some(h), Some(n)));

    let run = |tolerance: f32| {
        let desc = ReceiverDesc {
            placement: Placement::from_euler_degrees(
                Vec3::new(6.0, 3.0, 0.0),
                Vec3::new(0.0, -90.0, 0.0),
            )
            .unwrap(),
            resolution: UVec2::new(128, 64),
            distance_tolerance: tolerance,
            ..ReceiverDesc::default()
        };
        let wall = ReceiverPlane::new("wall", desc).unwrap();
        let registry = ReceiverRegistry::new();
        registry.set_water(water.clone());
        registry.set_sun(Some(SunLight {
            forward: Vec3::new(1.0, -1.0, 0.0),
        }));
        wall.activate(&registry).unwrap();
        let report = GenerationStage::default().execute(&registry.snapshot());
        (report, wall.texture_snapshot().unwrap())
    };

    let (loose, loose_tex) = run(0.02);
    let (exact, exact_tex) = run(0.0);
    assert!(loose.splats > 0);
    assert_eq!(exact.splats, loose.splats);
    assert_eq!(exact_tex.fingerprint(), loose_tex.fingerprint());
}

#[test]
fn zero_tolerance_ceiling_is_fully_lit() {
    let desc = ReceiverDesc {
        placement: Placement::from_euler_degrees(Vec3::new(0.0, 2.0, 0.0), Vec3::new(90.0, 0.0, 0.0))
            .unwrap(),
        resolution: UVec2::new(96, 48),
        distance_tolerance: 0.0,
        ..ReceiverDesc::default()
    };
    let receiver = ReceiverPlane::new("ceiling", desc).unwrap();
    let registry = registry_with(&receiver);

    let report = GenerationStage::default().execute(&registry.snapshot());
    assert_eq!(report.splats, 96 * 48);
    assert_uniform(&receiver.texture_snapshot().unwrap(), 0.02);
}

#[test]
fn grid_splats_land_in_the_texel_under_the_hit() {
    // Every grid sample maps to its own texel on the ceiling, so no texel sums two splats.
    let receiver = receiver_at(2.0, 90.0);
    let registry = registry_with(&receiver);
    GenerationStage::default().execute(&registry.snapshot());
    let t = receiver.texture_snapshot().unwrap();
    assert!((t.texel(0, 0) - 0.02).abs() < 1e-6);
    assert!((t.texel(95, 47) - 0.02).abs() < 1e-6);
    assert!(t.max_value() < 0.02 + 1e-6);
}
