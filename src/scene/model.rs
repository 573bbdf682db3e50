use crate::foundation::core::{Rgb, UVec2, Vec2, Vec3};
use crate::receiver::registry::LightingParams;
use crate::render::composite::CompositeSettings;
use crate::render::generate::GenerationSettings;
use crate::water::provider::DEFAULT_WATER_SIZE;
use crate::water::waves::GerstnerParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level JSON scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    /// Light direction, tint and strength.
    #[serde(default)]
    pub lighting: LightingParams,
    /// Water patch; omitted means nothing is rendered.
    #[serde(default)]
    pub water: Option<WaterDef>,
    /// Receiver planes in registration order.
    #[serde(default)]
    pub receivers: Vec<ReceiverDef>,
    /// Generation stage settings.
    #[serde(default)]
    pub generation: GenerationSettings,
    /// Composite stage settings.
    #[serde(default)]
    pub composite: CompositeSettings,
    /// Preview camera for `caustics render`.
    #[serde(default)]
    pub camera: Option<CameraDef>,
}

/// Water patch placement and surface source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaterDef {
    /// Extent in metres (x, z).
    #[serde(default = "default_water_size")]
    pub size: Vec2,
    /// World position of the patch centre.
    #[serde(default)]
    pub position: Vec3,
    /// Euler rotation in degrees (yaw Y, pitch X, roll Z).
    #[serde(default)]
    pub rotation_deg: Vec3,
    /// Where the surface fields come from.
    #[serde(default)]
    pub surface: SurfaceDef,
}

fn default_water_size() -> Vec2 {
    DEFAULT_WATER_SIZE
}

/// Water surface source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceDef {
    /// Still water.
    #[default]
    Flat,
    /// Normal and height maps on disk, relative to the scene file.
    Images {
        /// Tangent-space RGB normal map.
        #[serde(default)]
        normal: Option<PathBuf>,
        /// Grayscale height map.
        #[serde(default)]
        height: Option<PathBuf>,
        /// Metres at full white.
        #[serde(default = "default_height_scale")]
        height_scale: f32,
    },
    /// Procedural Gerstner waves, sampled at `resolution` and evaluated at the frame time.
    Gerstner {
        /// Field resolution (texels per axis).
        #[serde(default = "default_wave_resolution")]
        resolution: UVec2,
        /// Wave layers and speed.
        #[serde(default)]
        waves: GerstnerParams,
    },
}

fn default_height_scale() -> f32 {
    1.0
}

fn default_wave_resolution() -> UVec2 {
    UVec2::new(256, 256)
}

/// One receiver plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiverDef {
    /// Display name; also the output file stem.
    pub name: String,
    /// World position of the plane centre.
    #[serde(default)]
    pub position: Vec3,
    /// Euler rotation in degrees (yaw Y, pitch X, roll Z).
    #[serde(default)]
    pub rotation_deg: Vec3,
    /// Extent (width, height) in metres.
    #[serde(default = "default_receiver_size")]
    pub size: Vec2,
    /// Texture resolution.
    #[serde(default = "default_receiver_resolution")]
    pub resolution: UVec2,
    /// Plane membership tolerance in metres.
    #[serde(default = "default_tolerance")]
    pub distance_tolerance: f32,
    /// Accept light and pixels on both faces.
    #[serde(default)]
    pub two_sided: bool,
    /// Inactive receivers are built but neither allocated nor registered.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_receiver_size() -> Vec2 {
    Vec2::new(6.0, 3.0)
}

fn default_receiver_resolution() -> UVec2 {
    UVec2::new(1024, 512)
}

fn default_tolerance() -> f32 {
    0.02
}

fn default_active() -> bool {
    true
}

/// Pinhole camera used to preview the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraDef {
    /// Eye position.
    pub position: Vec3,
    /// Look-at point.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov_y_deg: f32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA8 background.
    #[serde(default = "default_background")]
    pub background: [u8; 4],
    /// Linear albedo of receiver surfaces.
    #[serde(default = "default_surface")]
    pub surface: Rgb,
}

fn default_fov() -> f32 {
    50.0
}

fn default_background() -> [u8; 4] {
    [0, 0, 0, 255]
}

fn default_surface() -> Rgb {
    Rgb::new(0.5, 0.5, 0.5)
}
