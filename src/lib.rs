//! Reflective water caustics for planar receivers.
//!
//! Each frame runs two stages against a shared [`ReceiverRegistry`]:
//!
//! - [`GenerationStage`] traces light off a water surface (provided through
//!   [`WaterSurfaceProvider`]) onto every registered [`ReceiverPlane`] and accumulates an
//!   inverse-Jacobian irradiance estimate into the plane's [`IntensityTexture`].
//! - [`CompositeStage`] finds, per output pixel, the first receiver the pixel lies on and blends
//!   that receiver's texture into the premultiplied [`FrameRGBA`].
//!
//! [`CausticsPipeline`] runs both in order; [`Scene`] loads a JSON description of lighting, water,
//! receivers and a preview camera.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod export;
mod foundation;
mod receiver;
mod render;
mod scene;
mod water;

pub use crate::foundation::core::{EulerRot, Mat3, Mat4, Placement, Quat, Rgb, UVec2, Vec2, Vec3, Vec4};
pub use crate::foundation::error::{CausticsError, CausticsResult};
pub use crate::foundation::math::{
    JACOBIAN_EPSILON, MAX_GRID_DIMENSION, TEXEL_EPSILON, fresnel_schlick, grid_dimension, reflect,
    refract,
};

pub use crate::water::field::{Field2D, FieldValue, HeightField, NormalField};
pub use crate::water::provider::{
    DEFAULT_NORMAL_TEXEL_SIZE, DEFAULT_WATER_SIZE, StaticWater, WaterSurfaceProvider,
};
pub use crate::water::waves::{GerstnerParams, WaveLayer, synthesize, wave_height, wave_normal};

pub use crate::receiver::plane::{ReceiverDesc, ReceiverPlane};
pub use crate::receiver::registry::{
    FrameSnapshot, LightingParams, ReceiverRegistry, SunLight, resolve_light_direction,
};

pub use crate::render::composite::{
    BlendMode, CompositeReport, CompositeSettings, CompositeStage, MAX_RECEIVERS,
};
pub use crate::render::debug::{
    DebugTextures, DebugView, FRESNEL_TEXTURE, Inspector, JACOBIAN_TEXTURE, PLANE_DISTANCE_TEXTURE,
    PreviewUnavailable, SHADOW_MASK_TEXTURE, TexturePreview,
};
pub use crate::render::frame::{DepthBuffer, FrameRGBA, FrameTargets, PositionBuffer, WorldSource};
pub use crate::render::generate::{
    GenerationMode, GenerationReport, GenerationSettings, GenerationStage, TransportMode,
};
pub use crate::render::pipeline::{CausticsPipeline, FrameStats, PipelineOpts};
pub use crate::render::surface_pool::{
    ScratchSurface, SurfacePool, SurfacePoolOpts, SurfacePoolStats,
};
pub use crate::render::texture::IntensityTexture;
pub use crate::render::uniforms::{
    CompositeBatch, CompositeUniforms, GenUniforms, ReceiverUniforms, TextureSlot,
};

pub use crate::export::image_export::{
    intensity_to_gray16, unpremultiply, write_frame_png, write_intensity_png,
};
pub use crate::scene::config::{BuiltScene, Scene};
pub use crate::scene::model::{CameraDef, ReceiverDef, SceneDef, SurfaceDef, WaterDef};
pub use crate::scene::preview::{Camera, PreviewFrame};
