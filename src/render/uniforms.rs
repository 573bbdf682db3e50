//! Per-frame parameter blocks.
//!
//! These are the bit-exact images of the values a GPU backend would upload. The CPU stages decode
//! their inputs from the same blocks, so the wire format and the executed math cannot drift apart.
//! Field docs name the shader property each field maps to.

use crate::foundation::core::{Mat4, UVec2, Vec2, Vec3, Vec4};
use crate::foundation::math::TEXEL_EPSILON;
use crate::receiver::plane::ReceiverDesc;
use crate::receiver::registry::LightingParams;
use crate::water::provider::WaterView;
use bytemuck::{Pod, Zeroable};

/// Number of receivers the composite stage can bind in one frame.
pub const MAX_RECEIVERS: usize = 4;

/// Water and lighting values shared by every receiver in a generation pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct GenUniforms {
    /// `_WaterToWorld`
    pub water_to_world: [f32; 16],
    /// `_WorldToWater`
    pub world_to_water: [f32; 16],
    /// `_WaterSize`: (x, y, 1/max(1e-4, x), 1/max(1e-4, y))
    pub water_size: [f32; 4],
    /// `_WaterGridParams`: (gx, gy, 1/max(1, gx), 1/max(1, gy))
    pub water_grid_params: [f32; 4],
    /// `_SunDir`: (x, y, z, 0), normalised travel direction
    pub sun_dir: [f32; 4],
    /// `_Tint`: (r, g, b, 1)
    pub tint: [f32; 4],
    /// `_WaterNormalTexelSize`
    pub water_normal_texel_size: f32,
    /// `_Intensity`
    pub intensity: f32,
    /// `_F0`
    pub f0: f32,
    /// `_JacobianGain`
    pub jacobian_gain: f32,
}

impl GenUniforms {
    pub(crate) fn new(water: &WaterView<'_>, grid: UVec2, light: &LightingParams) -> Self {
        let size = water.size;
        let dir = light.light_direction();
        Self {
            water_to_world: water.water_to_world.to_cols_array(),
            world_to_water: water.world_to_water.to_cols_array(),
            water_size: [
                size.x,
                size.y,
                1.0 / size.x.max(TEXEL_EPSILON),
                1.0 / size.y.max(TEXEL_EPSILON),
            ],
            water_grid_params: [
                grid.x as f32,
                grid.y as f32,
                1.0 / grid.x.max(1) as f32,
                1.0 / grid.y.max(1) as f32,
            ],
            sun_dir: [dir.x, dir.y, dir.z, 0.0],
            tint: [light.tint.r, light.tint.g, light.tint.b, 1.0],
            water_normal_texel_size: water.normal_texel_size,
            intensity: light.intensity,
            f0: light.f0,
            jacobian_gain: light.jacobian_gain,
        }
    }

    /// Grid dimensions.
    pub fn grid(&self) -> UVec2 {
        UVec2::new(
            self.water_grid_params[0] as u32,
            self.water_grid_params[1] as u32,
        )
    }

    /// Normalised incident light direction.
    pub fn sun_dir(&self) -> Vec3 {
        Vec4::from_array(self.sun_dir).truncate()
    }

    /// Water extent in metres.
    pub fn water_size(&self) -> Vec2 {
        Vec2::new(self.water_size[0], self.water_size[1])
    }

    /// Raw bytes as uploaded.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Per-receiver values of a generation pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct ReceiverUniforms {
    /// `_PlaneToWorld`
    pub plane_to_world: [f32; 16],
    /// `_WorldToPlane`
    pub world_to_plane: [f32; 16],
    /// `_PlaneSize`: (w, h, 1/max(1e-4, w), 1/max(1e-4, h))
    pub plane_size: [f32; 4],
    /// `_ReceiverResolution`: (w, h, 1/max(1, w), 1/max(1, h)) of the bound texture
    pub receiver_resolution: [f32; 4],
    /// `_PlaneDistanceTolerance`
    pub plane_distance_tolerance: f32,
    /// `_PlaneTwoSided`: 1.0 or 0.0
    pub plane_two_sided: f32,
    /// Padding to a 16-byte multiple.
    pub _padding: [f32; 2],
}

impl ReceiverUniforms {
    pub(crate) fn new(desc: &ReceiverDesc, texture_size: UVec2) -> Self {
        let size = desc.size_meters;
        Self {
            plane_to_world: desc.plane_to_world().to_cols_array(),
            world_to_plane: desc.world_to_plane().to_cols_array(),
            plane_size: [
                size.x,
                size.y,
                1.0 / size.x.max(TEXEL_EPSILON),
                1.0 / size.y.max(TEXEL_EPSILON),
            ],
            receiver_resolution: [
                texture_size.x as f32,
                texture_size.y as f32,
                1.0 / texture_size.x.max(1) as f32,
                1.0 / texture_size.y.max(1) as f32,
            ],
            plane_distance_tolerance: desc.distance_tolerance,
            plane_two_sided: if desc.two_sided { 1.0 } else { 0.0 },
            _padding: [0.0; 2],
        }
    }

    /// Raw bytes as uploaded.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Composite values for up to [`MAX_RECEIVERS`] receivers. Unused slots hold identity / zero.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct CompositeUniforms {
    /// `_RC_WorldToPlane[4]`
    pub world_to_plane: [[f32; 16]; MAX_RECEIVERS],
    /// `_RC_PlaneInfo[4]`: (width, height, distance tolerance, two-sided flag)
    pub plane_info: [[f32; 4]; MAX_RECEIVERS],
    /// `_RC_TintIntensity`: (r, g, b, intensity)
    pub tint_intensity: [f32; 4],
    /// `_RC_ReceiverCount`
    pub receiver_count: u32,
    /// `_RC_MultiplyBlend`: 1.0 for multiplicative composition, 0.0 for additive
    pub multiply_blend: f32,
    /// Padding to a 16-byte multiple.
    pub _padding: [u32; 2],
}

impl Default for CompositeUniforms {
    fn default() -> Self {
        Self {
            world_to_plane: [Mat4::IDENTITY.to_cols_array(); MAX_RECEIVERS],
            plane_info: [[0.0; 4]; MAX_RECEIVERS],
            tint_intensity: [1.0, 1.0, 1.0, 1.0],
            receiver_count: 0,
            multiply_blend: 0.0,
            _padding: [0; 2],
        }
    }
}

impl CompositeUniforms {
    /// World-to-plane transform of slot `i`.
    pub fn world_to_plane(&self, i: usize) -> Mat4 {
        Mat4::from_cols_array(&self.world_to_plane[i])
    }

    /// Plane info of slot `i`.
    pub fn plane_info(&self, i: usize) -> Vec4 {
        Vec4::from_array(self.plane_info[i])
    }

    /// Raw bytes as uploaded.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Texture bound to a composite slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    /// The texture of the receiver at this index in the frame snapshot.
    Receiver(usize),
    /// The canonical black texture.
    Black,
}

/// Fixed-size composite batch: uniforms plus exactly [`MAX_RECEIVERS`] texture bindings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeBatch {
    /// Uniform block.
    pub uniforms: CompositeUniforms,
    /// Texture bindings; never unbound.
    pub slots: [TextureSlot; MAX_RECEIVERS],
}

impl CompositeBatch {
    /// Number of live slots.
    pub fn count(&self) -> usize {
        (self.uniforms.receiver_count as usize).min(MAX_RECEIVERS)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/uniforms.rs"]
mod tests;
