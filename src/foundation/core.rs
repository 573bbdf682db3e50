use crate::foundation::error::{CausticsError, CausticsResult};
use crate::foundation::math::LUMA_EPSILON;

pub use glam::{EulerRot, Mat3, Mat4, Quat, UVec2, Vec2, Vec3, Vec4};

/// Linear RGB colour (not gamma encoded).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Rgb {
    /// Opaque white, the default caustics tint.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    /// Black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// Build a colour from linear channels.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Rec.709 luminance. This is the scalar weight the single-channel caustics texture carries.
    pub fn luma(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    /// Colour normalised to unit luminance; white maps to (1,1,1).
    ///
    /// Black (or any colour with non-positive luminance) maps to black.
    pub fn chroma(self) -> Vec3 {
        let l = self.luma();
        if !l.is_finite() || l <= LUMA_EPSILON {
            return Vec3::ZERO;
        }
        self.to_vec3() / l
    }

    /// Channels as a vector.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Clamp every channel into `[lo, hi]`; non-finite channels become `lo`.
    pub fn clamped(self, lo: f32, hi: f32) -> Self {
        let c = |v: f32| if v.is_finite() { v.clamp(lo, hi) } else { lo };
        Self::new(c(self.r), c(self.g), c(self.b))
    }
}

/// Rigid placement (position + orientation) of a receiver plane or water patch.
///
/// Plane-local space: x spans the width, y spans the height, +Z is the forward normal.
/// The matrices are derived on demand and never stored.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    /// World-space origin (plane centre).
    pub position: Vec3,
    /// World-space orientation.
    pub rotation: Quat,
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Placement {
    /// Placement at the world origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Build a placement, normalising the rotation.
    pub fn new(position: Vec3, rotation: Quat) -> CausticsResult<Self> {
        if !position.is_finite() {
            return Err(CausticsError::validation("placement position must be finite"));
        }
        if !rotation.is_finite() || rotation.length_squared() <= f32::EPSILON {
            return Err(CausticsError::validation(
                "placement rotation must be a finite, non-zero quaternion",
            ));
        }
        Ok(Self {
            position,
            rotation: rotation.normalize(),
        })
    }

    /// Build a placement from Euler angles in degrees (yaw about Y, then pitch X, then roll Z).
    pub fn from_euler_degrees(position: Vec3, euler_deg: Vec3) -> CausticsResult<Self> {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            euler_deg.y.to_radians(),
            euler_deg.x.to_radians(),
            euler_deg.z.to_radians(),
        );
        Self::new(position, rotation)
    }

    /// Plane-local to world transform (unit scale).
    pub fn plane_to_world(self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// World to plane-local transform; the exact inverse of [`Placement::plane_to_world`].
    pub fn world_to_plane(self) -> Mat4 {
        let inv = self.rotation.conjugate();
        Mat4::from_rotation_translation(inv, -(inv * self.position))
    }

    /// World-space forward normal (plane-local +Z).
    pub fn forward(self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
