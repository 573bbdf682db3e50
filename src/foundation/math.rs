use crate::foundation::core::{UVec2, Vec2, Vec3};

/// Floor applied to texel and extent sizes before they are used as divisors.
pub const TEXEL_EPSILON: f32 = 1e-4;

/// Floor applied to `|J|` before the inverse-Jacobian intensity term.
pub const JACOBIAN_EPSILON: f32 = 1e-3;

/// Squared length below which a light direction is treated as degenerate.
pub const DIRECTION_EPSILON_SQ: f32 = 1e-6;

/// Smallest `|dot(ray, plane_normal)|` for which a ray-plane intersection is computed.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Slack added to the plane distance tolerance for hits that lie on the plane by construction.
pub const PLANE_EPSILON: f32 = 1e-4;

/// Luminance below which a tint is treated as black.
pub const LUMA_EPSILON: f32 = 1e-6;

/// Upper bound on water grid samples per axis.
pub const MAX_GRID_DIMENSION: u32 = 8192;

/// Number of water grid samples per axis.
///
/// Each cell approximates one texel of the water normal field:
/// `clamp(round(size / max(eps, texel)), 1, MAX_GRID_DIMENSION)` independently per axis.
/// Returns `None` for zero, negative or non-finite extents (the stage is a no-op).
pub fn grid_dimension(size_meters: Vec2, normal_texel_size: f32) -> Option<UVec2> {
    if !size_meters.is_finite() || size_meters.x <= 0.0 || size_meters.y <= 0.0 {
        return None;
    }
    let texel = floor_texel(normal_texel_size);
    let axis = |extent: f32| -> u32 {
        let n = (extent / texel).round();
        if !n.is_finite() {
            return MAX_GRID_DIMENSION;
        }
        (n.max(1.0) as u64).min(u64::from(MAX_GRID_DIMENSION)) as u32
    };
    Some(UVec2::new(axis(size_meters.x), axis(size_meters.y)))
}

/// `max(TEXEL_EPSILON, texel)`, also mapping non-finite input to the epsilon.
pub fn floor_texel(texel: f32) -> f32 {
    if texel.is_finite() {
        texel.max(TEXEL_EPSILON)
    } else {
        TEXEL_EPSILON
    }
}

/// Schlick's approximation of the Fresnel reflectance.
pub fn fresnel_schlick(f0: f32, cos_theta: f32) -> f32 {
    let f0 = f0.clamp(0.0, 1.0);
    let m = (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5);
    f0 + (1.0 - f0) * m
}

/// Mirror `d` about the unit normal `n`.
pub fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    d - 2.0 * d.dot(n) * n
}

/// Refract the unit direction `d` through the unit normal `n` (facing against `d`) with
/// relative index `eta = n_from / n_to`. `None` on total internal reflection.
pub fn refract(d: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = -d.dot(n);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some(eta * d + (eta * cos_i - k.sqrt()) * n)
}

/// Signed area of the parallelogram spanned by `a` and `b`.
pub fn cross2(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
