//! Procedural Gerstner wave fields.
//!
//! Produces height and normal fields for a water patch so scenes and tests can drive the caustics
//! stages without an external simulation. The result is consumed through
//! [`crate::WaterSurfaceProvider`] like any other water source.

use crate::foundation::core::{Vec2, Vec3};
use crate::foundation::error::{CausticsError, CausticsResult};
use crate::water::field::{HeightField, NormalField};
use rayon::prelude::*;
use std::f32::consts::PI;

/// Gravity constant for the deep-water dispersion relation (m/s²).
pub const GRAVITY: f32 = 9.8;

/// Parameters for a single wave layer.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WaveLayer {
    /// Travel direction in the water plane (x, z). Normalised on use.
    pub direction: Vec2,
    /// Peak amplitude in metres.
    pub amplitude: f32,
    /// Wavelength in metres.
    pub wavelength: f32,
    /// Steepness factor (0 gives sine waves, 1 gives sharp crests).
    #[serde(default = "default_steepness")]
    pub steepness: f32,
}

fn default_steepness() -> f32 {
    0.5
}

impl WaveLayer {
    /// Build a layer.
    pub const fn new(dir_x: f32, dir_z: f32, amplitude: f32, wavelength: f32) -> Self {
        Self {
            direction: Vec2::new(dir_x, dir_z),
            amplitude,
            wavelength,
            steepness: 0.5,
        }
    }

    fn phase(&self, pos: Vec2, time: f32) -> Option<(Vec2, f32, f32)> {
        let d = self.direction.try_normalize()?;
        if !(self.wavelength.is_finite() && self.wavelength > 0.0) {
            return None;
        }
        let k = 2.0 * PI / self.wavelength;
        let c = (GRAVITY / k).sqrt();
        Some((d, k, k * (d.dot(pos) - c * time)))
    }
}

/// A small default swell: one long wave plus two shorter cross waves.
pub const DEFAULT_WAVE_LAYERS: [WaveLayer; 3] = [
    WaveLayer::new(1.0, 0.0, 0.04, 2.0),
    WaveLayer::new(0.7, 0.7, 0.02, 0.9),
    WaveLayer::new(-0.3, 0.9, 0.01, 0.45),
];

/// Wave synthesis settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GerstnerParams {
    /// Wave layers to sum.
    #[serde(default = "default_layers")]
    pub layers: Vec<WaveLayer>,
    /// Animation speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_layers() -> Vec<WaveLayer> {
    DEFAULT_WAVE_LAYERS.to_vec()
}

fn default_speed() -> f32 {
    1.0
}

impl Default for GerstnerParams {
    fn default() -> Self {
        Self {
            layers: default_layers(),
            speed: default_speed(),
        }
    }
}

/// Height (metres) at a water-local position.
pub fn wave_height(pos: Vec2, params: &GerstnerParams, time: f32) -> f32 {
    params
        .layers
        .iter()
        .filter_map(|l| l.phase(pos, time * params.speed).map(|(_, _, f)| l.amplitude * f.sin()))
        .sum()
}

/// Unit surface normal at a water-local position.
pub fn wave_normal(pos: Vec2, params: &GerstnerParams, time: f32) -> Vec3 {
    let mut n = Vec3::Y;
    for l in &params.layers {
        if let Some((d, k, f)) = l.phase(pos, time * params.speed) {
            let a = l.amplitude * k * f.cos();
            n.x -= d.x * a;
            n.z -= d.y * a;
            n.y -= l.steepness * l.amplitude * k * f.sin();
        }
    }
    n.try_normalize().unwrap_or(Vec3::Y)
}

/// Sample height and normal fields of `resolution` texels over a patch of `size_meters`.
pub fn synthesize(
    size_meters: Vec2,
    resolution: (u32, u32),
    params: &GerstnerParams,
    time: f32,
) -> CausticsResult<(HeightField, NormalField)> {
    let (w, h) = resolution;
    if w == 0 || h == 0 {
        return Err(CausticsError::validation("wave resolution must be > 0"));
    }
    if !size_meters.is_finite() || size_meters.x <= 0.0 || size_meters.y <= 0.0 {
        return Err(CausticsError::validation("wave patch size must be > 0"));
    }

    let samples: Vec<(f32, Vec3)> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..w).map(move |x| {
                let uv = Vec2::new((x as f32 + 0.5) / w as f32, (y as f32 + 0.5) / h as f32);
                let pos = (uv - Vec2::splat(0.5)) * size_meters;
                (wave_height(pos, params, time), wave_normal(pos, params, time))
            })
        })
        .collect();

    let (heights, normals): (Vec<f32>, Vec<Vec3>) = samples.into_iter().unzip();
    Ok((
        HeightField::from_vec(w, h, heights)?,
        NormalField::from_vec(w, h, normals)?,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/water/waves.rs"]
mod tests;
