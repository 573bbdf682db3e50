//! Screen-space composition of receiver caustics onto the rendered frame.

use crate::foundation::core::{Mat4, Rgb, Vec2, Vec3, Vec4};
use crate::receiver::registry::FrameSnapshot;
use crate::render::frame::{FrameRGBA, FrameTargets, WorldSource};
use crate::render::surface_pool::SurfacePool;
use crate::render::texture::IntensityTexture;
use crate::render::uniforms::{CompositeBatch, CompositeUniforms, TextureSlot};
use rayon::prelude::*;

pub use crate::render::uniforms::MAX_RECEIVERS;

/// How a caustics sample is combined with the frame colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// `c + v * chroma(tint) * 255`
    #[default]
    Additive,
    /// `c * (1 + v * chroma(tint))`
    Multiply,
}

/// Static settings of a [`CompositeStage`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositeSettings {
    /// Blend mode.
    pub blend: BlendMode,
    /// Receivers bound per frame, clamped to `1..=MAX_RECEIVERS`.
    pub max_receivers: usize,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            blend: BlendMode::Additive,
            max_receivers: MAX_RECEIVERS,
        }
    }
}

impl CompositeSettings {
    /// Effective receiver limit.
    pub fn receiver_limit(&self) -> usize {
        self.max_receivers.clamp(1, MAX_RECEIVERS)
    }
}

/// What one composite pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeReport {
    /// Receivers bound to slots this frame.
    pub receivers_bound: usize,
    /// Pixels that fell on a bound receiver.
    pub pixels_matched: u64,
}

/// Per-frame composition of up to [`MAX_RECEIVERS`] receivers onto the colour target.
#[derive(Debug)]
pub struct CompositeStage {
    settings: CompositeSettings,
    black: IntensityTexture,
}

impl Default for CompositeStage {
    fn default() -> Self {
        Self::new(CompositeSettings::default())
    }
}

impl CompositeStage {
    /// Build the stage.
    pub fn new(settings: CompositeSettings) -> Self {
        Self {
            settings,
            black: IntensityTexture::black(),
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &CompositeSettings {
        &self.settings
    }

    /// Switch the blend mode.
    pub fn set_blend(&mut self, blend: BlendMode) {
        self.settings.blend = blend;
    }

    /// Uniforms and texture bindings for `snapshot`. Receivers past the limit are ignored;
    /// receivers without a texture bind the black texture.
    pub fn build_batch(&self, snapshot: &FrameSnapshot) -> CompositeBatch {
        let mut uniforms = CompositeUniforms::default();
        let mut slots = [TextureSlot::Black; MAX_RECEIVERS];
        let count = snapshot.receivers.len().min(self.settings.receiver_limit());

        for (i, receiver) in snapshot.receivers.iter().take(count).enumerate() {
            let desc = receiver.desc();
            uniforms.world_to_plane[i] = desc.world_to_plane().to_cols_array();
            uniforms.plane_info[i] = [
                desc.size_meters.x,
                desc.size_meters.y,
                desc.distance_tolerance,
                if desc.two_sided { 1.0 } else { 0.0 },
            ];
            if receiver.has_texture() {
                slots[i] = TextureSlot::Receiver(i);
            }
        }

        let tint = snapshot.lighting.tint;
        uniforms.tint_intensity = [tint.r, tint.g, tint.b, snapshot.lighting.intensity];
        uniforms.receiver_count = count as u32;
        uniforms.multiply_blend = match self.settings.blend {
            BlendMode::Multiply => 1.0,
            BlendMode::Additive => 0.0,
        };
        CompositeBatch { uniforms, slots }
    }

    /// Blend receiver caustics onto `targets.color`.
    ///
    /// A missing colour or world target, mismatched sizes, a straight-alpha frame or an empty
    /// registry leave the frame untouched and allocate nothing.
    #[tracing::instrument(skip_all, fields(receivers = snapshot.receivers.len()))]
    pub fn execute(
        &self,
        snapshot: &FrameSnapshot,
        targets: &mut FrameTargets<'_>,
        pool: &mut SurfacePool,
    ) -> CompositeReport {
        let (Some(color), Some(world)) = (targets.color.as_deref_mut(), targets.world) else {
            tracing::debug!("colour or world target unavailable");
            return CompositeReport::default();
        };
        if !color.premultiplied || !color.is_consistent() {
            tracing::debug!("colour target is not consistent premultiplied RGBA8");
            return CompositeReport::default();
        }
        if world.size() != (color.width, color.height) {
            tracing::debug!(color = ?(color.width, color.height), world = ?world.size(), "target size mismatch");
            return CompositeReport::default();
        }
        if snapshot.is_idle() {
            return CompositeReport::default();
        }

        let batch = self.build_batch(snapshot);
        let count = batch.count();
        let guards: Vec<_> = snapshot.receivers[..count]
            .iter()
            .map(|r| r.texture())
            .collect();
        let textures: [&IntensityTexture; MAX_RECEIVERS] =
            std::array::from_fn(|i| match batch.slots[i] {
                TextureSlot::Receiver(j) => guards
                    .get(j)
                    .and_then(|g| g.as_ref())
                    .unwrap_or(&self.black),
                TextureSlot::Black => &self.black,
            });
        let planes: Vec<PlaneSlot<'_>> = (0..count)
            .map(|i| PlaneSlot {
                world_to_plane: batch.uniforms.world_to_plane(i),
                info: batch.uniforms.plane_info(i),
                texture: textures[i],
            })
            .collect();
        let t = batch.uniforms.tint_intensity;
        let chroma = Rgb::new(t[0], t[1], t[2]).chroma();
        let blend = self.settings.blend;

        let matched = blend_frame(color, world, &planes, chroma, blend, pool);
        tracing::debug!(receivers = count, matched, "caustics composited");
        CompositeReport {
            receivers_bound: count,
            pixels_matched: matched,
        }
    }
}

struct PlaneSlot<'a> {
    world_to_plane: Mat4,
    info: Vec4,
    texture: &'a IntensityTexture,
}

impl PlaneSlot<'_> {
    /// Caustics value at a world position, or `None` when the point is not on this plane.
    fn sample(&self, p: Vec3) -> Option<f32> {
        let local = self.world_to_plane.transform_point3(p);
        let size = Vec2::new(self.info.x, self.info.y);
        let (tolerance, two_sided) = (self.info.z, self.info.w > 0.5);
        let inside = local.x.abs() <= size.x * 0.5 && local.y.abs() <= size.y * 0.5;
        if !inside || local.z.abs() > tolerance || (!two_sided && local.z < 0.0) {
            return None;
        }
        let uv = local.truncate() / size + Vec2::splat(0.5);
        Some(self.texture.sample_bilinear(uv))
    }
}

/// Copy-then-blend over every pixel. Returns the number of matched pixels.
fn blend_frame(
    color: &mut FrameRGBA,
    world: WorldSource<'_>,
    planes: &[PlaneSlot<'_>],
    chroma: Vec3,
    blend: BlendMode,
    pool: &mut SurfacePool,
) -> u64 {
    let mut scratch = pool.scratch(color.width, color.height);
    scratch.copy_from_slice(&color.data);

    color
        .data
        .par_chunks_exact_mut(4)
        .zip(scratch.par_chunks_exact(4))
        .enumerate()
        .map(|(i, (dst, src))| {
            dst.copy_from_slice(src);
            let Some(p) = world.world_position(i) else {
                return 0u64;
            };
            let Some(v) = planes.iter().find_map(|plane| plane.sample(p)) else {
                return 0;
            };
            blend_pixel(dst, v, chroma, blend);
            1
        })
        .sum()
}

/// Blend one premultiplied pixel in place. Light is scaled by coverage so `c <= a` holds.
pub(crate) fn blend_pixel(px: &mut [u8], v: f32, chroma: Vec3, blend: BlendMode) {
    let a = f32::from(px[3]);
    for (c, k) in px[..3].iter_mut().zip(chroma.to_array()) {
        let light = v * k;
        let out = match blend {
            BlendMode::Additive => f32::from(*c) + light * a,
            BlendMode::Multiply => f32::from(*c) * (1.0 + light),
        };
        *c = out.round().clamp(0.0, a) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
