//! Caustics generation: trace light off (or through) the water surface onto every receiver plane
//! and accumulate the inverse-Jacobian irradiance estimate into the receiver textures.

use crate::foundation::core::{Mat4, Rgb, UVec2, Vec2, Vec3};
use crate::foundation::error::{CausticsError, CausticsResult};
use crate::foundation::math::{
    JACOBIAN_EPSILON, PARALLEL_EPSILON, PLANE_EPSILON, cross2, fresnel_schlick, grid_dimension,
    reflect, refract,
};
use crate::receiver::plane::ReceiverPlane;
use crate::receiver::registry::FrameSnapshot;
use crate::render::debug::{
    DebugTextures, FRESNEL_TEXTURE, JACOBIAN_TEXTURE, PLANE_DISTANCE_TEXTURE,
};
use crate::render::texture::IntensityTexture;
use crate::render::uniforms::{GenUniforms, ReceiverUniforms};
use crate::water::provider::WaterView;
use rayon::prelude::*;

/// How light is carried from the water surface to the receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Mirror reflection weighted by the Fresnel reflectance.
    #[default]
    Reflect,
    /// Refraction into the water weighted by the Fresnel transmittance.
    Refract,
}

/// Evaluation strategy of the generation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Dense water grid; every sample splats into the texel it hits.
    #[default]
    PointGrid,
    /// One evaluation per receiver texel along the flat-water path; writes, never accumulates.
    FullPass,
}

/// Static settings of a [`GenerationStage`], validated once at construction.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Evaluation strategy.
    pub mode: GenerationMode,
    /// Reflection or refraction.
    pub transport: TransportMode,
    /// Index of refraction of the water, used by [`TransportMode::Refract`].
    pub ior: f32,
    /// Publish auxiliary textures for the first receiver.
    pub publish_debug: bool,
    /// Grid rows per parallel work band.
    pub band_rows: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            mode: GenerationMode::PointGrid,
            transport: TransportMode::Reflect,
            ior: 1.333,
            publish_debug: false,
            band_rows: 8,
        }
    }
}

impl GenerationSettings {
    /// Check the values the kernels rely on.
    pub fn validate(&self) -> CausticsResult<()> {
        if !self.ior.is_finite() || self.ior <= 0.0 {
            return Err(CausticsError::config(format!(
                "generation ior must be finite and > 0 (got {})",
                self.ior
            )));
        }
        if self.band_rows == 0 {
            return Err(CausticsError::config("generation band_rows must be > 0"));
        }
        Ok(())
    }
}

/// What one generation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Receivers whose texture was cleared and rendered.
    pub receivers_rendered: usize,
    /// Receivers skipped because they had no texture.
    pub receivers_skipped: usize,
    /// Kernel evaluations (grid samples or texels).
    pub samples: u64,
    /// Evaluations that wrote a non-rejected contribution.
    pub splats: u64,
}

/// Per-frame caustics generation.
///
/// Holds no per-frame state apart from the published debug textures; everything else is read
/// from the [`FrameSnapshot`] handed to [`GenerationStage::execute`].
#[derive(Debug)]
pub struct GenerationStage {
    settings: Option<GenerationSettings>,
    debug: DebugTextures,
}

impl Default for GenerationStage {
    fn default() -> Self {
        Self::new(GenerationSettings::default())
    }
}

impl GenerationStage {
    /// Build the stage. Invalid settings are reported once and leave the stage disabled.
    pub fn new(settings: GenerationSettings) -> Self {
        let settings = match settings.validate() {
            Ok(()) => Some(settings),
            Err(e) => {
                tracing::warn!(error = %e, "caustics generation disabled");
                None
            }
        };
        Self {
            settings,
            debug: DebugTextures::default(),
        }
    }

    /// Whether setup succeeded.
    pub fn is_enabled(&self) -> bool {
        self.settings.is_some()
    }

    /// Validated settings, when enabled.
    pub fn settings(&self) -> Option<&GenerationSettings> {
        self.settings.as_ref()
    }

    /// Auxiliary textures published by the last pass.
    pub fn debug_textures(&self) -> &DebugTextures {
        &self.debug
    }

    /// Run one generation pass over every receiver in `snapshot`.
    ///
    /// Without water or receivers, or with a degenerate water extent, textures are left untouched.
    #[tracing::instrument(skip_all, fields(receivers = snapshot.receivers.len()))]
    pub fn execute(&mut self, snapshot: &FrameSnapshot) -> GenerationReport {
        let Some(settings) = self.settings else {
            return GenerationReport::default();
        };
        if settings.publish_debug {
            self.debug.clear();
        }
        if snapshot.is_idle() {
            tracing::debug!("no receivers registered");
            return GenerationReport::default();
        }
        let Some(water) = snapshot.water.as_deref() else {
            tracing::debug!("no water provider bound");
            return GenerationReport::default();
        };
        let view = WaterView::new(water);
        let Some(grid) = grid_dimension(view.size, view.normal_texel_size) else {
            tracing::debug!(size = ?view.size, "degenerate water extent");
            return GenerationReport::default();
        };
        let uniforms = GenUniforms::new(&view, grid, &snapshot.lighting);

        let outcomes: Vec<Option<ReceiverOutcome>> = snapshot
            .receivers
            .par_iter()
            .enumerate()
            .map(|(i, r)| {
                render_receiver(r, &view, &uniforms, &settings, settings.publish_debug && i == 0)
            })
            .collect();

        let mut report = GenerationReport::default();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let Some(o) = outcome else {
                tracing::debug!(receiver = snapshot.receivers[i].name(), "receiver has no texture");
                report.receivers_skipped += 1;
                continue;
            };
            report.receivers_rendered += 1;
            report.samples += o.samples;
            report.splats += o.splats;
            if let Some(aux) = o.debug {
                aux.publish(&mut self.debug);
            }
        }
        tracing::debug!(?report, grid = ?grid, "caustics generated");
        report
    }
}

struct ReceiverOutcome {
    samples: u64,
    splats: u64,
    debug: Option<DebugAccum>,
}

fn render_receiver(
    receiver: &ReceiverPlane,
    water: &WaterView<'_>,
    uniforms: &GenUniforms,
    settings: &GenerationSettings,
    capture_debug: bool,
) -> Option<ReceiverOutcome> {
    let desc = receiver.desc();
    receiver.with_texture_mut(|texture| {
        texture.clear();
        let ru = ReceiverUniforms::new(&desc, texture.size());
        let kernel = Kernel::new(water, uniforms, &ru, settings);
        let mut debug = capture_debug.then(|| DebugAccum::new(texture.size()));
        let (samples, splats) = match settings.mode {
            GenerationMode::PointGrid => {
                kernel.splat_grid(texture, debug.as_mut(), settings.band_rows)
            }
            GenerationMode::FullPass => kernel.gather(texture, debug.as_mut()),
        };
        ReceiverOutcome {
            samples,
            splats,
            debug,
        }
    })
}

/// Light leaving the water surface.
#[derive(Clone, Copy)]
struct Ray {
    origin: Vec3,
    dir: Vec3,
    weight: f32,
}

/// Line-plane intersection in plane-local space.
#[derive(Clone, Copy)]
struct PlaneHit {
    t: f32,
    local: Vec3,
    back_face: bool,
}

/// A single accepted contribution.
#[derive(Clone, Copy)]
struct Splat {
    index: usize,
    value: f32,
    fresnel: f32,
    jacobian: f32,
    distance: f32,
}

/// Everything a sample needs, decoded from the uniform blocks.
struct Kernel<'a> {
    water: &'a WaterView<'a>,
    grid: UVec2,
    cell_uv: Vec2,
    cell_meters: Vec2,
    light: Vec3,
    f0: f32,
    transport: TransportMode,
    eta: f32,
    scale: f32,
    gain: f32,
    coverage: f32,
    plane_origin: Vec3,
    plane_normal: Vec3,
    world_to_plane: Mat4,
    plane_size: Vec2,
    inv_plane_size: Vec2,
    tolerance: f32,
    two_sided: bool,
    texture_size: UVec2,
    plane_to_world: Mat4,
    water_up: Vec3,
    water_origin: Vec3,
    inv_water_size: Vec2,
}

impl<'a> Kernel<'a> {
    fn new(
        water: &'a WaterView<'a>,
        shared: &GenUniforms,
        rec: &ReceiverUniforms,
        settings: &GenerationSettings,
    ) -> Self {
        let grid = shared.grid();
        let cell_uv = Vec2::new(shared.water_grid_params[2], shared.water_grid_params[3]);
        let water_size = shared.water_size();
        let cell_meters = water_size * cell_uv;
        let plane_size = Vec2::new(rec.plane_size[0], rec.plane_size[1]);
        let texel_meters = plane_size
            * Vec2::new(rec.receiver_resolution[2], rec.receiver_resolution[3]);
        let plane_to_world = Mat4::from_cols_array(&rec.plane_to_world);
        let water_to_world = Mat4::from_cols_array(&shared.water_to_world);
        let luma = Rgb::new(shared.tint[0], shared.tint[1], shared.tint[2]).luma();
        Self {
            water,
            grid,
            cell_uv,
            cell_meters,
            light: shared.sun_dir(),
            f0: shared.f0,
            transport: settings.transport,
            eta: 1.0 / settings.ior,
            scale: shared.intensity * luma,
            gain: shared.jacobian_gain,
            coverage: (cell_meters.x * cell_meters.y)
                / (texel_meters.x * texel_meters.y).max(f32::MIN_POSITIVE),
            plane_origin: plane_to_world.w_axis.truncate(),
            plane_normal: plane_to_world.transform_vector3(Vec3::Z).normalize_or_zero(),
            world_to_plane: Mat4::from_cols_array(&rec.world_to_plane),
            plane_size,
            inv_plane_size: Vec2::new(rec.plane_size[2], rec.plane_size[3]),
            tolerance: rec.plane_distance_tolerance,
            two_sided: rec.plane_two_sided > 0.5,
            texture_size: UVec2::new(
                rec.receiver_resolution[0] as u32,
                rec.receiver_resolution[1] as u32,
            ),
            plane_to_world,
            water_up: water_to_world
                .transform_vector3(Vec3::Y)
                .try_normalize()
                .unwrap_or(Vec3::Y),
            water_origin: water_to_world.w_axis.truncate(),
            inv_water_size: Vec2::new(shared.water_size[2], shared.water_size[3]),
        }
    }

    /// Light leaving the surface at water uv, or `None` when the light reaches it from below or
    /// is totally internally reflected.
    fn trace(&self, uv: Vec2) -> Option<Ray> {
        let s = self.water.surface_at(uv);
        let cos_i = -self.light.dot(s.normal);
        if cos_i <= 0.0 {
            return None;
        }
        let r = fresnel_schlick(self.f0, cos_i);
        let (dir, weight) = match self.transport {
            TransportMode::Reflect => (reflect(self.light, s.normal), r),
            TransportMode::Refract => (refract(self.light, s.normal, self.eta)?, 1.0 - r),
        };
        Some(Ray {
            origin: s.position,
            dir: dir.try_normalize()?,
            weight,
        })
    }

    /// Intersection of the ray's supporting line with the receiver plane.
    fn intersect(&self, ray: &Ray) -> Option<PlaneHit> {
        let denom = ray.dir.dot(self.plane_normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (self.plane_origin - ray.origin).dot(self.plane_normal) / denom;
        let world = ray.origin + ray.dir * t;
        Some(PlaneHit {
            t,
            local: self.world_to_plane.transform_point3(world),
            back_face: denom > 0.0,
        })
    }

    /// Plane uv of a local hit, or `None` outside the rectangle.
    fn plane_uv(&self, local: Vec3) -> Option<Vec2> {
        let uv = local.truncate() * self.inv_plane_size + Vec2::splat(0.5);
        let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);
        inside.then_some(uv)
    }

    /// Full evaluation at water uv: hit, acceptance tests and Jacobian-weighted contribution.
    /// The returned value excludes the coverage factor.
    fn evaluate(&self, uv: Vec2) -> Option<(Vec2, Splat)> {
        let ray = self.trace(uv)?;
        let hit = self.intersect(&ray)?;
        if hit.t <= 0.0 || (hit.back_face && !self.two_sided) {
            return None;
        }
        if hit.local.z.abs() > self.tolerance + PLANE_EPSILON {
            return None;
        }
        let plane_uv = self.plane_uv(hit.local)?;

        let du = self.intersect(&self.trace(uv + Vec2::new(self.cell_uv.x, 0.0))?)?;
        let dv = self.intersect(&self.trace(uv + Vec2::new(0.0, self.cell_uv.y))?)?;
        let h = hit.local.truncate();
        let det = cross2(du.local.truncate() - h, dv.local.truncate() - h)
            / (self.cell_meters.x * self.cell_meters.y);
        if !det.is_finite() {
            return None;
        }
        let jacobian = det.abs();
        let base = ray.weight * self.scale / jacobian.max(JACOBIAN_EPSILON);
        Some((
            plane_uv,
            Splat {
                index: 0,
                value: base,
                fresnel: ray.weight,
                jacobian,
                distance: hit.local.z.abs(),
            },
        ))
    }

    fn grid_uv(&self, ix: u32, iy: u32) -> Vec2 {
        Vec2::new(ix as f32 + 0.5, iy as f32 + 0.5) * self.cell_uv
    }

    /// Dense-grid splatting with deterministic band reduction.
    fn splat_grid(
        &self,
        texture: &mut IntensityTexture,
        mut debug: Option<&mut DebugAccum>,
        band_rows: u32,
    ) -> (u64, u64) {
        let bands = self.grid.y.div_ceil(band_rows);
        let band_ids: Vec<u32> = (0..bands).collect();
        let mut splats = 0u64;

        for group in band_ids.chunks(BANDS_PER_REDUCTION) {
            let target: &IntensityTexture = texture;
            let results: Vec<Vec<Splat>> = group
                .par_iter()
                .map(|&b| {
                    let y0 = b * band_rows;
                    let y1 = (y0 + band_rows).min(self.grid.y);
                    let mut out = Vec::new();
                    for iy in y0..y1 {
                        for ix in 0..self.grid.x {
                            if let Some(s) = self.splat(target, ix, iy) {
                                out.push(s);
                            }
                        }
                    }
                    out
                })
                .collect();

            for s in results.iter().flatten() {
                texture.accumulate(s.index, s.value);
                if let Some(d) = debug.as_deref_mut() {
                    d.add(s);
                }
                splats += 1;
            }
        }
        (u64::from(self.grid.x) * u64::from(self.grid.y), splats)
    }

    fn splat(&self, texture: &IntensityTexture, ix: u32, iy: u32) -> Option<Splat> {
        let (plane_uv, mut s) = self.evaluate(self.grid_uv(ix, iy))?;
        s.value = s.value * self.coverage * self.gain;
        s.index = texture.index_at(plane_uv);
        Some(s)
    }

    /// Per-texel gather along the flat-water path. Each texel is written exactly once.
    fn gather(
        &self,
        texture: &mut IntensityTexture,
        mut debug: Option<&mut DebugAccum>,
    ) -> (u64, u64) {
        let size = self.texture_size;
        let flat_dir = match self.transport {
            TransportMode::Reflect => Some(reflect(self.light, self.water_up)),
            TransportMode::Refract => refract(self.light, self.water_up, self.eta),
        };
        let len = texture.len();
        let results: Vec<Option<Splat>> = (0..len)
            .into_par_iter()
            .map(|i| {
                let dir = flat_dir?;
                let x = (i % size.x as usize) as f32;
                let y = (i / size.x as usize) as f32;
                let plane_uv = Vec2::new(x + 0.5, y + 0.5) / size.as_vec2();
                let local = ((plane_uv - Vec2::splat(0.5)) * self.plane_size).extend(0.0);
                let world = self.plane_to_world.transform_point3(local);

                let denom = dir.dot(self.water_up);
                if denom.abs() < PARALLEL_EPSILON {
                    return None;
                }
                let s = (world - self.water_origin).dot(self.water_up) / denom;
                let on_water = self.water.world_to_water.transform_point3(world - dir * s);
                let uv = Vec2::new(on_water.x, on_water.z) * self.inv_water_size + Vec2::splat(0.5);
                if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) {
                    return None;
                }
                let (_, mut splat) = self.evaluate(uv)?;
                splat.value *= self.gain;
                splat.index = i;
                Some(splat)
            })
            .collect();

        let mut written = 0u64;
        for s in results.iter().flatten() {
            let (x, y) = (s.index % size.x as usize, s.index / size.x as usize);
            if let Some(t) = texture.texel_mut(x as u32, y as u32) {
                *t = s.value;
            }
            if let Some(d) = debug.as_deref_mut() {
                d.add(s);
            }
            written += 1;
        }
        (len as u64, written)
    }
}

/// Band groups reduced per step; bounds the splat memory held at once.
const BANDS_PER_REDUCTION: usize = 32;

/// Per-texel sums of the auxiliary quantities for the first receiver.
struct DebugAccum {
    size: UVec2,
    fresnel: Vec<f32>,
    jacobian: Vec<f32>,
    distance: Vec<f32>,
    count: Vec<u32>,
}

impl DebugAccum {
    fn new(size: UVec2) -> Self {
        let n = size.x as usize * size.y as usize;
        Self {
            size,
            fresnel: vec![0.0; n],
            jacobian: vec![0.0; n],
            distance: vec![0.0; n],
            count: vec![0; n],
        }
    }

    fn add(&mut self, s: &Splat) {
        let i = s.index;
        self.fresnel[i] += s.fresnel;
        self.jacobian[i] += s.jacobian;
        self.distance[i] += s.distance;
        self.count[i] += 1;
    }

    fn publish(self, out: &mut DebugTextures) {
        let Self {
            size,
            fresnel,
            jacobian,
            distance,
            count,
        } = self;
        let mean = |sums: Vec<f32>| -> Vec<f32> {
            sums.into_iter()
                .zip(&count)
                .map(|(v, &n)| if n > 0 { v / n as f32 } else { 0.0 })
                .collect()
        };
        for (name, sums) in [
            (FRESNEL_TEXTURE, fresnel),
            (JACOBIAN_TEXTURE, jacobian),
            (PLANE_DISTANCE_TEXTURE, distance),
        ] {
            match IntensityTexture::from_texels(size.x, size.y, mean(sums)) {
                Ok(t) => out.publish(name, t),
                Err(e) => tracing::warn!(error = %e, texture = name, "debug texture not published"),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/generate.rs"]
mod tests;
