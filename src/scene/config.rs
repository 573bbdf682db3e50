use crate::foundation::core::{Placement, Vec2};
use crate::foundation::error::{CausticsError, CausticsResult};
use crate::receiver::plane::{ReceiverDesc, ReceiverPlane};
use crate::receiver::registry::ReceiverRegistry;
use crate::render::pipeline::PipelineOpts;
use crate::scene::model::{ReceiverDef, SceneDef, SurfaceDef, WaterDef};
use crate::scene::preview::Camera;
use crate::water::field::{HeightField, NormalField};
use crate::water::provider::StaticWater;
use crate::water::waves::synthesize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// JSON scene: lighting, water, receivers, stage settings and an optional preview camera.
///
/// Relative image paths resolve against the directory of the file the scene was loaded from
/// (or the working directory for [`Scene::from_reader`]).
#[derive(Debug, Clone)]
pub struct Scene {
    def: SceneDef,
    base_dir: PathBuf,
}

/// Objects created by [`Scene::build`]. Receivers are already registered (unless inactive).
#[derive(Debug)]
pub struct BuiltScene {
    /// Receivers in declaration order.
    pub receivers: Vec<Arc<ReceiverPlane>>,
    /// Water bound to the registry, if the scene declares one.
    pub water: Option<Arc<StaticWater>>,
    /// Preview camera, if the scene declares one.
    pub camera: Option<Camera>,
}

impl Scene {
    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CausticsResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| CausticsError::serde(format!("parse scene JSON: {e}")))?;
        Ok(Self::from_def(def))
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CausticsResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CausticsError::resource(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        let mut scene = Self::from_reader(BufReader::new(f))?;
        if let Some(dir) = path.parent() {
            scene.base_dir = dir.to_path_buf();
        }
        Ok(scene)
    }

    /// Wrap an in-memory definition.
    pub fn from_def(def: SceneDef) -> Self {
        Self {
            def,
            base_dir: PathBuf::new(),
        }
    }

    /// The parsed definition.
    pub fn def(&self) -> &SceneDef {
        &self.def
    }

    /// Check every field; errors name the offending one.
    pub fn validate(&self) -> CausticsResult<()> {
        let mut names = BTreeSet::new();
        for (i, r) in self.def.receivers.iter().enumerate() {
            if r.name.trim().is_empty() {
                return Err(CausticsError::validation(format!(
                    "receivers[{i}].name must not be empty"
                )));
            }
            if !names.insert(r.name.as_str()) {
                return Err(CausticsError::validation(format!(
                    "receivers[{i}].name '{}' is not unique",
                    r.name
                )));
            }
            receiver_desc(r)
                .and_then(|d| d.validate())
                .map_err(|e| CausticsError::validation(format!("receivers[{i}] ('{}'): {e}", r.name)))?;
        }
        if let Some(w) = &self.def.water {
            validate_water(w).map_err(|e| CausticsError::validation(format!("water: {e}")))?;
        }
        self.def
            .generation
            .validate()
            .map_err(|e| CausticsError::validation(format!("generation: {e}")))?;
        if let Some(c) = &self.def.camera {
            Camera::from_def(c).map_err(|e| CausticsError::validation(format!("camera: {e}")))?;
        }
        Ok(())
    }

    /// Pipeline options declared by the scene.
    pub fn pipeline_opts(&self, threads: Option<usize>) -> PipelineOpts {
        PipelineOpts {
            generation: self.def.generation,
            composite: self.def.composite,
            threads,
            pool: None,
        }
    }

    /// Validate, then bind lighting and water to `registry` and create (and activate) the
    /// receivers. `time` drives procedural water.
    pub fn build(&self, registry: &ReceiverRegistry, time: f32) -> CausticsResult<BuiltScene> {
        self.validate()?;
        registry.set_params(self.def.lighting);

        let water = match &self.def.water {
            Some(w) => {
                let water = Arc::new(self.build_water(w, time)?);
                registry.set_water(water.clone());
                Some(water)
            }
            None => {
                registry.clear_water();
                None
            }
        };

        let mut receivers = Vec::with_capacity(self.def.receivers.len());
        for r in &self.def.receivers {
            let plane = ReceiverPlane::new(r.name.clone(), receiver_desc(r)?)?;
            if r.active {
                plane.activate(registry)?;
            }
            receivers.push(plane);
        }
        tracing::debug!(receivers = receivers.len(), has_water = water.is_some(), "scene built");

        let camera = self.def.camera.as_ref().map(Camera::from_def).transpose()?;
        Ok(BuiltScene {
            receivers,
            water,
            camera,
        })
    }

    fn build_water(&self, def: &WaterDef, time: f32) -> CausticsResult<StaticWater> {
        let placement = Placement::from_euler_degrees(def.position, def.rotation_deg)?;
        let water = StaticWater::flat(def.size).with_transform(placement.plane_to_world());
        let water = match &def.surface {
            SurfaceDef::Flat => water,
            SurfaceDef::Images {
                normal,
                height,
                height_scale,
            } => {
                let normal = normal
                    .as_ref()
                    .map(|p| load_normal(&self.base_dir.join(p)))
                    .transpose()?;
                let height = height
                    .as_ref()
                    .map(|p| load_height(&self.base_dir.join(p), *height_scale))
                    .transpose()?;
                water.with_fields(height, normal)
            }
            SurfaceDef::Gerstner { resolution, waves } => {
                let (h, n) = synthesize(def.size, (resolution.x, resolution.y), waves, time)?;
                water.with_fields(Some(h), Some(n))
            }
        };
        Ok(water)
    }
}

fn receiver_desc(r: &ReceiverDef) -> CausticsResult<ReceiverDesc> {
    Ok(ReceiverDesc {
        placement: Placement::from_euler_degrees(r.position, r.rotation_deg)?,
        size_meters: r.size,
        resolution: r.resolution,
        distance_tolerance: r.distance_tolerance,
        two_sided: r.two_sided,
    })
}

fn validate_water(w: &WaterDef) -> CausticsResult<()> {
    if !w.size.is_finite() || w.size.cmple(Vec2::ZERO).any() {
        return Err(CausticsError::validation("size must be finite and > 0"));
    }
    if !w.position.is_finite() || !w.rotation_deg.is_finite() {
        return Err(CausticsError::validation(
            "position and rotation_deg must be finite",
        ));
    }
    match &w.surface {
        SurfaceDef::Gerstner { resolution, .. } if resolution.x == 0 || resolution.y == 0 => Err(
            CausticsError::validation("surface.resolution must be > 0"),
        ),
        SurfaceDef::Images { height_scale, .. } if !height_scale.is_finite() => Err(
            CausticsError::validation("surface.height_scale must be finite"),
        ),
        _ => Ok(()),
    }
}

fn load_normal(path: &Path) -> CausticsResult<NormalField> {
    let img = image::open(path).map_err(|e| {
        CausticsError::resource(format!("load normal map '{}': {e}", path.display()))
    })?;
    NormalField::from_tangent_rgb_image(&img.to_rgb8())
}

fn load_height(path: &Path, scale: f32) -> CausticsResult<HeightField> {
    let img = image::open(path).map_err(|e| {
        CausticsError::resource(format!("load height map '{}': {e}", path.display()))
    })?;
    HeightField::from_luma_image(&img.to_luma8(), scale)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;
