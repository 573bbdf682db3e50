use crate::foundation::core::{Mat4, Placement, UVec2, Vec2};
use crate::foundation::error::{CausticsError, CausticsResult};
use crate::receiver::registry::ReceiverRegistry;
use crate::render::texture::IntensityTexture;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Geometry and output settings of a receiver plane.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReceiverDesc {
    /// Plane-to-world placement; plane-local +Z is the forward normal.
    pub placement: Placement,
    /// Extent (width, height) in plane-local metres, centred on the origin.
    pub size_meters: Vec2,
    /// Output texture dimensions.
    pub resolution: UVec2,
    /// Largest perpendicular distance at which a point still counts as "on" the plane.
    pub distance_tolerance: f32,
    /// When false, points and rays behind the forward normal are excluded.
    pub two_sided: bool,
}

impl Default for ReceiverDesc {
    fn default() -> Self {
        Self {
            placement: Placement::IDENTITY,
            size_meters: Vec2::new(6.0, 3.0),
            resolution: UVec2::new(1024, 512),
            distance_tolerance: 0.02,
            two_sided: false,
        }
    }
}

impl ReceiverDesc {
    /// Check the invariants the stages rely on.
    pub fn validate(&self) -> CausticsResult<()> {
        if !self.size_meters.is_finite() || self.size_meters.x <= 0.0 || self.size_meters.y <= 0.0
        {
            return Err(CausticsError::validation(
                "receiver size_meters must be finite and > 0",
            ));
        }
        if self.resolution.x == 0 || self.resolution.y == 0 {
            return Err(CausticsError::validation("receiver resolution must be > 0"));
        }
        if !self.distance_tolerance.is_finite() || self.distance_tolerance < 0.0 {
            return Err(CausticsError::validation(
                "receiver distance_tolerance must be finite and >= 0",
            ));
        }
        if !self.placement.position.is_finite() || !self.placement.rotation.is_normalized() {
            return Err(CausticsError::validation(
                "receiver placement must be finite with a unit rotation",
            ));
        }
        Ok(())
    }

    /// Plane-local to world transform.
    pub fn plane_to_world(&self) -> Mat4 {
        self.placement.plane_to_world()
    }

    /// World to plane-local transform.
    pub fn world_to_plane(&self) -> Mat4 {
        self.placement.world_to_plane()
    }
}

/// A flat surface that receives caustics and owns its output texture.
///
/// Planes are shared by `Arc` between the host and the [`ReceiverRegistry`]; identity is pointer
/// identity. At most one texture is live at a time and it always matches `resolution`.
#[derive(Debug)]
pub struct ReceiverPlane {
    name: String,
    desc: RwLock<ReceiverDesc>,
    texture: RwLock<Option<IntensityTexture>>,
}

impl ReceiverPlane {
    /// Create an inactive plane (no texture, not registered).
    pub fn new(name: impl Into<String>, desc: ReceiverDesc) -> CausticsResult<Arc<Self>> {
        desc.validate()?;
        Ok(Arc::new(Self {
            name: name.into(),
            desc: RwLock::new(desc),
            texture: RwLock::new(None),
        }))
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of the current settings.
    pub fn desc(&self) -> ReceiverDesc {
        *self.desc.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the settings. The texture is reallocated only if it is live and the resolution
    /// changed; the new texture is committed lazily by the next generation pass.
    pub fn set_desc(&self, desc: ReceiverDesc) -> CausticsResult<()> {
        desc.validate()?;
        *self.desc.write().unwrap_or_else(PoisonError::into_inner) = desc;

        let mut slot = self.texture_write();
        let stale = slot.as_ref().is_some_and(|t| t.size() != desc.resolution);
        if stale {
            tracing::debug!(receiver = %self.name, res = ?desc.resolution, "reallocating caustics texture");
            *slot = Some(IntensityTexture::new(desc.resolution.x, desc.resolution.y)?);
        }
        Ok(())
    }

    /// Allocate the texture and register with `registry`.
    pub fn activate(self: &Arc<Self>, registry: &ReceiverRegistry) -> CausticsResult<()> {
        self.allocate()?;
        registry.register(self);
        Ok(())
    }

    /// Unregister from `registry` and release the texture.
    pub fn deactivate(self: &Arc<Self>, registry: &ReceiverRegistry) {
        registry.unregister(self);
        self.release();
    }

    /// Whether a texture is currently live.
    pub fn has_texture(&self) -> bool {
        self.texture().is_some()
    }

    /// Run `f` on the texture, if one is live.
    pub fn with_texture<R>(&self, f: impl FnOnce(&IntensityTexture) -> R) -> Option<R> {
        self.texture().as_ref().map(f)
    }

    /// Run `f` on the texture mutably, if one is live.
    pub fn with_texture_mut<R>(&self, f: impl FnOnce(&mut IntensityTexture) -> R) -> Option<R> {
        self.texture_write().as_mut().map(f)
    }

    /// Clone of the current texture, for inspection and export.
    pub fn texture_snapshot(&self) -> Option<IntensityTexture> {
        self.texture().clone()
    }

    /// Read access to the texture slot. Holding the guard blocks the generation stage.
    pub fn texture(&self) -> RwLockReadGuard<'_, Option<IntensityTexture>> {
        self.texture.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn texture_write(&self) -> RwLockWriteGuard<'_, Option<IntensityTexture>> {
        self.texture.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate(&self) -> CausticsResult<()> {
        let res = self.desc().resolution;
        let texture = IntensityTexture::zeroed(res.x, res.y)?;
        *self.texture_write() = Some(texture);
        Ok(())
    }

    fn release(&self) {
        self.texture_write().take();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/receiver/plane.rs"]
mod tests;
