use crate::foundation::core::{Rgb, Vec3};
use crate::foundation::math::DIRECTION_EPSILON_SQ;
use crate::receiver::plane::ReceiverPlane;
use crate::water::provider::WaterSurfaceProvider;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Directional light source. `forward` is the direction the light travels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SunLight {
    /// Travel direction of the light; need not be normalised.
    pub forward: Vec3,
}

/// Normalised travel direction of the incident light.
///
/// Falls back to straight down when no sun is bound or its direction is degenerate.
pub fn resolve_light_direction(sun: Option<SunLight>) -> Vec3 {
    let Some(sun) = sun else {
        return Vec3::NEG_Y;
    };
    let d = sun.forward;
    if !d.is_finite() || d.length_squared() < DIRECTION_EPSILON_SQ {
        return Vec3::NEG_Y;
    }
    d.normalize()
}

/// Global lighting parameters shared by both stages.
///
/// Writers are not validated; [`LightingParams::effective`] applies the clamps at read time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LightingParams {
    /// Light-direction source; `None` means straight down.
    pub sun: Option<SunLight>,
    /// Linear caustics tint.
    pub tint: Rgb,
    /// Light intensity (>= 0 when consumed).
    pub intensity: f32,
    /// Fresnel reflectance at normal incidence (clamped to [0,1] when consumed).
    pub f0: f32,
    /// Multiplier on the inverse-Jacobian term (>= 0 when consumed).
    pub jacobian_gain: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            sun: None,
            tint: Rgb::WHITE,
            intensity: 1.0,
            f0: 0.02,
            jacobian_gain: 1.0,
        }
    }
}

impl LightingParams {
    /// Copy with every field clamped into its consumable range; non-finite values become 0.
    pub fn effective(self) -> Self {
        fn non_negative(v: f32) -> f32 {
            if v.is_finite() { v.max(0.0) } else { 0.0 }
        }
        Self {
            sun: self.sun,
            tint: self.tint.clamped(0.0, f32::MAX),
            intensity: non_negative(self.intensity),
            f0: non_negative(self.f0).min(1.0),
            jacobian_gain: non_negative(self.jacobian_gain),
        }
    }

    /// Resolved incident light direction.
    pub fn light_direction(&self) -> Vec3 {
        resolve_light_direction(self.sun)
    }
}

#[derive(Default)]
struct RegistryState {
    receivers: Vec<Arc<ReceiverPlane>>,
    water: Option<Arc<dyn WaterSurfaceProvider>>,
    params: LightingParams,
}

/// Session-wide receiver set, water binding and lighting parameters.
///
/// Constructed once per render session and passed by reference (usually inside an `Arc`) to the
/// stages. Mutations may happen from any thread between frames; stages read through
/// [`ReceiverRegistry::snapshot`] so no stage observes a half-applied change.
#[derive(Default)]
pub struct ReceiverRegistry {
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for ReceiverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.read();
        f.debug_struct("ReceiverRegistry")
            .field("receivers", &s.receivers.len())
            .field("has_water", &s.water.is_some())
            .field("params", &s.params)
            .finish()
    }
}

impl ReceiverRegistry {
    /// Empty registry with default lighting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `receiver` at the end unless it is already present.
    pub fn register(&self, receiver: &Arc<ReceiverPlane>) {
        let mut s = self.write();
        if s.receivers.iter().any(|r| Arc::ptr_eq(r, receiver)) {
            return;
        }
        tracing::debug!(receiver = receiver.name(), "register caustics receiver");
        s.receivers.push(Arc::clone(receiver));
    }

    /// Remove `receiver` if present.
    pub fn unregister(&self, receiver: &Arc<ReceiverPlane>) {
        let mut s = self.write();
        if let Some(pos) = s.receivers.iter().position(|r| Arc::ptr_eq(r, receiver)) {
            tracing::debug!(receiver = receiver.name(), "unregister caustics receiver");
            s.receivers.remove(pos);
        }
    }

    /// Registered receivers in registration order.
    pub fn receivers(&self) -> Vec<Arc<ReceiverPlane>> {
        self.read().receivers.clone()
    }

    /// Number of registered receivers.
    pub fn len(&self) -> usize {
        self.read().receivers.len()
    }

    /// Whether no receiver is registered.
    pub fn is_empty(&self) -> bool {
        self.read().receivers.is_empty()
    }

    /// Bind the active water provider.
    pub fn set_water(&self, water: Arc<dyn WaterSurfaceProvider>) {
        self.write().water = Some(water);
    }

    /// Unbind the water provider.
    pub fn clear_water(&self) {
        self.write().water = None;
    }

    /// Whether a water provider is bound.
    pub fn has_water(&self) -> bool {
        self.read().water.is_some()
    }

    /// Raw (unclamped) lighting parameters.
    pub fn params(&self) -> LightingParams {
        self.read().params
    }

    /// Replace all lighting parameters at once.
    pub fn set_params(&self, params: LightingParams) {
        self.write().params = params;
    }

    /// Set or clear the light-direction source.
    pub fn set_sun(&self, sun: Option<SunLight>) {
        self.write().params.sun = sun;
    }

    /// Current tint.
    pub fn tint(&self) -> Rgb {
        self.read().params.tint
    }

    /// Set the tint.
    pub fn set_tint(&self, tint: Rgb) {
        self.write().params.tint = tint;
    }

    /// Current intensity.
    pub fn intensity(&self) -> f32 {
        self.read().params.intensity
    }

    /// Set the intensity.
    pub fn set_intensity(&self, intensity: f32) {
        self.write().params.intensity = intensity;
    }

    /// Current Fresnel F0.
    pub fn f0(&self) -> f32 {
        self.read().params.f0
    }

    /// Set the Fresnel F0.
    pub fn set_f0(&self, f0: f32) {
        self.write().params.f0 = f0;
    }

    /// Current Jacobian gain.
    pub fn jacobian_gain(&self) -> f32 {
        self.read().params.jacobian_gain
    }

    /// Set the Jacobian gain.
    pub fn set_jacobian_gain(&self, gain: f32) {
        self.write().params.jacobian_gain = gain;
    }

    /// Consistent copy of receivers, water and clamped lighting for one stage's frame.
    pub fn snapshot(&self) -> FrameSnapshot {
        let s = self.read();
        FrameSnapshot {
            receivers: s.receivers.clone(),
            water: s.water.clone(),
            lighting: s.params.effective(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry state captured at the start of a stage.
#[derive(Clone)]
pub struct FrameSnapshot {
    /// Receivers in registration order.
    pub receivers: Vec<Arc<ReceiverPlane>>,
    /// Bound water provider, if any.
    pub water: Option<Arc<dyn WaterSurfaceProvider>>,
    /// Lighting with consumer-side clamps applied.
    pub lighting: LightingParams,
}

impl FrameSnapshot {
    /// True when there is nothing to render this frame.
    pub fn is_idle(&self) -> bool {
        self.receivers.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/receiver/registry.rs"]
mod tests;
