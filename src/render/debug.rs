//! Read-only inspection surface: auxiliary textures published by generation, receiver texture
//! previews and clamped live tuning of the registry's lighting parameters.

use crate::foundation::core::Rgb;
use crate::receiver::registry::ReceiverRegistry;
use crate::render::texture::IntensityTexture;
use std::collections::BTreeMap;

/// Mean Fresnel weight of the hits per texel.
pub const FRESNEL_TEXTURE: &str = "_RC_Fresnel";
/// Mean `|det J|` of the hits per texel.
pub const JACOBIAN_TEXTURE: &str = "_RC_Jacobian";
/// Mean perpendicular distance of the hits from the plane per texel.
pub const PLANE_DISTANCE_TEXTURE: &str = "_RC_PlaneMask";
/// Reserved for an occlusion mask; never published.
pub const SHADOW_MASK_TEXTURE: &str = "_RC_ShadowMask";

/// Named auxiliary textures, replaced every frame by the generation stage.
#[derive(Debug, Clone, Default)]
pub struct DebugTextures {
    textures: BTreeMap<String, IntensityTexture>,
}

impl DebugTextures {
    /// Texture published under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&IntensityTexture> {
        self.textures.get(name)
    }

    /// Publish (or replace) a texture.
    pub fn publish(&mut self, name: impl Into<String>, texture: IntensityTexture) {
        self.textures.insert(name.into(), texture);
    }

    /// Drop every published texture.
    pub fn clear(&mut self) {
        self.textures.clear();
    }

    /// Published names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.textures.keys().map(String::as_str)
    }

    /// Whether nothing is published.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Inspector view selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugView {
    /// Nothing selected.
    #[default]
    None,
    /// A receiver's caustics texture.
    Caustics,
    /// [`FRESNEL_TEXTURE`].
    Fresnel,
    /// [`JACOBIAN_TEXTURE`].
    Jacobian,
    /// [`PLANE_DISTANCE_TEXTURE`].
    PlaneDistance,
    /// [`SHADOW_MASK_TEXTURE`].
    ShadowMask,
}

impl DebugView {
    /// Every view in display order.
    pub const ALL: [DebugView; 6] = [
        DebugView::None,
        DebugView::Caustics,
        DebugView::Fresnel,
        DebugView::Jacobian,
        DebugView::PlaneDistance,
        DebugView::ShadowMask,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            DebugView::None => "None",
            DebugView::Caustics => "CausticsRT",
            DebugView::Fresnel => "Fresnel R(θ)",
            DebugView::Jacobian => "Jacobian detJ",
            DebugView::PlaneDistance => "Plane distance",
            DebugView::ShadowMask => "Shadow mask",
        }
    }

    /// Global texture name backing this view, for the views that read one.
    pub fn texture_name(self) -> Option<&'static str> {
        match self {
            DebugView::Fresnel => Some(FRESNEL_TEXTURE),
            DebugView::Jacobian => Some(JACOBIAN_TEXTURE),
            DebugView::PlaneDistance => Some(PLANE_DISTANCE_TEXTURE),
            DebugView::ShadowMask => Some(SHADOW_MASK_TEXTURE),
            DebugView::None | DebugView::Caustics => None,
        }
    }
}

/// A texture selected for preview.
#[derive(Debug, Clone)]
pub struct TexturePreview {
    /// Receiver name or global texture name.
    pub label: String,
    /// Copy of the texture contents.
    pub texture: IntensityTexture,
}

impl TexturePreview {
    /// Width over height, 1 for degenerate sizes.
    pub fn aspect(&self) -> f32 {
        let (w, h) = (self.texture.width(), self.texture.height());
        if w > 0 && h > 0 { w as f32 / h as f32 } else { 1.0 }
    }
}

/// Why a preview could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewUnavailable {
    /// [`DebugView::None`] is selected.
    #[error("no view selected")]
    NoView,
    /// The registry has no receivers.
    #[error("no receivers are registered")]
    NoReceivers,
    /// The selected receiver has no live texture.
    #[error("receiver '{0}' has no texture")]
    NoTexture(String),
    /// Nothing is published under the view's global name.
    #[error("global texture '{0}' is not currently assigned")]
    NotAssigned(&'static str),
}

/// Slider ranges for live tuning.
pub const INTENSITY_RANGE: (f32, f32) = (0.0, 5.0);
/// Slider range for F0.
pub const F0_RANGE: (f32, f32) = (0.0, 1.0);
/// Slider range for the Jacobian gain.
pub const JACOBIAN_GAIN_RANGE: (f32, f32) = (0.0, 5.0);

/// Read-only inspector over a registry and the generation stage's debug textures.
///
/// Never takes part in frame ordering; it only reads textures and writes lighting parameters.
pub struct Inspector<'a> {
    registry: &'a ReceiverRegistry,
    debug: &'a DebugTextures,
}

impl<'a> Inspector<'a> {
    /// Build an inspector.
    pub fn new(registry: &'a ReceiverRegistry, debug: &'a DebugTextures) -> Self {
        Self { registry, debug }
    }

    /// Clamp a receiver index into the registered range (0 when empty).
    pub fn clamp_receiver_index(&self, index: usize) -> usize {
        index.min(self.registry.len().saturating_sub(1))
    }

    /// Preview for `view`. `receiver_index` is clamped and only used by [`DebugView::Caustics`].
    pub fn preview(
        &self,
        view: DebugView,
        receiver_index: usize,
    ) -> Result<TexturePreview, PreviewUnavailable> {
        match view {
            DebugView::None => Err(PreviewUnavailable::NoView),
            DebugView::Caustics => {
                let receivers = self.registry.receivers();
                if receivers.is_empty() {
                    return Err(PreviewUnavailable::NoReceivers);
                }
                let r = &receivers[receiver_index.min(receivers.len() - 1)];
                let texture = r
                    .texture_snapshot()
                    .ok_or_else(|| PreviewUnavailable::NoTexture(r.name().to_owned()))?;
                Ok(TexturePreview {
                    label: r.name().to_owned(),
                    texture,
                })
            }
            other => {
                let name = other.texture_name().ok_or(PreviewUnavailable::NoView)?;
                let texture = self
                    .debug
                    .get(name)
                    .cloned()
                    .ok_or(PreviewUnavailable::NotAssigned(name))?;
                Ok(TexturePreview {
                    label: name.to_owned(),
                    texture,
                })
            }
        }
    }

    /// Set the intensity, clamped to [`INTENSITY_RANGE`]. Returns the stored value.
    pub fn tune_intensity(&self, v: f32) -> f32 {
        let v = clamp_range(v, INTENSITY_RANGE);
        self.registry.set_intensity(v);
        v
    }

    /// Set F0, clamped to [`F0_RANGE`]. Returns the stored value.
    pub fn tune_f0(&self, v: f32) -> f32 {
        let v = clamp_range(v, F0_RANGE);
        self.registry.set_f0(v);
        v
    }

    /// Set the Jacobian gain, clamped to [`JACOBIAN_GAIN_RANGE`]. Returns the stored value.
    pub fn tune_jacobian_gain(&self, v: f32) -> f32 {
        let v = clamp_range(v, JACOBIAN_GAIN_RANGE);
        self.registry.set_jacobian_gain(v);
        v
    }

    /// Set the tint with every channel clamped to [0, 1]. Returns the stored value.
    pub fn tune_tint(&self, tint: Rgb) -> Rgb {
        let tint = tint.clamped(0.0, 1.0);
        self.registry.set_tint(tint);
        tint
    }
}

fn clamp_range(v: f32, (lo, hi): (f32, f32)) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { lo }
}

#[cfg(test)]
#[path = "../../tests/unit/render/debug.rs"]
mod tests;
