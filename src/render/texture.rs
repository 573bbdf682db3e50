use crate::foundation::core::{UVec2, Vec2};
use crate::foundation::error::{CausticsError, CausticsResult};

/// Single-channel HDR intensity image.
///
/// Row-major, row 0 holds plane-local `v = 0`. Values are linear energy, not gamma encoded.
/// Storage is created lazily (see [`IntensityTexture::is_created`]), mirroring GPU resources that
/// exist as descriptors before their memory is committed.
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityTexture {
    width: u32,
    height: u32,
    texels: Option<Vec<f32>>,
}

impl IntensityTexture {
    /// Describe a texture of the given size without committing storage.
    pub fn new(width: u32, height: u32) -> CausticsResult<Self> {
        if width == 0 || height == 0 {
            return Err(CausticsError::resource(format!(
                "texture dimensions must be > 0 (got {width}x{height})"
            )));
        }
        (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| CausticsError::resource("texture size overflow"))?;
        Ok(Self {
            width,
            height,
            texels: None,
        })
    }

    /// Describe and immediately create a zero-filled texture.
    pub fn zeroed(width: u32, height: u32) -> CausticsResult<Self> {
        let mut t = Self::new(width, height)?;
        t.create();
        Ok(t)
    }

    /// Wrap existing texel data.
    pub fn from_texels(width: u32, height: u32, texels: Vec<f32>) -> CausticsResult<Self> {
        let mut t = Self::new(width, height)?;
        if texels.len() != t.len() {
            return Err(CausticsError::resource(format!(
                "texture data has {} texels, expected {width}x{height}",
                texels.len()
            )));
        }
        t.texels = Some(texels);
        Ok(t)
    }

    /// The canonical 1x1 black texture bound to unused composite slots.
    pub fn black() -> Self {
        Self {
            width: 1,
            height: 1,
            texels: Some(vec![0.0]),
        }
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// Number of texels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Always false; textures have at least one texel.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether storage has been committed.
    pub fn is_created(&self) -> bool {
        self.texels.is_some()
    }

    /// Commit zero-filled storage if not already created.
    pub fn create(&mut self) {
        if self.texels.is_none() {
            self.texels = Some(vec![0.0; self.len()]);
        }
    }

    /// Set every texel to zero, creating storage if needed.
    pub fn clear(&mut self) {
        match &mut self.texels {
            Some(t) => t.fill(0.0),
            None => self.create(),
        }
    }

    /// Texel values, or `None` before creation.
    pub fn texels(&self) -> Option<&[f32]> {
        self.texels.as_deref()
    }

    /// Mutable texel values, creating storage if needed.
    pub fn texels_mut(&mut self) -> &mut [f32] {
        self.create();
        self.texels.get_or_insert_with(Vec::new)
    }

    /// Texel at integer coordinates; zero outside the texture or before creation.
    pub fn texel(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.texels
            .as_ref()
            .map_or(0.0, |t| t[y as usize * self.width as usize + x as usize])
    }

    /// Mutable texel at integer coordinates, creating storage if needed. `None` outside.
    pub fn texel_mut(&mut self, x: u32, y: u32) -> Option<&mut f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.texels_mut().get_mut(i)
    }

    /// Add `value` to the texel at linear `index`; out-of-range indices are ignored.
    pub fn accumulate(&mut self, index: usize, value: f32) {
        if let Some(t) = self.texels_mut().get_mut(index) {
            *t += value;
        }
    }

    /// Texel index covering normalised coordinates (nearest, clamped to the edge).
    pub fn index_at(&self, uv: Vec2) -> usize {
        let x = ((uv.x * self.width as f32).floor() as i64).clamp(0, i64::from(self.width) - 1);
        let y = ((uv.y * self.height as f32).floor() as i64).clamp(0, i64::from(self.height) - 1);
        y as usize * self.width as usize + x as usize
    }

    /// Bilinear sample with clamp-to-edge addressing. Zero before creation.
    pub fn sample_bilinear(&self, uv: Vec2) -> f32 {
        let Some(t) = self.texels.as_deref() else {
            return 0.0;
        };
        let w = i64::from(self.width);
        let h = i64::from(self.height);
        let fx = uv.x * self.width as f32 - 0.5;
        let fy = uv.y * self.height as f32 - 0.5;
        let x0f = fx.floor();
        let y0f = fy.floor();
        let tx = fx - x0f;
        let ty = fy - y0f;
        let at = |x: i64, y: i64| -> f32 {
            let x = x.clamp(0, w - 1) as usize;
            let y = y.clamp(0, h - 1) as usize;
            t[y * self.width as usize + x]
        };
        let (x0, y0) = (x0f as i64, y0f as i64);
        let top = at(x0, y0) + (at(x0 + 1, y0) - at(x0, y0)) * tx;
        let bottom = at(x0, y0 + 1) + (at(x0 + 1, y0 + 1) - at(x0, y0 + 1)) * tx;
        top + (bottom - top) * ty
    }

    /// Largest texel value (0 before creation).
    pub fn max_value(&self) -> f32 {
        self.texels
            .as_deref()
            .map_or(0.0, |t| t.iter().copied().fold(0.0f32, f32::max))
    }

    /// Stable 64-bit hash of the dimensions and texel bits.
    pub fn fingerprint(&self) -> u64 {
        let mut h = xxhash_rust::xxh3::Xxh3::new();
        h.update(&self.width.to_le_bytes());
        h.update(&self.height.to_le_bytes());
        if let Some(t) = &self.texels {
            for v in t {
                h.update(&v.to_bits().to_le_bytes());
            }
        }
        h.digest()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/texture.rs"]
mod tests;
