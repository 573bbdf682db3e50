use crate::foundation::core::{Vec2, Vec3};
use crate::foundation::error::{CausticsError, CausticsResult};

/// Values that can be stored in a [`Field2D`] and interpolated bilinearly.
pub trait FieldValue: Copy + Send + Sync + 'static {
    /// `a + (b - a) * t`.
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl FieldValue for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl FieldValue for Vec3 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

/// Row-major 2D grid sampled with clamp-to-edge bilinear filtering.
///
/// Texel centres sit at `(i + 0.5) / width`; `uv = (0,0)` is the first texel's corner.
#[derive(Clone, Debug)]
pub struct Field2D<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

/// Water surface height, in water-local metres.
pub type HeightField = Field2D<f32>;

/// Water surface normal, in water-local space (+Y up).
pub type NormalField = Field2D<Vec3>;

impl<T: FieldValue> Field2D<T> {
    /// Wrap row-major data. `data.len()` must equal `width * height` and both must be non-zero.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> CausticsResult<Self> {
        if width == 0 || height == 0 {
            return Err(CausticsError::validation("field dimensions must be > 0"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| CausticsError::resource("field size overflow"))?;
        if data.len() != expected {
            return Err(CausticsError::validation(format!(
                "field data has {} values, expected {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A field where every texel holds `value`.
    pub fn filled(width: u32, height: u32, value: T) -> CausticsResult<Self> {
        let n = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| CausticsError::resource("field size overflow"))?;
        Self::from_vec(width, height, vec![value; n])
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw texel at integer coordinates, clamped to the edge.
    pub fn texel(&self, x: i64, y: i64) -> T {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        self.data[y * self.width as usize + x]
    }

    /// Bilinear sample at normalised coordinates.
    pub fn sample(&self, uv: Vec2) -> T {
        let fx = uv.x * self.width as f32 - 0.5;
        let fy = uv.y * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = T::lerp(self.texel(x0, y0), self.texel(x0 + 1, y0), tx);
        let bottom = T::lerp(self.texel(x0, y0 + 1), self.texel(x0 + 1, y0 + 1), tx);
        T::lerp(top, bottom, ty)
    }
}

impl HeightField {
    /// Decode a grayscale image; `0..=max` maps to `0..=height_scale` metres.
    pub fn from_luma_image(img: &image::GrayImage, height_scale: f32) -> CausticsResult<Self> {
        let data = img
            .pixels()
            .map(|p| f32::from(p.0[0]) / 255.0 * height_scale)
            .collect();
        Self::from_vec(img.width(), img.height(), data)
    }
}

impl NormalField {
    /// Decode a tangent-space normal map (`n = rgb * 2 - 1`, tangent +Z is the surface up).
    ///
    /// Tangent (x, y, z) becomes water-local (x, z, y), so the flat `(128, 128, 255)` texel maps
    /// to +Y.
    pub fn from_tangent_rgb_image(img: &image::RgbImage) -> CausticsResult<Self> {
        let data = img
            .pixels()
            .map(|p| {
                let t = Vec3::new(
                    f32::from(p.0[0]) / 255.0 * 2.0 - 1.0,
                    f32::from(p.0[1]) / 255.0 * 2.0 - 1.0,
                    f32::from(p.0[2]) / 255.0 * 2.0 - 1.0,
                );
                Vec3::new(t.x, t.z, t.y).try_normalize().unwrap_or(Vec3::Y)
            })
            .collect();
        Self::from_vec(img.width(), img.height(), data)
    }

    /// A 1x1 field holding the flat up normal.
    pub fn flat() -> Self {
        Self {
            width: 1,
            height: 1,
            data: vec![Vec3::Y],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/water/field.rs"]
mod tests;
