use crate::foundation::core::{Mat4, Vec3, Vec4};
use crate::foundation::error::{CausticsError, CausticsResult};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**. The `premultiplied` flag makes this explicit at API
/// boundaries; the composite stage refuses straight-alpha frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Frame filled with one premultiplied colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = width as usize * height as usize;
        Self {
            width,
            height,
            data: rgba.repeat(px),
            premultiplied: true,
        }
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the byte length matches the dimensions.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.pixel_count() * 4
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data
            .get(i..i + 4)
            .and_then(|p| <[u8; 4]>::try_from(p).ok())
    }
}

/// Per-pixel world positions; `None` marks background pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionBuffer {
    width: u32,
    height: u32,
    positions: Vec<Option<Vec3>>,
}

impl PositionBuffer {
    /// Wrap per-pixel positions in row-major order.
    pub fn new(width: u32, height: u32, positions: Vec<Option<Vec3>>) -> CausticsResult<Self> {
        if positions.len() != width as usize * height as usize {
            return Err(CausticsError::resource(format!(
                "position buffer has {} entries, expected {width}x{height}",
                positions.len()
            )));
        }
        Ok(Self {
            width,
            height,
            positions,
        })
    }

    /// Buffer where every pixel is background.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            positions: vec![None; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// World position at linear pixel index.
    pub fn get(&self, index: usize) -> Option<Vec3> {
        self.positions.get(index).copied().flatten()
    }

    /// Set the world position at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, position: Option<Vec3>) {
        if x < self.width && y < self.height {
            self.positions[y as usize * self.width as usize + x as usize] = position;
        }
    }
}

/// Scene depth with the camera's inverse view-projection.
///
/// Depth is NDC z in `[0, 1]`; values `>= 1` are the far plane (background). Pixel centres map to
/// NDC x/y in `[-1, 1]` with row 0 at the top (+1).
#[derive(Clone, Debug, PartialEq)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    depth: Vec<f32>,
    inv_view_proj: Mat4,
}

impl DepthBuffer {
    /// Wrap per-pixel depth values in row-major order.
    pub fn new(
        width: u32,
        height: u32,
        depth: Vec<f32>,
        inv_view_proj: Mat4,
    ) -> CausticsResult<Self> {
        if depth.len() != width as usize * height as usize {
            return Err(CausticsError::resource(format!(
                "depth buffer has {} entries, expected {width}x{height}",
                depth.len()
            )));
        }
        Ok(Self {
            width,
            height,
            depth,
            inv_view_proj,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reconstructed world position at linear pixel index; `None` for background.
    pub fn world_position(&self, index: usize) -> Option<Vec3> {
        let d = *self.depth.get(index)?;
        if !d.is_finite() || d >= 1.0 {
            return None;
        }
        let w = self.width as usize;
        let x = (index % w) as f32;
        let y = (index / w) as f32;
        let ndc_x = (x + 0.5) / self.width as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - (y + 0.5) / self.height as f32 * 2.0;
        let p = self.inv_view_proj * Vec4::new(ndc_x, ndc_y, d, 1.0);
        if p.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(p.truncate() / p.w)
    }
}

/// Where the composite stage gets per-pixel world positions from.
#[derive(Clone, Copy, Debug)]
pub enum WorldSource<'a> {
    /// Explicit positions.
    Positions(&'a PositionBuffer),
    /// Positions reconstructed from depth.
    Depth(&'a DepthBuffer),
}

impl WorldSource<'_> {
    /// `(width, height)` of the source.
    pub fn size(&self) -> (u32, u32) {
        match self {
            WorldSource::Positions(p) => (p.width(), p.height()),
            WorldSource::Depth(d) => (d.width(), d.height()),
        }
    }

    /// World position at linear pixel index.
    pub fn world_position(&self, index: usize) -> Option<Vec3> {
        match self {
            WorldSource::Positions(p) => p.get(index),
            WorldSource::Depth(d) => d.world_position(index),
        }
    }
}

/// Frame-side inputs of one pipeline frame. Either target may be missing; the composite stage
/// then does nothing.
pub struct FrameTargets<'a> {
    /// Colour buffer, modified in place.
    pub color: Option<&'a mut FrameRGBA>,
    /// World position source matching the colour buffer's dimensions.
    pub world: Option<WorldSource<'a>>,
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
