use crate::foundation::error::{CausticsError, CausticsResult};
use crate::render::frame::FrameRGBA;
use crate::render::texture::IntensityTexture;
use std::path::Path;

/// Encode a caustics texture as 16-bit grayscale (`min(v * exposure, 1)` mapped to `0..=65535`).
///
/// Row 0 of the texture (plane-local `v = 0`) becomes the bottom image row, so the PNG reads the
/// way the plane is seen from its front face. Uncreated textures export as black.
pub fn intensity_to_gray16(texture: &IntensityTexture, exposure: f32) -> Vec<u16> {
    let (w, h) = (texture.width() as usize, texture.height() as usize);
    let exposure = if exposure.is_finite() { exposure.max(0.0) } else { 0.0 };
    let mut out = vec![0u16; w * h];
    let Some(texels) = texture.texels() else {
        return out;
    };
    for (row, src) in texels.chunks_exact(w).enumerate() {
        let dst = &mut out[(h - 1 - row) * w..(h - row) * w];
        for (d, &v) in dst.iter_mut().zip(src) {
            let v = if v.is_finite() { (v * exposure).clamp(0.0, 1.0) } else { 0.0 };
            *d = (v * 65535.0).round() as u16;
        }
    }
    out
}

/// Write a caustics texture as a 16-bit grayscale PNG.
pub fn write_intensity_png(
    texture: &IntensityTexture,
    exposure: f32,
    path: impl AsRef<Path>,
) -> CausticsResult<()> {
    let path = path.as_ref();
    let gray = intensity_to_gray16(texture, exposure);
    let img = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_raw(
        texture.width(),
        texture.height(),
        gray,
    )
    .ok_or_else(|| CausticsError::resource("intensity buffer does not match texture size"))?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| CausticsError::resource(format!("write png '{}': {e}", path.display())))
}

/// Straight-alpha copy of a premultiplied frame.
pub fn unpremultiply(frame: &FrameRGBA) -> Vec<u8> {
    if !frame.premultiplied {
        return frame.data.clone();
    }
    let mut out = frame.data.clone();
    for px in out.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}

/// Write a frame as a straight-alpha RGBA8 PNG.
pub fn write_frame_png(frame: &FrameRGBA, path: impl AsRef<Path>) -> CausticsResult<()> {
    let path = path.as_ref();
    if !frame.is_consistent() {
        return Err(CausticsError::resource(format!(
            "frame data has {} bytes, expected {}x{}x4",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }
    image::save_buffer_with_format(
        path,
        &unpremultiply(frame),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| CausticsError::resource(format!("write png '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/export/image_export.rs"]
mod tests;
