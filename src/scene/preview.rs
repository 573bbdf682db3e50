//! Minimal ray-cast of the receiver planes through a pinhole camera.
//!
//! Produces the colour frame plus the world-position and depth buffers the composite stage
//! consumes, so the CLI can show caustics without a host renderer.

use crate::foundation::core::{Mat4, Rgb, Vec3, Vec4};
use crate::foundation::error::{CausticsError, CausticsResult};
use crate::foundation::math::{PARALLEL_EPSILON, mul_div255_u8};
use crate::receiver::plane::{ReceiverDesc, ReceiverPlane};
use crate::render::frame::{DepthBuffer, FrameRGBA, PositionBuffer};
use crate::scene::model::CameraDef;
use rayon::prelude::*;
use std::sync::Arc;

const NEAR: f32 = 0.05;
const FAR: f32 = 1000.0;

/// Validated pinhole camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    fov_y_deg: f32,
    width: u32,
    height: u32,
    background: [u8; 4],
    surface: Rgb,
}

/// Output of [`Camera::render`].
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    /// Shaded receivers over the background, premultiplied.
    pub color: FrameRGBA,
    /// World position of the visible receiver per pixel.
    pub positions: PositionBuffer,
    /// NDC depth per pixel with the inverse view-projection.
    pub depth: DepthBuffer,
}

impl Camera {
    /// Validate a camera definition.
    pub fn from_def(def: &CameraDef) -> CausticsResult<Self> {
        if def.width == 0 || def.height == 0 {
            return Err(CausticsError::validation("width and height must be > 0"));
        }
        if !(def.fov_y_deg.is_finite() && def.fov_y_deg > 0.0 && def.fov_y_deg < 180.0) {
            return Err(CausticsError::validation("fov_y_deg must be in (0, 180)"));
        }
        if !def.position.is_finite()
            || !def.target.is_finite()
            || (def.target - def.position).length_squared() < 1e-8
        {
            return Err(CausticsError::validation(
                "position and target must be finite and distinct",
            ));
        }
        Ok(Self {
            position: def.position,
            target: def.target,
            fov_y_deg: def.fov_y_deg,
            width: def.width,
            height: def.height,
            background: def.background,
            surface: def.surface,
        })
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Projection times view (right-handed, depth in `[0, 1]`).
    pub fn view_proj(&self) -> Mat4 {
        let forward = (self.target - self.position).normalize();
        let up = if forward.dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let aspect = self.width as f32 / self.height as f32;
        let proj = Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect, NEAR, FAR);
        proj * view
    }

    /// Ray-cast `receivers` (both faces visible, nearest hit wins).
    pub fn render(&self, receivers: &[Arc<ReceiverPlane>]) -> CausticsResult<PreviewFrame> {
        let view_proj = self.view_proj();
        let inv = view_proj.inverse();
        let planes: Vec<ReceiverDesc> = receivers.iter().map(|r| r.desc()).collect();
        let (w, h) = (self.width, self.height);
        let bg = premultiply(self.background);

        let pixels: Vec<([u8; 4], Option<Vec3>, f32)> = (0..w as usize * h as usize)
            .into_par_iter()
            .map(|i| {
                let x = (i % w as usize) as f32;
                let y = (i / w as usize) as f32;
                let ndc_x = (x + 0.5) / w as f32 * 2.0 - 1.0;
                let ndc_y = 1.0 - (y + 0.5) / h as f32 * 2.0;
                let near = unproject(inv, Vec4::new(ndc_x, ndc_y, 0.0, 1.0));
                let far = unproject(inv, Vec4::new(ndc_x, ndc_y, 1.0, 1.0));
                let dir = (far - near).normalize_or_zero();

                let Some((hit, normal)) = nearest_hit(&planes, near, dir) else {
                    return (bg, None, 1.0);
                };
                let shade = 0.25 + 0.75 * normal.dot(-dir).abs();
                let c = self.surface.to_vec3() * shade * 255.0;
                let rgba = [
                    c.x.round().clamp(0.0, 255.0) as u8,
                    c.y.round().clamp(0.0, 255.0) as u8,
                    c.z.round().clamp(0.0, 255.0) as u8,
                    255,
                ];
                let clip = view_proj * hit.extend(1.0);
                (rgba, Some(hit), clip.z / clip.w)
            })
            .collect();

        let mut data = Vec::with_capacity(pixels.len() * 4);
        let mut positions = Vec::with_capacity(pixels.len());
        let mut depth = Vec::with_capacity(pixels.len());
        for (rgba, p, d) in pixels {
            data.extend_from_slice(&rgba);
            positions.push(p);
            depth.push(d);
        }
        Ok(PreviewFrame {
            color: FrameRGBA {
                width: w,
                height: h,
                data,
                premultiplied: true,
            },
            positions: PositionBuffer::new(w, h, positions)?,
            depth: DepthBuffer::new(w, h, depth, inv)?,
        })
    }
}

fn unproject(inv: Mat4, ndc: Vec4) -> Vec3 {
    let p = inv * ndc;
    p.truncate() / p.w
}

/// Nearest visible receiver along a ray: world hit and world normal.
fn nearest_hit(planes: &[ReceiverDesc], origin: Vec3, dir: Vec3) -> Option<(Vec3, Vec3)> {
    let mut best: Option<(f32, Vec3, Vec3)> = None;
    for desc in planes {
        let normal = desc.placement.forward();
        let denom = dir.dot(normal);
        if denom.abs() < PARALLEL_EPSILON {
            continue;
        }
        let t = (desc.placement.position - origin).dot(normal) / denom;
        if t <= 0.0 || best.is_some_and(|(bt, _, _)| t >= bt) {
            continue;
        }
        let hit = origin + dir * t;
        let local = desc.world_to_plane().transform_point3(hit);
        let half = desc.size_meters * 0.5;
        if local.x.abs() <= half.x && local.y.abs() <= half.y {
            best = Some((t, hit, normal));
        }
    }
    best.map(|(_, hit, n)| (hit, n))
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let a16 = u16::from(a);
    [
        mul_div255_u8(u16::from(r), a16),
        mul_div255_u8(u16::from(g), a16),
        mul_div255_u8(u16::from(b), a16),
        a,
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/scene/preview.rs"]
mod tests;
