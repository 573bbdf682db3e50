use crate::foundation::core::{Mat3, Mat4, Vec2, Vec3};
use crate::foundation::math::floor_texel;
use crate::water::field::{HeightField, NormalField};

/// Capability contract of an external water surface simulation.
///
/// Water-local space: the patch is centred on the origin, x spans `size_meters.x`, z spans
/// `size_meters.y`, +Y is up. Field uv `(0,0)` is the `(-x, -z)` corner.
pub trait WaterSurfaceProvider: Send + Sync {
    /// Surface normal field; `None` means "flat".
    fn normal_texture(&self) -> Option<&NormalField>;

    /// Surface height field; `None` means "zero height".
    fn height_texture(&self) -> Option<&HeightField>;

    /// Physical extent of the water patch in metres.
    fn size_meters(&self) -> Vec2;

    /// Water-local to world transform.
    fn water_to_world(&self) -> Mat4;

    /// Texel size of the normal field. Floored at `1e-4` by consumers.
    fn normal_texel_size(&self) -> f32;
}

/// Default extent of a [`StaticWater`] patch.
pub const DEFAULT_WATER_SIZE: Vec2 = Vec2::new(8.0, 8.0);

/// Texel size reported when no normal field is bound.
pub const DEFAULT_NORMAL_TEXEL_SIZE: f32 = 1.0 / 512.0;

/// Plain-data water provider holding fields produced elsewhere (images, a simulator step, or
/// [`crate::water::waves::synthesize`]).
#[derive(Clone, Debug)]
pub struct StaticWater {
    /// Normal field, if any.
    pub normal: Option<NormalField>,
    /// Height field, if any.
    pub height: Option<HeightField>,
    /// Physical extent in metres.
    pub size_meters: Vec2,
    /// Water-local to world transform; identity when unset.
    pub transform: Option<Mat4>,
}

impl Default for StaticWater {
    fn default() -> Self {
        Self {
            normal: None,
            height: None,
            size_meters: DEFAULT_WATER_SIZE,
            transform: None,
        }
    }
}

impl StaticWater {
    /// Flat, still water of the given size at the world origin.
    pub fn flat(size_meters: Vec2) -> Self {
        Self {
            size_meters,
            ..Self::default()
        }
    }

    /// Replace the surface fields.
    pub fn with_fields(mut self, height: Option<HeightField>, normal: Option<NormalField>) -> Self {
        self.height = height;
        self.normal = normal;
        self
    }

    /// Replace the water-to-world transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = Some(transform);
        self
    }
}

impl WaterSurfaceProvider for StaticWater {
    fn normal_texture(&self) -> Option<&NormalField> {
        self.normal.as_ref()
    }

    fn height_texture(&self) -> Option<&HeightField> {
        self.height.as_ref()
    }

    fn size_meters(&self) -> Vec2 {
        self.size_meters
    }

    fn water_to_world(&self) -> Mat4 {
        self.transform.unwrap_or(Mat4::IDENTITY)
    }

    fn normal_texel_size(&self) -> f32 {
        match &self.normal {
            Some(n) => 1.0 / n.width().max(1) as f32,
            None => DEFAULT_NORMAL_TEXEL_SIZE,
        }
    }
}

/// Per-frame resolved view of a provider: absent fields become the flat/zero defaults and the
/// transforms are computed once.
pub(crate) struct WaterView<'a> {
    normal: Option<&'a NormalField>,
    height: Option<&'a HeightField>,
    pub(crate) size: Vec2,
    pub(crate) water_to_world: Mat4,
    pub(crate) world_to_water: Mat4,
    normal_to_world: Mat3,
    pub(crate) normal_texel_size: f32,
}

/// World-space water sample.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SurfacePoint {
    pub(crate) position: Vec3,
    pub(crate) normal: Vec3,
}

impl<'a> WaterView<'a> {
    pub(crate) fn new(provider: &'a dyn WaterSurfaceProvider) -> Self {
        let water_to_world = provider.water_to_world();
        let normal_to_world = Mat3::from_mat4(water_to_world).inverse().transpose();
        Self {
            normal: provider.normal_texture(),
            height: provider.height_texture(),
            size: provider.size_meters(),
            water_to_world,
            world_to_water: water_to_world.inverse(),
            normal_to_world,
            normal_texel_size: floor_texel(provider.normal_texel_size()),
        }
    }

    /// Water-local position of a uv coordinate, including the height displacement.
    pub(crate) fn local_position(&self, uv: Vec2) -> Vec3 {
        let h = self.height.map_or(0.0, |f| f.sample(uv));
        Vec3::new(
            (uv.x - 0.5) * self.size.x,
            h,
            (uv.y - 0.5) * self.size.y,
        )
    }

    pub(crate) fn local_normal(&self, uv: Vec2) -> Vec3 {
        self.normal
            .map(|f| f.sample(uv))
            .and_then(Vec3::try_normalize)
            .unwrap_or(Vec3::Y)
    }

    pub(crate) fn surface_at(&self, uv: Vec2) -> SurfacePoint {
        let position = self.water_to_world.transform_point3(self.local_position(uv));
        let normal = (self.normal_to_world * self.local_normal(uv))
            .try_normalize()
            .unwrap_or(Vec3::Y);
        SurfacePoint { position, normal }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/water/provider.rs"]
mod tests;
