pub(crate) mod composite;
pub(crate) mod debug;
pub(crate) mod frame;
pub(crate) mod generate;
pub(crate) mod pipeline;
pub(crate) mod surface_pool;
pub(crate) mod texture;
pub(crate) mod uniforms;
