pub(crate) mod plane;
pub(crate) mod registry;
