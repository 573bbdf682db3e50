pub(crate) mod field;
pub(crate) mod provider;
pub(crate) mod waves;
