pub(crate) mod image_export;
