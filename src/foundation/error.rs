/// Convenience result type used across the crate.
pub type CausticsResult<T> = Result<T, CausticsError>;

/// Top-level error taxonomy.
///
/// Errors are only produced at setup and configuration boundaries (scene loading, settings
/// validation, image IO). The per-frame generation and composite paths degrade to "skip this unit
/// of work" instead of returning errors.
#[derive(thiserror::Error, Debug)]
pub enum CausticsError {
    /// Invalid user-provided scene, receiver or water data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A buffer or texture could not be created or had an unexpected shape.
    #[error("resource error: {0}")]
    Resource(String),

    /// Stage or pipeline settings that cannot be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CausticsError {
    /// Build a [`CausticsError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CausticsError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`CausticsError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CausticsError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
