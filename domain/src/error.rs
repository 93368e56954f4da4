use thiserror::Error;

/// Failures the demo recognises by kind. Everything else travels as
/// `anyhow::Error`.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("missing dependency `{name}`: {reason}")]
    MissingDependency { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),
}

impl DemoError {
    pub fn missing_dependency(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingDependency {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
