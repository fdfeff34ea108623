use thiserror::Error;

/// Errors that abort a render.
///
/// None of these are recoverable at the node level; a render either fully
/// succeeds or fails with one of them.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("schema element not found: {0}")]
    SchemaResolution(String),

    #[error("cannot determine root class: {0}")]
    AmbiguousRoot(String),

    #[error("unexpected element type for {name}: expected {expected}")]
    TypeConsistency { name: String, expected: String },

    #[error("instance does not match schema at {path}: {message}")]
    TypeMismatch { path: String, message: String },

    #[error("unsupported style directive: {0}")]
    Configuration(String),

    #[error("failed to load schema: {0}")]
    Schema(String),

    #[error("failed to load instance: {0}")]
    Instance(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
