//! Error types for schema normalization and visiting

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema visitor errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A node matched none of the known literal or discriminant shapes.
    /// Carries the compact JSON serialization of the offending node.
    #[error("Unimplemented: {0}")]
    UnrecognizedShape(String),

    #[error("Schema nesting exceeds recursion limit of {limit}")]
    RecursionLimitExceeded { limit: usize },

    #[error("Unsupported schema document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub(crate) fn unrecognized(node: &serde_json::Value) -> Self {
        SchemaError::UnrecognizedShape(node.to_string())
    }
}
