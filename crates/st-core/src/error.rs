//! Error types for SpecTrack

use thiserror::Error;

/// SpecTrack error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error (singular or non-SPD matrices)
    #[error("Computation error: {0}")]
    Computation(String),

    /// Configuration the reconstruction does not support
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
