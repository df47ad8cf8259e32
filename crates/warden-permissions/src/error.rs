//! Error types for the permissions engine

use thiserror::Error;

/// Result type for permissions operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the permissions engine
///
/// Denials are not errors: they surface as [`crate::gate::ActionResult::Denied`].
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Ambiguous permissions for {resource_type} '{resource_id}': patterns [{}] all match",
        .patterns.join(", ")
    )]
    AmbiguousPermission {
        resource_type: String,
        resource_id: String,
        patterns: Vec<String>,
    },

    #[error("Invalid resource type: {0}")]
    InvalidResourceType(String),

    #[error("Invalid resource pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
