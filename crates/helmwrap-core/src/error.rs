//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown config type: {kind:?}")]
    UnknownConfigKind { kind: String },

    #[error("Unknown command: {operation:?}")]
    UnknownOperation { operation: String },

    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to extract chart archive {archive}: {message}")]
    ExtractionFailed { archive: String, message: String },
}

impl CoreError {
    /// Whether the record was readable but describes something this engine
    /// cannot turn into a command (unknown type, unknown command, bad shape).
    pub fn is_unsupported_shape(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownConfigKind { .. }
                | CoreError::UnknownOperation { .. }
                | CoreError::InvalidConfig { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
