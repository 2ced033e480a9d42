//! Error handling for Memoria
//!
//! Runtime navigation and grab paths never return errors: rejected requests
//! degrade to "nothing happened". Errors only surface during setup, such as
//! laying out an empty content set or reading a configuration file.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Memoria operations
pub type Result<T> = std::result::Result<T, MemoriaError>;

/// Main error type for Memoria operations
#[derive(Error, Debug)]
pub enum MemoriaError {
    // Layout Errors
    #[error("No content to lay out: at least one item is required")]
    EmptyContent,

    #[error("Invalid layer configuration: {reason}")]
    InvalidLayerSpec { reason: String },

    // Configuration Errors
    #[error("Failed to read configuration: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid navigation script step: {step}")]
    InvalidScript { step: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MemoriaError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MemoriaError::EmptyContent => "EMPTY_CONTENT",
            MemoriaError::InvalidLayerSpec { .. } => "INVALID_LAYER_SPEC",
            MemoriaError::ConfigRead { .. } => "CONFIG_READ",
            MemoriaError::InvalidScript { .. } => "INVALID_SCRIPT",
            MemoriaError::Io(_) => "IO_ERROR",
            MemoriaError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave any running engine untouched; the caller can
    /// fix the input and retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MemoriaError::EmptyContent => true,
            MemoriaError::ConfigRead { .. } => true,
            MemoriaError::InvalidScript { .. } => true,
            MemoriaError::Serialization(_) => true,
            _ => false,
        }
    }
}
