//! Custom error types for transparencia
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for transparencia operations
#[derive(Error, Debug)]
pub enum TransparencyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Source data that cannot be interpreted (bad dates, missing fields)
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Invalid arguments or query combinations
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TransparencyError {
    /// Create a data format error
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat(message.into())
    }

    /// Create a "not found" error for manifest documents
    pub fn dataset_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Dataset document",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for report presets
    pub fn preset_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Report preset",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a data format error
    pub fn is_data_format(&self) -> bool {
        matches!(self, Self::DataFormat(_))
    }
}

impl From<std::io::Error> for TransparencyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TransparencyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for TransparencyError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for transparencia operations
pub type TransparencyResult<T> = Result<T, TransparencyError>;
