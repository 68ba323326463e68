use std::{
    fmt, io,
    path::{Path, PathBuf},
    result,
};

use thiserror::Error;

/// Error types for configuration and process setup.
///
/// Service failures are reported as
/// [`CellularError`](crate::services::ofono::CellularError); this enum covers
/// what happens around them: locating, reading and parsing configuration.
#[derive(Error, Debug)]
pub enum ConnuiError {
    /// Configuration validation error
    #[error("configuration validation failed for '{component}': {details}")]
    ConfigValidation {
        /// Component that failed validation
        component: String,
        /// Validation error details
        details: String,
    },

    /// I/O operation error
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Logging could not be set up
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// A specialized `Result` type for configuration and setup operations.
pub type Result<T> = result::Result<T, ConnuiError>;

impl ConnuiError {
    /// Creates a TOML parsing error with optional file path context.
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => p.to_string_lossy().to_string(),
            None => "string".to_string(),
        };

        ConnuiError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    /// Creates an I/O error carrying the path it happened on.
    pub fn io(error: impl fmt::Display, path: &Path) -> Self {
        ConnuiError::IoError {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }
}
