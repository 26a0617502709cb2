//! Error types for playlake
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for playlake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("Invalid storage URL '{url}': {message}")]
    InvalidLocation { url: String, message: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Ingest Errors
    // ============================================================================
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    // ============================================================================
    // Table Errors
    // ============================================================================
    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' in table '{table}' has type {actual}, expected {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid location error
    pub fn location(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode error for a source file
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Whether the error comes from the table layer rather than I/O
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Error::MissingColumn { .. } | Error::ColumnType { .. })
    }
}

/// Result type alias for playlake
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
///
/// Anything convertible into [`Error`] (io, object store, parquet) gets a
/// message prefix naming what was being done.
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("input_data");
        assert_eq!(err.to_string(), "Missing required config field: input_data");

        let err = Error::missing_column("songs", "song_id");
        assert_eq!(
            err.to_string(),
            "Column 'song_id' not found in table 'songs'"
        );
    }

    #[test]
    fn test_is_schema_error() {
        assert!(Error::missing_column("logs", "ts").is_schema_error());
        assert!(Error::ColumnType {
            table: "logs".into(),
            column: "ts".into(),
            expected: "Int64".into(),
            actual: "Utf8".into(),
        }
        .is_schema_error());
        assert!(!Error::output("disk full").is_schema_error());
        assert!(!Error::config("bad").is_schema_error());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }

    #[test]
    fn test_io_error_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.with_context(|| "Failed to read etl.yaml".to_string()).unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.to_string(), "Failed to read etl.yaml: IO error: gone");
    }
}
