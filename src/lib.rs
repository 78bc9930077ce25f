//! Call-Center Pipeline Library
//!
//! A Rust library for ingesting large call-center export files (delimited text
//! or spreadsheet binaries) and ranking the operators who handled the calls.
//!
//! This library provides tools for:
//! - Decoding CSV/TSV exports incrementally and spreadsheets in bounded slices
//! - Resolving standard and vendor-specific headers to semantic columns
//! - Normalizing dates, durations, ratings and call counts into typed records
//! - Validating rows and collecting rejections without aborting a run
//! - Running decode work on a background worker with progress, backpressure
//!   and cooperative cancellation
//! - Folding records into per-operator metrics and a weighted ranking score

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod aggregation;
        pub mod chunk_processor;
        pub mod field_normalizer;
        pub mod ingestion;
        pub mod row_validator;
        pub mod streaming_decoder;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod progress;
}

// Re-export commonly used types
pub use app::models::{
    ProgressState, RawRow, Record, RecordBatch, Rejection, RejectionReason, SourceFormat,
};
pub use app::services::aggregation::{AggregationEngine, GlobalMetrics, OperatorMetrics, ScoreEntry};
pub use app::services::ingestion::{
    CancellationHandle, IngestionCoordinator, IngestionEvent, IngestionOutcome, IngestionSource,
    IngestionState, IngestionSummary,
};
pub use config::{IngestionOptions, PipelineConfig};

/// Result type alias for the call-center pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error types for ingestion and aggregation operations
///
/// Row-level problems are never reported through this type; they become
/// [`Rejection`] values carried alongside the valid records.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Source is neither a recognized delimited nor spreadsheet format
    #[error("Unsupported format for source '{source_name}': {message}")]
    UnsupportedFormat {
        source_name: String,
        message: String,
    },

    /// Source exceeds the local processing ceiling
    #[error(
        "Source '{source_name}' is too large for local processing: {size_bytes} bytes exceeds limit of {limit_bytes} bytes"
    )]
    SourceTooLarge {
        source_name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// Container could not be decoded part-way through a run
    #[error("Malformed container in '{source_name}': {message}")]
    MalformedContainer {
        source_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Operation not allowed in the current coordinator state
    #[error("Invalid ingestion state: {message}")]
    InvalidState { message: String },

    /// Background worker ended without reporting a terminal status
    #[error("Background worker failed: {message}")]
    WorkerFailed { message: String },

    /// Run finished without a single valid record
    #[error("No valid rows found: {rejected_rows} of {total_rows} rows were rejected")]
    NoValidRows {
        total_rows: usize,
        rejected_rows: usize,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a source too large error
    pub fn source_too_large(source_name: impl Into<String>, size_bytes: u64, limit_bytes: u64) -> Self {
        Self::SourceTooLarge {
            source_name: source_name.into(),
            size_bytes,
            limit_bytes,
        }
    }

    /// Create a malformed container error without an underlying cause
    pub fn malformed_container(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedContainer {
            source_name: source_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a malformed container error wrapping the decoder's error
    pub fn malformed_container_with_source(
        source_name: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MalformedContainer {
            source_name: source_name.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a worker failure error
    pub fn worker_failed(message: impl Into<String>) -> Self {
        Self::WorkerFailed {
            message: message.into(),
        }
    }

    /// Create a no valid rows error
    pub fn no_valid_rows(total_rows: usize, rejected_rows: usize) -> Self {
        Self::NoValidRows {
            total_rows,
            rejected_rows,
        }
    }

    /// Whether the error was raised before any row was decoded
    pub fn is_pre_start(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::SourceTooLarge { .. } | Self::InvalidState { .. }
        )
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::MalformedContainer {
            source_name: "unknown".to_string(),
            message: "CSV decoding failed".to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<calamine::Error> for Error {
    fn from(error: calamine::Error) -> Self {
        Self::MalformedContainer {
            source_name: "unknown".to_string(),
            message: "Spreadsheet decoding failed".to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid configuration file: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_start_classification() {
        assert!(Error::unsupported_format("a.pdf", "unknown suffix").is_pre_start());
        assert!(Error::source_too_large("big.csv", 100, 10).is_pre_start());
        assert!(!Error::malformed_container("a.xlsx", "bad zip").is_pre_start());
        assert!(!Error::no_valid_rows(3, 3).is_pre_start());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let error = Error::source_too_large("export.csv", 60, 50);
        let message = error.to_string();
        assert!(message.contains("export.csv"));
        assert!(message.contains("60"));
        assert!(message.contains("50"));

        let error = Error::no_valid_rows(4, 4);
        assert_eq!(
            error.to_string(),
            "No valid rows found: 4 of 4 rows were rejected"
        );
    }
}
