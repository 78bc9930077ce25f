//! Data models for call-center ingestion
//!
//! This module contains the core data structures flowing through the pipeline:
//! undecoded rows, validated call records, rejections, progress snapshots and
//! the bounded batches handed to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Source Format
// =============================================================================

/// Decoding strategy selected for a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Delimited text decoded row by row
    Delimited { delimiter: u8 },
    /// Spreadsheet binary materialized in full before slicing
    Spreadsheet,
}

impl SourceFormat {
    /// Whether total row count is known before the first chunk
    pub fn knows_total_rows(&self) -> bool {
        matches!(self, SourceFormat::Spreadsheet)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Delimited { delimiter } => match delimiter {
                b'\t' => write!(f, "delimited (tab)"),
                other => write!(f, "delimited ('{}')", *other as char),
            },
            SourceFormat::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

// =============================================================================
// Rows and Records
// =============================================================================

/// Untyped fields of one decoded data row
///
/// Lives only until the chunk processor has turned it into a [`Record`] or a
/// [`Rejection`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Field at a column index, if the row is long enough
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Whether every field is blank
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|field| field.trim().is_empty())
    }
}

impl From<Vec<&str>> for RawRow {
    fn from(fields: Vec<&str>) -> Self {
        Self::new(fields.into_iter().map(str::to_string).collect())
    }
}

/// A validated, normalized call observation
///
/// Invariants: `operator_id` is non-empty, durations and pauses are never
/// negative, ratings are either absent or within [1, 5].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// When the call happened (informational, may be absent)
    pub timestamp: Option<DateTime<Utc>>,

    /// Operator who handled the call
    pub operator_id: String,

    /// Talk time in minutes
    pub duration_minutes: f64,

    /// Attendance rating on a 1–5 scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_attendance: Option<f64>,

    /// Solution rating on a 1–5 scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_solution: Option<f64>,

    /// Pause time in minutes
    pub pause_minutes: f64,

    /// Number of answered calls represented by this row
    pub call_count: u64,
}

// =============================================================================
// Rejections
// =============================================================================

/// Why a row was rejected; recoverable, never aborts a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, thiserror::Error)]
pub enum RejectionReason {
    #[error("missing or excluded operator")]
    MissingOrExcludedOperator,

    #[error("rating out of range (expected 1-5)")]
    RatingOutOfRange,

    #[error("negative duration or pause")]
    NegativeDuration,

    #[error("row could not be parsed")]
    UnparseableRow,
}

/// A row that failed validation, kept with its raw fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Zero-based index of the data row in the source (header excluded)
    pub row_index: usize,

    /// Raw fields as decoded
    pub raw_data: Vec<String>,

    /// Rejection category
    pub reason: RejectionReason,
}

impl Rejection {
    pub fn new(row_index: usize, raw_data: Vec<String>, reason: RejectionReason) -> Self {
        Self {
            row_index,
            raw_data,
            reason,
        }
    }

    /// One-line description for previews
    pub fn describe(&self) -> String {
        format!("Row {}: {}", self.row_index + 1, self.reason)
    }
}

// =============================================================================
// Progress and Batches
// =============================================================================

/// Snapshot of ingestion progress, informational only
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    /// Data rows decoded and processed so far
    pub processed_count: usize,

    /// Total data rows when known up front (spreadsheets)
    pub total_count: Option<usize>,

    /// Rows accepted so far
    pub valid_count: usize,

    /// Rows rejected so far
    pub rejected_count: usize,

    /// Completion estimate in [0, 100]
    pub percentage: f64,
}

impl ProgressState {
    /// Build a snapshot, estimating the percentage from row totals when
    /// known and from the byte offset otherwise
    pub fn estimate(
        processed_count: usize,
        total_count: Option<usize>,
        valid_count: usize,
        rejected_count: usize,
        bytes_read: u64,
        total_bytes: Option<u64>,
    ) -> Self {
        let percentage = match (total_count, total_bytes) {
            (Some(0), _) => 100.0,
            (Some(total), _) => processed_count as f64 / total as f64 * 100.0,
            (None, Some(0)) => 100.0,
            (None, Some(bytes)) => bytes_read as f64 / bytes as f64 * 100.0,
            (None, None) => 0.0,
        };

        Self {
            processed_count,
            total_count,
            valid_count,
            rejected_count,
            percentage: percentage.clamp(0.0, 100.0),
        }
    }
}

/// Bounded group of records and rejections handed to the caller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordBatch {
    /// Position of this batch within the run, starting at 0
    pub sequence: usize,

    /// Valid records in source order
    pub rows: Vec<Record>,

    /// Rejections in source order
    pub errors: Vec<Rejection>,
}

impl RecordBatch {
    /// Total rows represented by this batch
    pub fn len(&self) -> usize {
        self.rows.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.errors.is_empty()
    }
}
