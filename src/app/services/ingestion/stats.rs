//! Run summaries and terminal outcomes for ingestion
//!
//! This module provides the statistics gathered over one ingestion run and the
//! outcome handed back once the run has reached a terminal state.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::app::models::{Rejection, RejectionReason, SourceFormat};
use crate::app::services::streaming_decoder::{DetectionMode, SemanticColumn};
use crate::{Error, Result};

/// Statistics for one ingestion run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestionSummary {
    /// Display name of the source
    pub source_name: String,

    /// Detected format, once the run has started
    pub format: Option<SourceFormat>,

    /// Data rows decoded (valid + rejected)
    pub total_rows: usize,

    /// Rows that became records
    pub valid_rows: usize,

    /// Rows that became rejections
    pub rejected_rows: usize,

    /// Rejections grouped by reason
    pub reason_counts: BTreeMap<RejectionReason, usize>,

    /// First rejections of the run, bounded by the preview limit
    pub rejection_preview: Vec<Rejection>,

    /// Required columns the header row did not provide
    pub missing_columns: Vec<SemanticColumn>,

    /// How the header row was matched
    pub detection_mode: Option<DetectionMode>,

    /// Batches handed to the caller
    pub batches_emitted: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl IngestionSummary {
    /// Create an empty summary for a named source
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    /// Record a rejection, keeping it in the preview while there is room
    pub fn add_rejection(&mut self, rejection: &Rejection, preview_limit: usize) {
        self.rejected_rows += 1;
        *self.reason_counts.entry(rejection.reason).or_insert(0) += 1;
        if self.rejection_preview.len() < preview_limit {
            self.rejection_preview.push(rejection.clone());
        }
    }

    /// Percentage of decoded rows that were accepted
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            (self.valid_rows as f64 / self.total_rows as f64) * 100.0
        }
    }

    /// A run is successful when it produced at least one valid record
    pub fn is_successful(&self) -> bool {
        self.valid_rows > 0
    }

    /// Get summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "Ingestion Summary: {} rows -> {} valid, {} rejected ({:.1}% success) | \
             Batches: {} | Elapsed: {:.2}s",
            self.total_rows,
            self.valid_rows,
            self.rejected_rows,
            self.success_rate(),
            self.batches_emitted,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Terminal outcome of an ingestion run
#[derive(Debug)]
pub enum IngestionOutcome {
    /// Input exhausted and every buffered row handed off
    Completed(IngestionSummary),
    /// Decoding stopped on an unrecoverable error
    Failed {
        error: Error,
        summary: IngestionSummary,
    },
    /// Cancellation observed at a chunk boundary
    Cancelled(IngestionSummary),
}

impl IngestionOutcome {
    /// Summary of the run regardless of how it ended
    pub fn summary(&self) -> &IngestionSummary {
        match self {
            Self::Completed(summary) | Self::Cancelled(summary) => summary,
            Self::Failed { summary, .. } => summary,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Convert into a result, treating a run without valid rows as a failure
    ///
    /// A cancelled run is not an error and returns its partial summary.
    pub fn into_result(self) -> Result<IngestionSummary> {
        match self {
            Self::Completed(summary) if !summary.is_successful() => {
                Err(Error::no_valid_rows(summary.total_rows, summary.rejected_rows))
            }
            Self::Completed(summary) | Self::Cancelled(summary) => Ok(summary),
            Self::Failed { error, .. } => Err(error),
        }
    }
}
