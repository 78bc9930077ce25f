//! Chunk processor implementation
//!
//! Maps each raw row through the column resolver, normalizes every field and
//! applies the validation policies. A failing row becomes a [`Rejection`] and
//! never affects its neighbours.

use std::sync::Arc;
use tracing::trace;

use super::stats::ChunkResult;
use crate::app::models::{RawRow, Record, Rejection, RejectionReason};
use crate::app::services::field_normalizer::{
    normalize_call_count, normalize_date, normalize_operator, normalize_rating,
    normalize_signed_duration,
};
use crate::app::services::row_validator::{CandidateRecord, validate};
use crate::app::services::streaming_decoder::{ColumnResolver, SemanticColumn};

/// Stateless processor for chunks of raw rows
#[derive(Debug, Clone)]
pub struct ChunkProcessor {
    resolver: Arc<ColumnResolver>,
}

impl ChunkProcessor {
    /// Create a processor around a column resolver built from the header row
    pub fn new(resolver: Arc<ColumnResolver>) -> Self {
        Self { resolver }
    }

    /// Process a chunk whose first row has data-row index `base_index`
    pub fn process_chunk(&self, rows: Vec<RawRow>, base_index: usize) -> ChunkResult {
        let mut result = ChunkResult {
            valid_rows: Vec::with_capacity(rows.len()),
            errors: Vec::new(),
        };

        for (offset, row) in rows.into_iter().enumerate() {
            let row_index = base_index + offset;
            match self.process_row(&row) {
                Ok(record) => result.valid_rows.push(record),
                Err(reason) => {
                    trace!("Rejected row {}: {}", row_index, reason);
                    result
                        .errors
                        .push(Rejection::new(row_index, row.fields, reason));
                }
            }
        }

        result
    }

    /// Normalize and validate a single row
    pub fn process_row(&self, row: &RawRow) -> Result<Record, RejectionReason> {
        let resolver = &self.resolver;

        // A resolved required column with no cell means the row was truncated
        let truncated = SemanticColumn::REQUIRED
            .iter()
            .any(|&column| resolver.has_column(column) && resolver.get(row, column).is_none());
        if truncated {
            return Err(RejectionReason::UnparseableRow);
        }

        // Without an operator value there is nothing to attribute the call to
        let operator = resolver
            .get(row, SemanticColumn::Operator)
            .ok_or(RejectionReason::UnparseableRow)?;

        let call_count = if resolver.has_column(SemanticColumn::CallCount) {
            resolver
                .get(row, SemanticColumn::CallCount)
                .map(normalize_call_count)
                .unwrap_or(0)
        } else {
            1
        };

        let candidate = CandidateRecord {
            timestamp: resolver
                .get(row, SemanticColumn::Date)
                .and_then(normalize_date),
            operator_id: normalize_operator(operator),
            duration_minutes: resolver
                .get(row, SemanticColumn::DurationMinutes)
                .map(normalize_signed_duration)
                .unwrap_or(0.0),
            rating_attendance: resolver
                .get(row, SemanticColumn::RatingAttendance)
                .and_then(normalize_rating),
            rating_solution: resolver
                .get(row, SemanticColumn::RatingSolution)
                .and_then(normalize_rating),
            pause_minutes: resolver
                .get(row, SemanticColumn::PauseMinutes)
                .map(normalize_signed_duration)
                .unwrap_or(0.0),
            call_count,
        };

        validate(candidate)
    }
}
