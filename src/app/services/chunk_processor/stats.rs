//! Per-chunk results and rejection tallies

use crate::app::models::{Record, Rejection, RejectionReason};
use std::collections::BTreeMap;

/// Outcome of processing one chunk of raw rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkResult {
    /// Records that passed validation, in source order
    pub valid_rows: Vec<Record>,
    /// Rows that failed validation, in source order
    pub errors: Vec<Rejection>,
}

impl ChunkResult {
    /// Rows represented by this result
    pub fn total(&self) -> usize {
        self.valid_rows.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_rows.is_empty() && self.errors.is_empty()
    }

    /// Rejection counts grouped by reason
    pub fn reason_counts(&self) -> BTreeMap<RejectionReason, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.errors {
            *counts.entry(rejection.reason).or_insert(0) += 1;
        }
        counts
    }
}
