//! Test utilities for chunk processing
//!
//! Builds resolvers and raw rows shared by the chunk processor test modules.

use std::sync::Arc;

use crate::app::models::RawRow;
use crate::app::services::chunk_processor::ChunkProcessor;
use crate::app::services::streaming_decoder::ColumnResolver;

mod processor_tests;

/// Canonical header row
pub const STANDARD_HEADERS: [&str; 6] = [
    "date",
    "operator",
    "duration_minutes",
    "rating_attendance",
    "rating_solution",
    "pause_minutes",
];

/// Processor over the given header names
pub fn processor_for(headers: &[&str]) -> ChunkProcessor {
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    ChunkProcessor::new(Arc::new(ColumnResolver::from_headers(&headers)))
}

/// Processor over the canonical header row
pub fn standard_processor() -> ChunkProcessor {
    processor_for(&STANDARD_HEADERS)
}

/// Raw row in canonical column order
pub fn row(
    date: &str,
    operator: &str,
    duration: &str,
    attendance: &str,
    solution: &str,
    pause: &str,
) -> RawRow {
    RawRow::from(vec![date, operator, duration, attendance, solution, pause])
}
