//! Aggregation of validated call records
//!
//! This module folds records into per-operator accumulators and ranks the
//! operators with a weighted score. The engine is owned by the caller and
//! lives for one run; nothing here is shared or global.
//!
//! # Architecture
//!
//! - [`accumulator`] - Running sums per operator and the metrics they project
//! - [`engine`] - Fold, merge, reset and metric projections
//! - [`scoring`] - Normalization against dataset maxima and the ranking
//!
//! # Example Usage
//!
//! ```rust
//! use callcenter_pipeline::{AggregationEngine, Record};
//!
//! let mut engine = AggregationEngine::new();
//! engine.fold(&Record {
//!     timestamp: None,
//!     operator_id: "Ana Silva".to_string(),
//!     duration_minutes: 8.5,
//!     rating_attendance: Some(5.0),
//!     rating_solution: Some(4.0),
//!     pause_minutes: 10.0,
//!     call_count: 1,
//! });
//!
//! let metrics = engine.compute_operator_metrics();
//! let ranking = engine.compute_scores(&metrics);
//! assert_eq!(ranking[0].operator_id, "Ana Silva");
//! ```

pub mod accumulator;
pub mod engine;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use accumulator::{OperatorAccumulator, OperatorMetrics};
pub use engine::{AggregationEngine, GlobalMetrics};
pub use scoring::{NormalizedInputs, ScoreEntry, compute_scores, round_average, round_to};
