//! Aggregation engine
//!
//! Folds validated records into per-operator accumulators and dataset-wide
//! totals. Projections are pure: calling them repeatedly without folding in
//! between yields the same result.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use super::accumulator::{OperatorAccumulator, OperatorMetrics, mean, per_record};
use super::scoring::{ScoreEntry, compute_scores};
use crate::app::models::{Record, RecordBatch};

/// Dataset-wide metrics
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GlobalMetrics {
    pub total_records: u64,
    pub total_calls: u64,
    pub operator_count: usize,
    pub total_duration_minutes: f64,
    pub avg_duration_minutes: f64,
    pub total_pause_minutes: f64,
    pub avg_pause_minutes: f64,
    pub avg_rating_attendance: Option<f64>,
    pub avg_rating_solution: Option<f64>,
    /// Earliest and latest timestamps seen, if any record carried one
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Calls per calendar day (UTC) for records with a timestamp
    pub calls_per_day: BTreeMap<NaiveDate, u64>,
}

/// Caller-owned accumulator state for one run
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    accumulators: HashMap<String, OperatorAccumulator>,
    /// Operators in first-seen order
    order: Vec<String>,
    totals: OperatorAccumulator,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
    calls_per_day: BTreeMap<NaiveDate, u64>,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into its operator's accumulator
    pub fn fold(&mut self, record: &Record) {
        match self.accumulators.get_mut(&record.operator_id) {
            Some(accumulator) => accumulator.add(record),
            None => {
                let mut accumulator = OperatorAccumulator::default();
                accumulator.add(record);
                self.order.push(record.operator_id.clone());
                self.accumulators
                    .insert(record.operator_id.clone(), accumulator);
            }
        }

        self.totals.add(record);

        if let Some(timestamp) = record.timestamp {
            self.first_timestamp = Some(self.first_timestamp.map_or(timestamp, |t| t.min(timestamp)));
            self.last_timestamp = Some(self.last_timestamp.map_or(timestamp, |t| t.max(timestamp)));
            *self
                .calls_per_day
                .entry(timestamp.date_naive())
                .or_insert(0) += record.call_count;
        }
    }

    /// Fold every valid record of a batch; rejections are ignored
    pub fn fold_batch(&mut self, batch: &RecordBatch) {
        for record in &batch.rows {
            self.fold(record);
        }
        debug!(
            "Folded batch {} ({} records, {} operators so far)",
            batch.sequence,
            batch.rows.len(),
            self.order.len()
        );
    }

    /// Fold another engine's state into this one
    ///
    /// Operators new to this engine are appended in the other engine's
    /// first-seen order.
    pub fn merge(&mut self, other: AggregationEngine) {
        let AggregationEngine {
            mut accumulators,
            order,
            totals,
            first_timestamp,
            last_timestamp,
            calls_per_day,
        } = other;

        for operator_id in order {
            let Some(incoming) = accumulators.remove(&operator_id) else {
                continue;
            };
            match self.accumulators.get_mut(&operator_id) {
                Some(existing) => existing.merge(&incoming),
                None => {
                    self.order.push(operator_id.clone());
                    self.accumulators.insert(operator_id, incoming);
                }
            }
        }

        self.totals.merge(&totals);
        self.first_timestamp = earliest(self.first_timestamp, first_timestamp);
        self.last_timestamp = latest(self.last_timestamp, last_timestamp);
        for (day, calls) in calls_per_day {
            *self.calls_per_day.entry(day).or_insert(0) += calls;
        }
    }

    /// Discard all accumulated state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn operator_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.records == 0
    }

    /// Dataset-wide metrics
    pub fn compute_global_metrics(&self) -> GlobalMetrics {
        let totals = &self.totals;
        GlobalMetrics {
            total_records: totals.records,
            total_calls: totals.call_count,
            operator_count: self.order.len(),
            total_duration_minutes: totals.total_duration,
            avg_duration_minutes: per_record(totals.total_duration, totals.records),
            total_pause_minutes: totals.total_pause,
            avg_pause_minutes: per_record(totals.total_pause, totals.records),
            avg_rating_attendance: mean(
                totals.rating_attendance_sum,
                totals.rating_attendance_count,
            ),
            avg_rating_solution: mean(totals.rating_solution_sum, totals.rating_solution_count),
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_timestamp,
            calls_per_day: self.calls_per_day.clone(),
        }
    }

    /// Per-operator metrics in first-seen order
    pub fn compute_operator_metrics(&self) -> Vec<OperatorMetrics> {
        self.order
            .iter()
            .filter_map(|operator_id| {
                self.accumulators
                    .get(operator_id)
                    .map(|accumulator| accumulator.metrics(operator_id))
            })
            .collect()
    }

    /// Rank operators from the given metrics
    pub fn compute_scores(&self, operator_metrics: &[OperatorMetrics]) -> Vec<ScoreEntry> {
        compute_scores(operator_metrics)
    }

    /// Metrics and ranking of everything folded so far
    pub fn rank(&self) -> Vec<ScoreEntry> {
        compute_scores(&self.compute_operator_metrics())
    }
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
