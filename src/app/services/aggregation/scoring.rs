//! Weighted operator ranking
//!
//! Each of the five inputs is normalized against its maximum over the
//! dataset, so every normalized value lies in [0, 1]. When a maximum is zero
//! the whole metric normalizes to zero.

use serde::Serialize;

use super::accumulator::OperatorMetrics;
use crate::constants::{AVERAGE_DISPLAY_DECIMALS, SCORE_DISPLAY_DECIMALS, score_weights};

/// Normalized inputs behind a score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NormalizedInputs {
    pub call_volume: f64,
    pub avg_duration: f64,
    pub rating_attendance: f64,
    pub rating_solution: f64,
    pub avg_pause: f64,
}

impl NormalizedInputs {
    /// Weighted score; shorter calls and fewer pauses score higher
    pub fn score(&self) -> f64 {
        score_weights::CALL_VOLUME * self.call_volume
            + score_weights::AVG_DURATION * (1.0 - self.avg_duration)
            + score_weights::RATING_ATTENDANCE * self.rating_attendance
            + score_weights::RATING_SOLUTION * self.rating_solution
            - score_weights::AVG_PAUSE * self.avg_pause
    }
}

/// One operator's place in the ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub operator_id: String,
    /// Full-precision score
    pub score: f64,
    pub normalized: NormalizedInputs,
    pub metrics: OperatorMetrics,
}

impl ScoreEntry {
    /// Score rounded for display
    pub fn display_score(&self) -> f64 {
        round_to(self.score, SCORE_DISPLAY_DECIMALS)
    }
}

/// Rank operators by weighted score, highest first
///
/// Ties keep the input order, which is operator first-seen order when the
/// metrics come from the aggregation engine.
pub fn compute_scores(operator_metrics: &[OperatorMetrics]) -> Vec<ScoreEntry> {
    let max_calls = dataset_max(operator_metrics, |m| m.total_calls as f64);
    let max_duration = dataset_max(operator_metrics, |m| m.avg_duration_minutes);
    let max_attendance = dataset_max(operator_metrics, rating_attendance);
    let max_solution = dataset_max(operator_metrics, rating_solution);
    let max_pause = dataset_max(operator_metrics, |m| m.avg_pause_minutes);

    let mut entries: Vec<ScoreEntry> = operator_metrics
        .iter()
        .map(|metrics| {
            let normalized = NormalizedInputs {
                call_volume: normalize(metrics.total_calls as f64, max_calls),
                avg_duration: normalize(metrics.avg_duration_minutes, max_duration),
                rating_attendance: normalize(rating_attendance(metrics), max_attendance),
                rating_solution: normalize(rating_solution(metrics), max_solution),
                avg_pause: normalize(metrics.avg_pause_minutes, max_pause),
            };
            ScoreEntry {
                operator_id: metrics.operator_id.clone(),
                score: normalized.score(),
                normalized,
                metrics: metrics.clone(),
            }
        })
        .collect();

    // Stable sort keeps ties in input order
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries
}

/// Round a value to a number of decimal places for display
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Round an average for display
pub fn round_average(value: f64) -> f64 {
    round_to(value, AVERAGE_DISPLAY_DECIMALS)
}

fn rating_attendance(metrics: &OperatorMetrics) -> f64 {
    metrics.avg_rating_attendance.unwrap_or(0.0)
}

fn rating_solution(metrics: &OperatorMetrics) -> f64 {
    metrics.avg_rating_solution.unwrap_or(0.0)
}

fn dataset_max<F>(metrics: &[OperatorMetrics], value: F) -> f64
where
    F: Fn(&OperatorMetrics) -> f64,
{
    metrics.iter().map(value).fold(0.0, f64::max)
}

fn normalize(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
