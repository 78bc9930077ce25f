//! Running per-operator sums and the metrics projected from them

use serde::Serialize;

use crate::app::models::Record;

/// Running sums for one operator, monotonic until the engine is reset
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperatorAccumulator {
    pub records: u64,
    pub call_count: u64,
    pub total_duration: f64,
    pub total_pause: f64,
    pub rating_attendance_sum: f64,
    pub rating_attendance_count: u64,
    pub rating_solution_sum: f64,
    pub rating_solution_count: u64,
}

impl OperatorAccumulator {
    /// Add one record's contribution
    pub fn add(&mut self, record: &Record) {
        self.records += 1;
        self.call_count += record.call_count;
        self.total_duration += record.duration_minutes;
        self.total_pause += record.pause_minutes;

        if let Some(rating) = record.rating_attendance {
            self.rating_attendance_sum += rating;
            self.rating_attendance_count += 1;
        }
        if let Some(rating) = record.rating_solution {
            self.rating_solution_sum += rating;
            self.rating_solution_count += 1;
        }
    }

    /// Add another accumulator's sums
    pub fn merge(&mut self, other: &OperatorAccumulator) {
        self.records += other.records;
        self.call_count += other.call_count;
        self.total_duration += other.total_duration;
        self.total_pause += other.total_pause;
        self.rating_attendance_sum += other.rating_attendance_sum;
        self.rating_attendance_count += other.rating_attendance_count;
        self.rating_solution_sum += other.rating_solution_sum;
        self.rating_solution_count += other.rating_solution_count;
    }

    /// Project the accumulated sums into metrics for `operator_id`
    pub fn metrics(&self, operator_id: &str) -> OperatorMetrics {
        OperatorMetrics {
            operator_id: operator_id.to_string(),
            records: self.records,
            total_calls: self.call_count,
            total_duration_minutes: self.total_duration,
            avg_duration_minutes: per_record(self.total_duration, self.records),
            total_pause_minutes: self.total_pause,
            avg_pause_minutes: per_record(self.total_pause, self.records),
            avg_rating_attendance: mean(self.rating_attendance_sum, self.rating_attendance_count),
            avg_rating_solution: mean(self.rating_solution_sum, self.rating_solution_count),
        }
    }
}

/// Aggregated metrics for one operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorMetrics {
    pub operator_id: String,

    /// Records attributed to the operator
    pub records: u64,

    /// Sum of the call counts of those records
    pub total_calls: u64,

    pub total_duration_minutes: f64,

    /// Mean talk time per record
    pub avg_duration_minutes: f64,

    pub total_pause_minutes: f64,

    /// Mean pause per record
    pub avg_pause_minutes: f64,

    /// Mean over records that carried the rating; `None` if none did
    pub avg_rating_attendance: Option<f64>,

    pub avg_rating_solution: Option<f64>,
}

pub(crate) fn per_record(total: f64, records: u64) -> f64 {
    if records == 0 {
        0.0
    } else {
        total / records as f64
    }
}

pub(crate) fn mean(sum: f64, count: u64) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(duration: f64, pause: f64, attendance: Option<f64>, calls: u64) -> Record {
        Record {
            timestamp: None,
            operator_id: "Ana Silva".to_string(),
            duration_minutes: duration,
            rating_attendance: attendance,
            rating_solution: None,
            pause_minutes: pause,
            call_count: calls,
        }
    }

    #[test]
    fn test_averages_divide_by_records() {
        let mut acc = OperatorAccumulator::default();
        acc.add(&record(10.0, 2.0, Some(5.0), 1));
        acc.add(&record(20.0, 4.0, None, 3));

        let metrics = acc.metrics("Ana Silva");
        assert_eq!(metrics.records, 2);
        assert_eq!(metrics.total_calls, 4);
        assert_eq!(metrics.avg_duration_minutes, 15.0);
        assert_eq!(metrics.avg_pause_minutes, 3.0);
        // Only records carrying a rating count toward its mean
        assert_eq!(metrics.avg_rating_attendance, Some(5.0));
        assert_eq!(metrics.avg_rating_solution, None);
    }

    #[test]
    fn test_merge_matches_sequential_adds() {
        let mut sequential = OperatorAccumulator::default();
        let mut left = OperatorAccumulator::default();
        let mut right = OperatorAccumulator::default();
        for (i, r) in [
            record(4.0, 1.0, Some(3.0), 1),
            record(6.0, 0.0, None, 2),
            record(8.0, 3.0, Some(5.0), 1),
        ]
        .iter()
        .enumerate()
        {
            sequential.add(r);
            if i == 0 {
                left.add(r);
            } else {
                right.add(r);
            }
        }

        left.merge(&right);
        assert_eq!(left, sequential);
    }

    #[test]
    fn test_empty_accumulator() {
        let metrics = OperatorAccumulator::default().metrics("nobody");
        assert_eq!(metrics.avg_duration_minutes, 0.0);
        assert_eq!(metrics.avg_rating_attendance, None);
    }
}
