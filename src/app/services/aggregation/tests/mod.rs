//! Test utilities for aggregation and scoring

use chrono::{TimeZone, Utc};

use crate::app::models::Record;


/// Record with the given operator and measures, dated 2024-01-15 UTC
pub fn record(
    operator: &str,
    duration: f64,
    attendance: Option<f64>,
    solution: Option<f64>,
    pause: f64,
) -> Record {
    Record {
        timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()),
        operator_id: operator.to_string(),
        duration_minutes: duration,
        rating_attendance: attendance,
        rating_solution: solution,
        pause_minutes: pause,
        call_count: 1,
    }
}
