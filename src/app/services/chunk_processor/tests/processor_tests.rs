//! Tests for row normalization, validation and chunk bookkeeping

use super::*;
use crate::app::models::RejectionReason;
use chrono::{Datelike, TimeZone, Utc};
use std::thread;

#[test]
fn test_valid_row_is_normalized() {
    let processor = standard_processor();
    let result = processor.process_chunk(
        vec![row("15/01/2024", " Ana   Silva ", "00:08:30", "10", "4", "10")],
        0,
    );

    assert!(result.errors.is_empty());
    let record = &result.valid_rows[0];
    assert_eq!(record.operator_id, "Ana Silva");
    assert_eq!(record.duration_minutes, 8.5);
    assert_eq!(record.rating_attendance, Some(5.0));
    assert_eq!(record.rating_solution, Some(4.0));
    assert_eq!(record.pause_minutes, 10.0);
    assert_eq!(record.call_count, 1);
    assert_eq!(
        record.timestamp,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    );
}

#[test]
fn test_rejections_keep_raw_data_and_index() {
    let processor = standard_processor();
    let rows = vec![
        row("15/01/2024", "Ana Silva", "8.5", "5", "4", "10"),
        row("16/01/2024", "", "3", "4", "4", "0"),
        row("16/01/2024", "Bruno", "3", "0", "4", "0"),
        row("16/01/2024", "Carla", "-2", "4", "4", "0"),
    ];

    let result = processor.process_chunk(rows, 100);

    assert_eq!(result.valid_rows.len(), 1);
    assert_eq!(result.errors.len(), 3);
    assert_eq!(result.total(), 4);

    assert_eq!(result.errors[0].row_index, 101);
    assert_eq!(result.errors[0].reason, RejectionReason::MissingOrExcludedOperator);
    assert_eq!(result.errors[0].raw_data[0], "16/01/2024");

    assert_eq!(result.errors[1].row_index, 102);
    assert_eq!(result.errors[1].reason, RejectionReason::RatingOutOfRange);

    assert_eq!(result.errors[2].row_index, 103);
    assert_eq!(result.errors[2].reason, RejectionReason::NegativeDuration);

    let counts = result.reason_counts();
    assert_eq!(counts.len(), 3);
    assert_eq!(counts[&RejectionReason::NegativeDuration], 1);
}

#[test]
fn test_unparseable_values_default_instead_of_rejecting() {
    let processor = standard_processor();
    let result = processor.process_chunk(
        vec![row("sometime", "Ana Silva", "long", "great", "", "n/a")],
        0,
    );

    let record = &result.valid_rows[0];
    assert_eq!(record.timestamp, None);
    assert_eq!(record.duration_minutes, 0.0);
    assert_eq!(record.rating_attendance, None);
    assert_eq!(record.rating_solution, None);
    assert_eq!(record.pause_minutes, 0.0);
}

#[test]
fn test_short_row_missing_operator_is_unparseable() {
    let processor = standard_processor();
    let result = processor.process_chunk(vec![RawRow::from(vec!["15/01/2024"])], 0);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].reason, RejectionReason::UnparseableRow);
}

#[test]
fn test_truncated_row_is_unparseable_not_a_zero_minute_call() {
    let processor = standard_processor();
    let rows = vec![
        row("15/01/2024", "Bruno Costa", "30", "3", "3", "10"),
        RawRow::from(vec!["15/01/2024", "Bruno Costa"]),
        RawRow::from(vec!["15/01/2024", "Bruno Costa", "12", "4"]),
    ];

    let result = processor.process_chunk(rows, 0);

    assert_eq!(result.valid_rows.len(), 1);
    assert_eq!(result.valid_rows[0].duration_minutes, 30.0);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].row_index, 1);
    assert!(
        result
            .errors
            .iter()
            .all(|e| e.reason == RejectionReason::UnparseableRow)
    );
    assert_eq!(result.errors[1].raw_data, vec!["15/01/2024", "Bruno Costa", "12", "4"]);
}

#[test]
fn test_empty_cells_in_a_full_row_still_default() {
    let processor = standard_processor();
    let result = processor.process_chunk(vec![row("", "Ana Silva", "", "", "", "")], 0);

    assert!(result.errors.is_empty());
    assert_eq!(result.valid_rows[0].duration_minutes, 0.0);
    assert_eq!(result.valid_rows[0].rating_attendance, None);
}

#[test]
fn test_unresolved_operator_column_flags_every_row() {
    let processor = processor_for(&["date", "duration_minutes", "notes"]);
    let rows = vec![
        RawRow::from(vec!["15/01/2024", "3", "x"]),
        RawRow::from(vec!["16/01/2024", "4", "y"]),
    ];

    let result = processor.process_chunk(rows, 0);
    assert!(result.valid_rows.is_empty());
    assert!(
        result
            .errors
            .iter()
            .all(|e| e.reason == RejectionReason::UnparseableRow)
    );
}

#[test]
fn test_degraded_mode_fills_missing_columns_with_defaults() {
    let processor = processor_for(&["operator", "date"]);
    let result = processor.process_chunk(vec![RawRow::from(vec!["Ana Silva", "2024-01-15"])], 0);

    let record = &result.valid_rows[0];
    assert_eq!(record.duration_minutes, 0.0);
    assert_eq!(record.rating_attendance, None);
    assert_eq!(record.call_count, 1);
    assert_eq!(record.timestamp.map(|t| t.day()), Some(15));
}

#[test]
fn test_call_count_column() {
    let processor = processor_for(&["operator", "status"]);
    let rows = vec![
        RawRow::from(vec!["Ana", "Atendida"]),
        RawRow::from(vec!["Ana", "abandoned"]),
        RawRow::from(vec!["Ana", "3"]),
        RawRow::from(vec!["Ana"]),
    ];

    let result = processor.process_chunk(rows, 0);
    let counts: Vec<u64> = result.valid_rows.iter().map(|r| r.call_count).collect();
    assert_eq!(counts, vec![1, 0, 3, 0]);
}

#[test]
fn test_empty_chunk() {
    let result = standard_processor().process_chunk(Vec::new(), 0);
    assert!(result.is_empty());
}

#[test]
fn test_concurrent_disjoint_chunks_match_sequential() {
    let processor = standard_processor();
    let make_rows = |start: usize| -> Vec<RawRow> {
        (start..start + 500)
            .map(|i| {
                let operator = if i % 7 == 0 {
                    String::new()
                } else {
                    format!("Operator {}", i % 5)
                };
                let duration = format!("{}", i % 30);
                RawRow::new(vec![
                    "2024-01-15".to_string(),
                    operator,
                    duration,
                    "4".to_string(),
                    "5".to_string(),
                    "1".to_string(),
                ])
            })
            .collect()
    };

    let sequential_a = processor.process_chunk(make_rows(0), 0);
    let sequential_b = processor.process_chunk(make_rows(500), 500);

    let (parallel_a, parallel_b) = thread::scope(|scope| {
        let a = scope.spawn(|| processor.process_chunk(make_rows(0), 0));
        let b = scope.spawn(|| processor.process_chunk(make_rows(500), 500));
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_eq!(parallel_a, sequential_a);
    assert_eq!(parallel_b, sequential_b);
    assert_eq!(parallel_a.total() + parallel_b.total(), 1000);
    assert!(parallel_b.errors.iter().all(|e| e.row_index >= 500));
}
