//! Test utilities for ingestion runs
//!
//! Generates synthetic exports and collects coordinator events for the
//! ingestion test modules.

use crate::app::services::ingestion::{IngestionCoordinator, IngestionEvent};
use crate::config::IngestionOptions;
use rust_xlsxwriter::{Format, Workbook};


/// Canonical header row
pub const HEADER: &str =
    "date,operator,duration_minutes,rating_attendance,rating_solution,pause_minutes";

/// Delimited export with `rows` data rows
///
/// When `reject_every` is non-zero, every row whose index is a multiple of it
/// has an empty operator and is rejected.
pub fn generate_csv(rows: usize, reject_every: usize) -> String {
    let mut content = String::with_capacity(rows * 48 + HEADER.len() + 1);
    content.push_str(HEADER);
    content.push('\n');

    for i in 0..rows {
        let operator = if reject_every > 0 && i % reject_every == 0 {
            String::new()
        } else {
            format!("Operator {}", i % 4)
        };
        content.push_str(&format!(
            "2024-01-{:02},{},{},{},{},{}\n",
            i % 28 + 1,
            operator,
            i % 20,
            1 + i % 5,
            1 + (i + 2) % 5,
            i % 7
        ));
    }
    content
}

/// Spreadsheet export with `rows` data rows, all valid
///
/// Durations are `hh:mm:ss` cells of 8m30s and attendance ratings use the
/// 0-10 scale (8, read as 4.0).
pub fn generate_workbook(rows: u32) -> Vec<u8> {
    let time_format = Format::new().set_num_format("hh:mm:ss");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in HEADER.split(',').enumerate() {
        worksheet.write_string(0, col as u16, header).unwrap();
    }
    for row in 1..=rows {
        worksheet.write_string(row, 0, "2024-01-15").unwrap();
        worksheet
            .write_string(row, 1, format!("Operator {}", row % 4))
            .unwrap();
        worksheet
            .write_number_with_format(row, 2, 510.0 / 86_400.0, &time_format)
            .unwrap();
        worksheet.write_number(row, 3, 8).unwrap();
        worksheet.write_number(row, 4, 4).unwrap();
        worksheet.write_number(row, 5, 2).unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

/// Small chunks and ceiling so a few hundred rows span many batches
pub fn small_options() -> IngestionOptions {
    IngestionOptions::default()
        .with_batch_size(20)
        .with_row_ceiling(50)
}

/// Drain every event of a started run
pub async fn collect_events(coordinator: &mut IngestionCoordinator) -> Vec<IngestionEvent> {
    let mut events = Vec::new();
    while let Some(event) = coordinator.next_event().await {
        events.push(event);
    }
    events
}
