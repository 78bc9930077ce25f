//! Test utilities for the streaming decoder
//!
//! Helpers for building in-memory and file-backed exports used across the
//! decoder test modules.

use rust_xlsxwriter::{Format, Workbook};
use std::io::Write;
use tempfile::NamedTempFile;

use super::IngestionSource;


/// Standard export with canonical headers
pub fn standard_csv() -> &'static str {
    "date,operator,duration_minutes,rating_attendance,rating_solution,pause_minutes\n\
     2024-01-15,Ana Silva,8.5,5,4,10\n\
     2024-01-15,Bruno Costa,12,3,3,25\n\
     2024-01-16,Ana Silva,7,4,5,5\n"
}

/// In-memory source with the given name
pub fn bytes_source(name: &str, content: &str) -> IngestionSource {
    IngestionSource::from_bytes(name, content.as_bytes().to_vec())
}

/// Temporary file with the given suffix and content
pub fn create_temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Workbook with `data_rows` call rows and one blank row after the first ten
///
/// Dates are real date cells (2024-01-15 onwards), durations are `hh:mm:ss`
/// time cells of 8m30s, attendance ratings are on the 0-10 scale.
pub fn call_workbook(data_rows: u32) -> Vec<u8> {
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let time_format = Format::new().set_num_format("hh:mm:ss");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let headers = [
        "date",
        "operator",
        "duration_minutes",
        "rating_attendance",
        "rating_solution",
        "pause_minutes",
    ];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }

    let mut sheet_row = 1;
    for i in 0..data_rows {
        if i == 10 {
            sheet_row += 1;
        }
        worksheet
            .write_number_with_format(sheet_row, 0, 45306.0 + f64::from(i % 3), &date_format)
            .unwrap();
        worksheet
            .write_string(sheet_row, 1, format!("Operator {}", i % 4))
            .unwrap();
        worksheet
            .write_number_with_format(sheet_row, 2, 510.0 / 86_400.0, &time_format)
            .unwrap();
        worksheet.write_number(sheet_row, 3, 8.0).unwrap();
        worksheet.write_number(sheet_row, 4, 4.0).unwrap();
        worksheet.write_number(sheet_row, 5, 10.0).unwrap();
        sheet_row += 1;
    }

    workbook.save_to_buffer().unwrap()
}
