//! Decoder for spreadsheet binaries (xlsx, xlsm, xlsb, xls, ods)
//!
//! Spreadsheet containers cannot be read row by row, so the first worksheet
//! is materialized once and then handed out in bounded slices. The total row
//! count is therefore known before the first chunk.

use super::source::IngestionSource;
use crate::app::models::RawRow;
use crate::{Error, Result};
use calamine::{Data, ExcelDateTime, Range, Reader, open_workbook_auto_from_rs};
use chrono::Duration;
use std::io::Cursor;
use tracing::debug;

/// Slicing decoder over the first worksheet of a workbook
pub struct SpreadsheetDecoder {
    range: Range<Data>,
    headers: Vec<String>,
    /// Index into `range` rows of the next row to decode
    cursor: usize,
    total_rows: usize,
    total_bytes: u64,
    delivered: usize,
}

impl SpreadsheetDecoder {
    /// Open a workbook and materialize its first worksheet
    pub fn open(source: &IngestionSource) -> Result<Self> {
        let bytes = source.read_all()?;
        let total_bytes = bytes.len() as u64;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
            Error::malformed_container_with_source(source.name(), "failed to open workbook", e)
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::malformed_container(source.name(), "workbook has no worksheets"))?
            .map_err(|e| {
                Error::malformed_container_with_source(source.name(), "failed to read first worksheet", e)
            })?;

        let mut header_row = None;
        for (index, cells) in range.rows().enumerate() {
            let row = to_raw_row(cells);
            if !row.is_blank() {
                header_row = Some((index, row));
                break;
            }
        }

        let (headers, cursor) = match header_row {
            Some((index, row)) => (row.fields, index + 1),
            None => (Vec::new(), range.height()),
        };

        let total_rows = range
            .rows()
            .skip(cursor)
            .filter(|cells| !to_raw_row(cells).is_blank())
            .count();

        debug!(
            "Materialized worksheet of {} with {} data rows",
            source.name(),
            total_rows
        );

        Ok(Self {
            range,
            headers,
            cursor,
            total_rows,
            total_bytes,
            delivered: 0,
        })
    }

    /// Header row of the worksheet
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Non-blank data rows in the worksheet
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Next slice of up to `max_rows` non-blank data rows
    pub fn next_chunk(&mut self, max_rows: usize) -> Vec<RawRow> {
        let mut rows = Vec::with_capacity(max_rows.min(self.total_rows - self.delivered));
        for cells in self.range.rows().skip(self.cursor) {
            if rows.len() >= max_rows {
                break;
            }
            self.cursor += 1;
            let row = to_raw_row(cells);
            if !row.is_blank() {
                rows.push(row);
            }
        }
        self.delivered += rows.len();
        rows
    }

    /// Bytes consumed, proportional to the rows delivered
    pub fn bytes_read(&self) -> u64 {
        if self.total_rows == 0 {
            return self.total_bytes;
        }
        (self.total_bytes as f64 * self.delivered as f64 / self.total_rows as f64) as u64
    }
}

impl std::fmt::Debug for SpreadsheetDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadsheetDecoder")
            .field("headers", &self.headers)
            .field("total_rows", &self.total_rows)
            .field("delivered", &self.delivered)
            .finish()
    }
}

fn to_raw_row(cells: &[Data]) -> RawRow {
    RawRow::new(cells.iter().map(cell_to_string).collect())
}

/// Render a cell the way it would appear in a delimited export
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(value) => value.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => format_float(*value),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => format_date_time(value),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Format a date/time cell
///
/// Duration cells and pure times (serial below one day, negatives included)
/// become `[-]H:MM:SS`; other cells become `YYYY-MM-DD HH:MM:SS` in the
/// workbook's own date system.
pub fn format_date_time(value: &ExcelDateTime) -> String {
    if value.is_duration() || value.as_f64() < 1.0 {
        return match value.as_duration() {
            Some(duration) => format_duration(duration),
            None => format_float(value.as_f64()),
        };
    }

    match value.as_datetime() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format_float(value.as_f64()),
    }
}

/// `H:MM:SS` rounded to the second, with a leading `-` for negative spans
fn format_duration(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    let total_seconds = (millis.unsigned_abs() + 500) / 1000;
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}
