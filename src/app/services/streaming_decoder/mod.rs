//! Streaming decoder for call-center exports
//!
//! Turns a source (an upload held in memory or a file on disk) into a header
//! row and then a sequence of bounded chunks of raw rows.
//!
//! ## Architecture
//!
//! - [`source`] - In-memory and file-backed sources
//! - [`format`] - Suffix and signature based format detection, delimiter sniffing
//! - [`column_mapping`] - Header analysis into semantic columns
//! - [`delimited`] - Incremental decoding of CSV/TSV text
//! - [`spreadsheet`] - Worksheet materialization and slicing
//!
//! ## Usage
//!
//! ```rust
//! use callcenter_pipeline::app::services::streaming_decoder::{
//!     detect_format, ColumnResolver, StreamingDecoder,
//! };
//! use callcenter_pipeline::{IngestionOptions, IngestionSource};
//!
//! # fn example() -> callcenter_pipeline::Result<()> {
//! let source = IngestionSource::from_bytes("calls.csv", "operator;date\nAna;2024-01-15\n");
//! let format = detect_format(&source)?;
//! let mut decoder = StreamingDecoder::open(&source, format, &IngestionOptions::default())?;
//! let resolver = ColumnResolver::from_headers(decoder.headers());
//!
//! let chunk = decoder.next_chunk(1000)?;
//! assert_eq!(chunk.len(), 1);
//! assert!(!resolver.is_complete());
//! # Ok(())
//! # }
//! ```

pub mod column_mapping;
pub mod delimited;
pub mod format;
pub mod source;
pub mod spreadsheet;

#[cfg(test)]
mod tests;

pub use column_mapping::{ColumnResolver, DetectionMode, SemanticColumn};
pub use delimited::DelimitedDecoder;
pub use format::{detect_format, sniff_delimiter};
pub use source::IngestionSource;
pub use spreadsheet::SpreadsheetDecoder;

use crate::app::models::{RawRow, SourceFormat};
use crate::config::IngestionOptions;
use crate::Result;

/// Decoder for either supported container, with the header row already read
#[derive(Debug)]
pub enum StreamingDecoder {
    Delimited {
        decoder: DelimitedDecoder,
        headers: Vec<String>,
    },
    Spreadsheet(SpreadsheetDecoder),
}

impl StreamingDecoder {
    /// Open a source in the detected format and consume its header row
    pub fn open(
        source: &IngestionSource,
        format: SourceFormat,
        options: &IngestionOptions,
    ) -> Result<Self> {
        match format {
            SourceFormat::Delimited { delimiter } => {
                let mut decoder =
                    DelimitedDecoder::open(source, delimiter, options.read_buffer_bytes)?;
                let headers = decoder.read_headers()?;
                Ok(Self::Delimited { decoder, headers })
            }
            SourceFormat::Spreadsheet => Ok(Self::Spreadsheet(SpreadsheetDecoder::open(source)?)),
        }
    }

    /// Header row, empty when the source has no rows
    pub fn headers(&self) -> &[String] {
        match self {
            Self::Delimited { headers, .. } => headers,
            Self::Spreadsheet(decoder) => decoder.headers(),
        }
    }

    /// Decode the next chunk of up to `max_rows` data rows
    ///
    /// An empty chunk signals the end of input.
    pub fn next_chunk(&mut self, max_rows: usize) -> Result<Vec<RawRow>> {
        match self {
            Self::Delimited { decoder, .. } => decoder.next_chunk(max_rows),
            Self::Spreadsheet(decoder) => Ok(decoder.next_chunk(max_rows)),
        }
    }

    /// Total data rows, when the container reveals it up front
    pub fn total_rows(&self) -> Option<usize> {
        match self {
            Self::Delimited { .. } => None,
            Self::Spreadsheet(decoder) => Some(decoder.total_rows()),
        }
    }

    /// Bytes of the source consumed so far
    pub fn bytes_read(&self) -> u64 {
        match self {
            Self::Delimited { decoder, .. } => decoder.bytes_read(),
            Self::Spreadsheet(decoder) => decoder.bytes_read(),
        }
    }
}
