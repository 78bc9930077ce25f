//! Incremental decoder for delimited text exports
//!
//! Reads records one at a time through a bounded internal buffer, so memory
//! use depends on the chunk size rather than the file size. Quoted fields may
//! contain delimiters and line breaks.

use super::source::IngestionSource;
use crate::app::models::RawRow;
use crate::{Error, Result};
use csv::{ByteRecord, Reader, ReaderBuilder};
use std::io::Read;
use tracing::debug;

/// Row-by-row decoder over a delimited source
pub struct DelimitedDecoder {
    source_name: String,
    reader: Reader<Box<dyn Read + Send>>,
    record: ByteRecord,
    exhausted: bool,
}

impl DelimitedDecoder {
    /// Open a source for decoding with the given delimiter
    pub fn open(source: &IngestionSource, delimiter: u8, buffer_bytes: usize) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .buffer_capacity(buffer_bytes.max(1024))
            .from_reader(source.open()?);

        Ok(Self {
            source_name: source.name().to_string(),
            reader,
            record: ByteRecord::new(),
            exhausted: false,
        })
    }

    /// Read the header row: the first non-blank record
    ///
    /// Returns an empty list when the source holds no records at all.
    pub fn read_headers(&mut self) -> Result<Vec<String>> {
        while let Some(row) = self.read_row()? {
            if row.is_blank() {
                continue;
            }
            let mut headers = row.fields;
            if let Some(first) = headers.first_mut() {
                if let Some(stripped) = first.strip_prefix('\u{feff}') {
                    *first = stripped.to_string();
                }
            }
            debug!("Read {} header columns from {}", headers.len(), self.source_name);
            return Ok(headers);
        }
        Ok(Vec::new())
    }

    /// Decode up to `max_rows` non-blank data rows
    ///
    /// An empty result means the input is exhausted.
    pub fn next_chunk(&mut self, max_rows: usize) -> Result<Vec<RawRow>> {
        let mut rows = Vec::with_capacity(max_rows.min(4096));
        while rows.len() < max_rows {
            match self.read_row()? {
                Some(row) if row.is_blank() => continue,
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Byte offset reached in the source
    pub fn bytes_read(&self) -> u64 {
        self.reader.position().byte()
    }

    fn read_row(&mut self) -> Result<Option<RawRow>> {
        if self.exhausted {
            return Ok(None);
        }

        let has_record = self.reader.read_byte_record(&mut self.record).map_err(|e| {
            Error::malformed_container_with_source(
                &self.source_name,
                format!("delimited decoding failed near byte {}", self.reader.position().byte()),
                e,
            )
        })?;

        if !has_record {
            self.exhausted = true;
            return Ok(None);
        }

        // Invalid UTF-8 is replaced rather than failing the whole run
        let fields = self
            .record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        Ok(Some(RawRow::new(fields)))
    }
}

impl std::fmt::Debug for DelimitedDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimitedDecoder")
            .field("source_name", &self.source_name)
            .field("bytes_read", &self.bytes_read())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
