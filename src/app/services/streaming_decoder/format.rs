//! Source format detection by suffix and signature
//!
//! Picks the decoding strategy for a source and, for delimited text, sniffs
//! the delimiter from the header line.

use super::source::IngestionSource;
use crate::app::models::SourceFormat;
use crate::constants::{
    CANDIDATE_DELIMITERS, DELIMITED_SUFFIXES, DELIMITER_SNIFF_BYTES, OLE_SIGNATURE,
    SPREADSHEET_SUFFIXES, ZIP_SIGNATURE,
};
use crate::{Error, Result};
use tracing::debug;

/// Detect the format of a source, failing with `UnsupportedFormat` when
/// neither the suffix nor the leading bytes are recognized
pub fn detect_format(source: &IngestionSource) -> Result<SourceFormat> {
    let prefix = source.read_prefix(DELIMITER_SNIFF_BYTES)?;
    let suffix = source.suffix();

    let format = match suffix.as_deref() {
        Some(ext) if SPREADSHEET_SUFFIXES.contains(&ext) => SourceFormat::Spreadsheet,
        Some("tsv") => SourceFormat::Delimited { delimiter: b'\t' },
        Some(ext) if DELIMITED_SUFFIXES.contains(&ext) => SourceFormat::Delimited {
            delimiter: sniff_delimiter(&prefix),
        },
        _ if has_spreadsheet_signature(&prefix) => SourceFormat::Spreadsheet,
        _ => {
            return Err(Error::unsupported_format(
                source.name(),
                match &suffix {
                    Some(ext) => format!("unrecognized suffix '.{}'", ext),
                    None => "no file suffix and no spreadsheet signature".to_string(),
                },
            ));
        }
    };

    debug!("Detected {} format for {}", format, source.name());
    Ok(format)
}

/// Whether the bytes start with a ZIP or OLE container header
pub fn has_spreadsheet_signature(prefix: &[u8]) -> bool {
    prefix.starts_with(ZIP_SIGNATURE) || prefix.starts_with(OLE_SIGNATURE)
}

/// Pick the candidate delimiter occurring most often in the first line,
/// ignoring quoted sections; defaults to a comma
pub fn sniff_delimiter(prefix: &[u8]) -> u8 {
    let mut counts = [0usize; 256];
    let mut in_quotes = false;

    for &byte in prefix {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b'\n' | b'\r' if !in_quotes => break,
            _ if !in_quotes => counts[byte as usize] += 1,
            _ => {}
        }
    }

    // Earlier candidates win ties
    let mut best = b',';
    let mut best_count = 0;
    for &candidate in CANDIDATE_DELIMITERS {
        if counts[candidate as usize] > best_count {
            best = candidate;
            best_count = counts[candidate as usize];
        }
    }
    best
}
