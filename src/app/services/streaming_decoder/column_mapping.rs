//! Column mapping from source headers to semantic columns
//!
//! This module analyzes the header row once per run and resolves each
//! semantic column to a source index. Exact (case-insensitive) canonical
//! names are tried first; columns still unresolved fall back to vendor
//! substring heuristics over accent-folded headers.

use crate::app::models::RawRow;
use crate::constants::{columns, vendor_patterns};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Semantic columns the pipeline understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticColumn {
    Date,
    Operator,
    DurationMinutes,
    RatingAttendance,
    RatingSolution,
    PauseMinutes,
    CallCount,
}

impl SemanticColumn {
    /// Columns every source is expected to provide
    pub const REQUIRED: [SemanticColumn; 6] = [
        SemanticColumn::Date,
        SemanticColumn::Operator,
        SemanticColumn::DurationMinutes,
        SemanticColumn::RatingAttendance,
        SemanticColumn::RatingSolution,
        SemanticColumn::PauseMinutes,
    ];

    /// All columns in resolution order
    pub const ALL: [SemanticColumn; 7] = [
        SemanticColumn::Date,
        SemanticColumn::Operator,
        SemanticColumn::DurationMinutes,
        SemanticColumn::RatingAttendance,
        SemanticColumn::RatingSolution,
        SemanticColumn::PauseMinutes,
        SemanticColumn::CallCount,
    ];

    /// Canonical header name
    pub fn canonical_name(&self) -> &'static str {
        match self {
            SemanticColumn::Date => columns::DATE,
            SemanticColumn::Operator => columns::OPERATOR,
            SemanticColumn::DurationMinutes => columns::DURATION_MINUTES,
            SemanticColumn::RatingAttendance => columns::RATING_ATTENDANCE,
            SemanticColumn::RatingSolution => columns::RATING_SOLUTION,
            SemanticColumn::PauseMinutes => columns::PAUSE_MINUTES,
            SemanticColumn::CallCount => columns::CALL_COUNT,
        }
    }

    fn vendor_patterns(&self) -> &'static [&'static [&'static str]] {
        match self {
            SemanticColumn::Date => vendor_patterns::DATE,
            SemanticColumn::Operator => vendor_patterns::OPERATOR,
            SemanticColumn::DurationMinutes => vendor_patterns::DURATION_MINUTES,
            SemanticColumn::RatingAttendance => vendor_patterns::RATING_ATTENDANCE,
            SemanticColumn::RatingSolution => vendor_patterns::RATING_SOLUTION,
            SemanticColumn::PauseMinutes => vendor_patterns::PAUSE_MINUTES,
            SemanticColumn::CallCount => vendor_patterns::CALL_COUNT,
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for SemanticColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// How the header row was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Every resolved column matched its canonical name
    Standard,
    /// At least one column was inferred from vendor heuristics
    Vendor,
}

/// Typed resolver from semantic columns to source indices
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    /// Semantic column to source index
    indices: HashMap<SemanticColumn, usize>,

    /// Header names as found in the source
    headers: Vec<String>,

    /// Required columns that could not be resolved
    missing_required: Vec<SemanticColumn>,

    mode: DetectionMode,
}

impl ColumnResolver {
    /// Analyze a header row
    pub fn from_headers(headers: &[String]) -> Self {
        let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();
        let mut indices = HashMap::new();
        let mut claimed = vec![false; headers.len()];

        // Pass 1: canonical names
        for column in SemanticColumn::ALL {
            let canonical = column.canonical_name();
            if let Some(index) = folded
                .iter()
                .position(|header| header.replace([' ', '-'], "_") == canonical)
            {
                if !claimed[index] {
                    indices.insert(column, index);
                    claimed[index] = true;
                }
            }
        }

        // Pass 2: vendor heuristics for whatever is left
        let mut mode = DetectionMode::Standard;
        for column in SemanticColumn::ALL {
            if indices.contains_key(&column) {
                continue;
            }
            if let Some(index) = find_vendor_match(column, &folded, &claimed) {
                debug!(
                    "Inferred column '{}' from vendor header '{}'",
                    column, headers[index]
                );
                indices.insert(column, index);
                claimed[index] = true;
                mode = DetectionMode::Vendor;
            }
        }

        let missing_required: Vec<SemanticColumn> = SemanticColumn::REQUIRED
            .into_iter()
            .filter(|column| !indices.contains_key(column))
            .collect();

        if !missing_required.is_empty() {
            warn!(
                "Header row is missing required columns: {}",
                missing_required
                    .iter()
                    .map(|c| c.canonical_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Self {
            indices,
            headers: headers.to_vec(),
            missing_required,
            mode,
        }
    }

    /// Source index of a semantic column
    pub fn index_of(&self, column: SemanticColumn) -> Option<usize> {
        self.indices.get(&column).copied()
    }

    /// Check if a column was resolved
    pub fn has_column(&self, column: SemanticColumn) -> bool {
        self.indices.contains_key(&column)
    }

    /// Trimmed value of a semantic column in a row
    ///
    /// `None` when the column is unresolved or the row is too short.
    pub fn get<'a>(&self, row: &'a RawRow, column: SemanticColumn) -> Option<&'a str> {
        self.index_of(column)
            .and_then(|index| row.get(index))
            .map(str::trim)
    }

    /// Required columns that could not be resolved
    pub fn missing_required(&self) -> &[SemanticColumn] {
        &self.missing_required
    }

    /// Whether every required column was resolved
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

fn find_vendor_match(column: SemanticColumn, folded: &[String], claimed: &[bool]) -> Option<usize> {
    // Alternatives are ordered by specificity; the first one matching any
    // unclaimed header wins
    column.vendor_patterns().iter().find_map(|fragments| {
        folded.iter().enumerate().find_map(|(index, header)| {
            let matches = !claimed[index]
                && fragments.iter().all(|fragment| header.contains(fragment));
            matches.then_some(index)
        })
    })
}

/// Lowercase, trim, strip a byte-order mark and fold common accents
pub fn fold_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
