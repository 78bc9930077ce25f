//! Application constants for the call-center pipeline
//!
//! This module contains configuration defaults, column vocabularies,
//! operator exclusion lists and scoring weights used throughout the crate.

// =============================================================================
// Ingestion Defaults
// =============================================================================

/// Rows decoded and validated per chunk
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Maximum rows (valid + rejected) buffered before a batch is handed off
pub const DEFAULT_ROW_CEILING: usize = 10_000;

/// Sources larger than this are delegated to the bulk-upload collaborator
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 50 * 1024 * 1024; // 50MB

/// Capacity of the worker → coordinator message channel (in messages)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Pause between chunks in the background worker (0 = plain thread yield)
pub const DEFAULT_CHUNK_PAUSE_MS: u64 = 0;

/// Internal read buffer for delimited decoding
pub const DEFAULT_READ_BUFFER_BYTES: usize = 64 * 1024;

/// Number of rejections kept for the caller-facing preview
pub const DEFAULT_REJECTION_PREVIEW_LIMIT: usize = 20;

/// Bytes inspected when sniffing the delimiter of a text source
pub const DELIMITER_SNIFF_BYTES: usize = 8 * 1024;

// =============================================================================
// Format Detection
// =============================================================================

/// File suffixes decoded with the delimited-text strategy
pub const DELIMITED_SUFFIXES: &[&str] = &["csv", "tsv", "txt"];

/// File suffixes decoded with the binary-spreadsheet strategy
pub const SPREADSHEET_SUFFIXES: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// ZIP local file header (xlsx, xlsm, ods)
pub const ZIP_SIGNATURE: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// OLE compound document header (legacy xls)
pub const OLE_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Candidate delimiters for sniffing, in tie-break order
pub const CANDIDATE_DELIMITERS: &[u8] = b",;\t|";

// =============================================================================
// Column Vocabulary
// =============================================================================

/// Canonical header names of the required semantic columns
pub mod columns {
    pub const DATE: &str = "date";
    pub const OPERATOR: &str = "operator";
    pub const DURATION_MINUTES: &str = "duration_minutes";
    pub const RATING_ATTENDANCE: &str = "rating_attendance";
    pub const RATING_SOLUTION: &str = "rating_solution";
    pub const PAUSE_MINUTES: &str = "pause_minutes";
    pub const CALL_COUNT: &str = "call_count";

    /// Columns every source is expected to provide
    pub const REQUIRED: &[&str] = &[
        DATE,
        OPERATOR,
        DURATION_MINUTES,
        RATING_ATTENDANCE,
        RATING_SOLUTION,
        PAUSE_MINUTES,
    ];
}

/// Substring heuristics for vendor exports with free-form headers
///
/// Each entry is a list of alternatives; an alternative matches when every one
/// of its fragments occurs in the accent-folded, lowercased header.
pub mod vendor_patterns {
    pub const DATE: &[&[&str]] = &[&["data"], &["date"], &["inicio"]];
    pub const OPERATOR: &[&[&str]] = &[
        &["operador"],
        &["atendente"],
        &["agente"],
        &["operator"],
        &["agent"],
    ];
    pub const DURATION_MINUTES: &[&[&str]] = &[
        &["duracao"],
        &["tempo", "atendimento"],
        &["tempo", "falado"],
        &["talk", "time"],
        &["duration"],
    ];
    pub const RATING_ATTENDANCE: &[&[&str]] = &[
        &["nota", "atendimento"],
        &["avaliacao", "atendimento"],
        &["pergunta", "1"],
        &["rating", "attendance"],
        &["attendance"],
    ];
    pub const RATING_SOLUTION: &[&[&str]] = &[
        &["nota", "solucao"],
        &["avaliacao", "solucao"],
        &["pergunta", "2"],
        &["rating", "solution"],
        &["resolution"],
        &["solution"],
    ];
    pub const PAUSE_MINUTES: &[&[&str]] = &[&["pausa"], &["pause"], &["break"]];
    pub const CALL_COUNT: &[&[&str]] = &[
        &["chamadas"],
        &["ligacoes"],
        &["calls"],
        &["status"],
        &["situacao"],
    ];
}

// =============================================================================
// Field Normalization
// =============================================================================

/// Status tokens that count as one answered call
pub const ANSWERED_STATUS_TOKENS: &[&str] = &["answered", "atendida", "atendido", "completed"];

/// Ratings above this value are read as a 0–10 scale and halved
pub const RATING_SCALE_FIVE_MAX: f64 = 5.0;

/// Upper bound of the accepted raw rating scale
pub const RATING_SCALE_TEN_MAX: f64 = 10.0;

/// Accepted range of a normalized rating
pub const RATING_MIN: f64 = 1.0;
pub const RATING_MAX: f64 = 5.0;

// =============================================================================
// Operator Exclusion
// =============================================================================

/// Operator values treated as "no operator" (compared case-insensitively)
pub const EXCLUDED_OPERATOR_SENTINELS: &[&str] = &[
    "-",
    "--",
    "n/a",
    "na",
    "null",
    "none",
    "undefined",
    "agent unavailable",
    "agente indisponivel",
    "agente indisponível",
    "sem agente",
    "nao atribuido",
    "não atribuído",
];

/// Prefixes identifying disconnected or placeholder operators
pub const EXCLUDED_OPERATOR_PREFIXES: &[&str] = &["desconectado", "disconnected"];

// =============================================================================
// Scoring
// =============================================================================

/// Weights of the operator ranking score
pub mod score_weights {
    pub const CALL_VOLUME: f64 = 0.35;
    pub const AVG_DURATION: f64 = 0.20;
    pub const RATING_ATTENDANCE: f64 = 0.20;
    pub const RATING_SOLUTION: f64 = 0.20;
    pub const AVG_PAUSE: f64 = 0.05;
}

/// Decimal places used when displaying scores
pub const SCORE_DISPLAY_DECIMALS: u32 = 3;

/// Decimal places used when displaying averages
pub const AVERAGE_DISPLAY_DECIMALS: u32 = 2;

// =============================================================================
// Configuration
// =============================================================================

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "callcenter-pipeline";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "CALLCENTER_";
