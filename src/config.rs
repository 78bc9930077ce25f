//! Configuration management and validation.
//!
//! Provides the ingestion options that bound memory use (chunk size, row
//! ceiling, source size ceiling) and the layered loader used by the CLI:
//! defaults, then a TOML file, then `CALLCENTER_*` environment variables.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_CHUNK_PAUSE_MS, DEFAULT_MAX_SOURCE_BYTES, DEFAULT_READ_BUFFER_BYTES,
    DEFAULT_REJECTION_PREVIEW_LIMIT, DEFAULT_ROW_CEILING, ENV_PREFIX,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Options controlling a single ingestion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionOptions {
    /// Rows decoded and validated per chunk
    pub batch_size: usize,

    /// Rows buffered in the coordinator before a batch is handed off
    pub row_ceiling: usize,

    /// Sources above this size are rejected with `SourceTooLarge`
    pub max_source_bytes: u64,

    /// Worker → coordinator channel capacity in messages
    pub channel_capacity: usize,

    /// Pause between chunks in the worker, in milliseconds (0 = yield only)
    pub chunk_pause_ms: u64,

    /// Internal buffer of the delimited decoder
    pub read_buffer_bytes: usize,

    /// Rejections kept in the run summary preview
    pub rejection_preview_limit: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            row_ceiling: DEFAULT_ROW_CEILING,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            chunk_pause_ms: DEFAULT_CHUNK_PAUSE_MS,
            read_buffer_bytes: DEFAULT_READ_BUFFER_BYTES,
            rejection_preview_limit: DEFAULT_REJECTION_PREVIEW_LIMIT,
        }
    }
}

impl IngestionOptions {
    /// Set rows per chunk
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the in-memory row ceiling
    pub fn with_row_ceiling(mut self, row_ceiling: usize) -> Self {
        self.row_ceiling = row_ceiling;
        self
    }

    /// Set the source size ceiling
    pub fn with_max_source_bytes(mut self, max_source_bytes: u64) -> Self {
        self.max_source_bytes = max_source_bytes;
        self
    }

    /// Set the worker channel capacity
    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Set the pause between worker chunks
    pub fn with_chunk_pause(mut self, pause: Duration) -> Self {
        self.chunk_pause_ms = pause.as_millis() as u64;
        self
    }

    /// Set the number of rejections kept for preview
    pub fn with_rejection_preview_limit(mut self, limit: usize) -> Self {
        self.rejection_preview_limit = limit;
        self
    }

    /// Pause between worker chunks
    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }

    /// Validate option ranges
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::configuration("batch_size must be greater than 0"));
        }
        if self.row_ceiling == 0 {
            return Err(Error::configuration("row_ceiling must be greater than 0"));
        }
        if self.row_ceiling < self.batch_size {
            return Err(Error::configuration(format!(
                "row_ceiling ({}) must be at least batch_size ({})",
                self.row_ceiling, self.batch_size
            )));
        }
        if self.max_source_bytes == 0 {
            return Err(Error::configuration(
                "max_source_bytes must be greater than 0",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(Error::configuration(
                "channel_capacity must be greater than 0",
            ));
        }
        if self.read_buffer_bytes == 0 {
            return Err(Error::configuration(
                "read_buffer_bytes must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Report settings for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Operators listed in the ranking table (0 = all)
    pub top_operators: usize,

    /// Rejections printed in the summary
    pub rejection_preview: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_operators: 20,
            rejection_preview: 10,
        }
    }
}

/// Global configuration for the pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ingestion: IngestionOptions,
    pub report: ReportConfig,
}

impl PipelineConfig {
    /// Default config file location (`<config dir>/callcenter-pipeline/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read config file {}", path.display()),
                e,
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Load with layered approach (defaults -> file -> environment)
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => match Self::default_config_path() {
                Ok(path) if path.is_file() => {
                    debug!("Loading configuration from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CALLCENTER_*` overrides from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read_usize = |name: &str| -> Result<Option<usize>> {
            let key = format!("{}{}", ENV_PREFIX, name);
            match lookup(&key) {
                Some(value) => value.trim().parse::<usize>().map(Some).map_err(|_| {
                    Error::configuration(format!("{} must be a non-negative integer", key))
                }),
                None => Ok(None),
            }
        };

        if let Some(value) = read_usize("BATCH_SIZE")? {
            self.ingestion.batch_size = value;
        }
        if let Some(value) = read_usize("ROW_CEILING")? {
            self.ingestion.row_ceiling = value;
        }
        if let Some(value) = read_usize("MAX_SOURCE_BYTES")? {
            self.ingestion.max_source_bytes = value as u64;
        }
        if let Some(value) = read_usize("CHUNK_PAUSE_MS")? {
            self.ingestion.chunk_pause_ms = value as u64;
        }
        if let Some(value) = read_usize("TOP_OPERATORS")? {
            self.report.top_operators = value;
        }

        Ok(())
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.ingestion.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_options_are_valid() {
        let options = IngestionOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.max_source_bytes, 50 * 1024 * 1024);
        assert_eq!(options.chunk_pause(), Duration::ZERO);
    }

    #[test]
    fn test_builder_overrides() {
        let options = IngestionOptions::default()
            .with_batch_size(10)
            .with_row_ceiling(25)
            .with_max_source_bytes(1024)
            .with_chunk_pause(Duration::from_millis(5));

        assert_eq!(options.batch_size, 10);
        assert_eq!(options.row_ceiling, 25);
        assert_eq!(options.max_source_bytes, 1024);
        assert_eq!(options.chunk_pause_ms, 5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(IngestionOptions::default().with_batch_size(0).validate().is_err());
        assert!(
            IngestionOptions::default()
                .with_batch_size(100)
                .with_row_ceiling(50)
                .validate()
                .is_err()
        );
        assert!(
            IngestionOptions::default()
                .with_channel_capacity(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
[ingestion]
batch_size = 250

[report]
top_operators = 5
"#,
        )
        .unwrap();

        assert_eq!(config.ingestion.batch_size, 250);
        assert_eq!(config.ingestion.row_ceiling, DEFAULT_ROW_CEILING);
        assert_eq!(config.report.top_operators, 5);
        assert_eq!(config.report.rejection_preview, 10);
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let result = PipelineConfig::from_toml_str("ingestion = 3");
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_load_layered_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[ingestion]\nrow_ceiling = 5000").unwrap();

        let config = PipelineConfig::load_layered(Some(file.path())).unwrap();
        assert_eq!(config.ingestion.row_ceiling, 5000);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CALLCENTER_BATCH_SIZE", "200"),
            ("CALLCENTER_MAX_SOURCE_BYTES", "1048576"),
        ]
        .into_iter()
        .collect();

        let mut config = PipelineConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.ingestion.batch_size, 200);
        assert_eq!(config.ingestion.max_source_bytes, 1_048_576);
        assert_eq!(config.ingestion.row_ceiling, DEFAULT_ROW_CEILING);
    }

    #[test]
    fn test_env_override_must_be_numeric() {
        let mut config = PipelineConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "CALLCENTER_ROW_CEILING").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
