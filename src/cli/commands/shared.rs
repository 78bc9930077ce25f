//! Shared components for CLI commands
//!
//! Run statistics, logging setup, layered configuration loading and error
//! classification used by the command implementations.

use crate::cli::args::AnalyzeArgs;
use crate::config::PipelineConfig;
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Statistics for one CLI run across all input files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisStats {
    /// Files that completed ingestion
    pub sources_completed: usize,
    /// Files that failed and were skipped
    pub sources_failed: usize,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
    /// Data rows seen across all files
    pub total_rows: usize,
    /// Rows accepted across all files
    pub valid_rows: usize,
    /// Rows rejected across all files
    pub rejected_rows: usize,
    /// Operators in the final ranking
    pub operators_ranked: usize,
    /// Total processing time
    pub processing_time: Duration,
}

impl AnalysisStats {
    /// Percentage of rows accepted across the run
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.valid_rows as f64 / self.total_rows as f64 * 100.0
        }
    }
}

/// Set up structured logging for the analyze command
pub fn setup_logging(args: &AnalyzeArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("callcenter_pipeline={}", log_level)));

    let result = if args.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
pub fn load_configuration(args: &AnalyzeArgs) -> Result<PipelineConfig> {
    match &args.config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file given, using default location if present"),
    }

    let mut config = PipelineConfig::load_layered(args.config_file.as_deref())?;

    args.apply_overrides(&mut config);

    // Flags can break invariants the file and environment satisfied
    config.validate()?;

    Ok(config)
}

/// Whether an error should abort the whole run instead of skipping one file
pub fn is_critical_error(error: &Error) -> bool {
    matches!(
        error,
        Error::Configuration { .. } | Error::InvalidState { .. } | Error::WorkerFailed { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::OutputFormat;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn args_with_config(config_file: Option<PathBuf>) -> AnalyzeArgs {
        AnalyzeArgs {
            inputs: vec![PathBuf::from("calls.csv")],
            config_file,
            batch_size: None,
            row_ceiling: None,
            max_source_mb: None,
            top: None,
            rejection_preview: None,
            verbose: 0,
            quiet: true,
            output_format: OutputFormat::Human,
        }
    }

    #[test]
    fn test_analysis_stats_success_rate() {
        assert_eq!(AnalysisStats::default().success_rate(), 0.0);

        let stats = AnalysisStats {
            total_rows: 200,
            valid_rows: 150,
            rejected_rows: 50,
            ..Default::default()
        };
        assert_eq!(stats.success_rate(), 75.0);
    }

    #[test]
    fn test_load_configuration_applies_file_then_flags() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[ingestion]\nbatch_size = 200\nrow_ceiling = 4000\n\n[report]\ntop_operators = 7").unwrap();

        let mut args = args_with_config(Some(file.path().to_path_buf()));
        args.row_ceiling = Some(8_000);

        let config = load_configuration(&args).unwrap();
        assert_eq!(config.ingestion.batch_size, 200);
        assert_eq!(config.ingestion.row_ceiling, 8_000);
        assert_eq!(config.report.top_operators, 7);
    }

    #[test]
    fn test_load_configuration_rejects_inconsistent_flags() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[ingestion]\nbatch_size = 500").unwrap();

        let mut args = args_with_config(Some(file.path().to_path_buf()));
        args.row_ceiling = Some(100);

        let error = load_configuration(&args).unwrap_err();
        assert!(matches!(error, Error::Configuration { .. }));
    }

    #[test]
    fn test_is_critical_error() {
        assert!(is_critical_error(&Error::configuration("bad config")));
        assert!(is_critical_error(&Error::worker_failed("channel closed")));
        assert!(!is_critical_error(&Error::unsupported_format("a.pdf", "unknown suffix")));
        assert!(!is_critical_error(&Error::no_valid_rows(3, 3)));
        assert!(!is_critical_error(&Error::malformed_container("a.xlsx", "bad zip")));
    }
}
