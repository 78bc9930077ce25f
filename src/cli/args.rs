//! Command-line argument definitions for the call-center pipeline
//!
//! This module defines the CLI interface using the clap derive API. Flags that
//! touch ingestion or reporting override the layered configuration (defaults,
//! TOML file, environment).

use crate::config::PipelineConfig;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the call-center pipeline
///
/// Ingests call-center exports (CSV/TSV or spreadsheets), validates every row
/// and ranks the operators who handled the calls.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "callcenter-pipeline",
    version,
    about = "Ingest call-center exports and rank operators by a weighted score",
    long_about = "Streams large call-center exports (delimited text or spreadsheets) through a \
                  background worker, validates and normalizes every row, and folds the valid \
                  records into per-operator metrics and a weighted ranking."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Ingest one or more exports and print metrics and the operator ranking
    Analyze(AnalyzeArgs),
}

/// Arguments for the analyze command
#[derive(Debug, Clone, Parser)]
pub struct AnalyzeArgs {
    /// Export files to ingest (.csv, .tsv, .txt, .xlsx, .xls, .ods)
    ///
    /// All files are aggregated into one ranking. A file that fails is
    /// reported and skipped; the remaining files are still processed.
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Path to configuration file
    ///
    /// TOML configuration file for ingestion and report settings. If not
    /// specified, looks for ~/.config/callcenter-pipeline/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Rows decoded and validated per chunk
    #[arg(long = "batch-size", value_name = "ROWS")]
    pub batch_size: Option<usize>,

    /// Maximum rows buffered before a batch is handed off
    #[arg(long = "row-ceiling", value_name = "ROWS")]
    pub row_ceiling: Option<usize>,

    /// Reject sources larger than this many megabytes
    #[arg(long = "max-source-mb", value_name = "MB")]
    pub max_source_mb: Option<u64>,

    /// Number of operators shown in the ranking
    #[arg(short = 't', long = "top", value_name = "COUNT")]
    pub top: Option<usize>,

    /// Number of rejections listed per file
    #[arg(long = "rejection-preview", value_name = "COUNT")]
    pub rejection_preview: Option<usize>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors and the final report. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress progress and logging except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format of the final report
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for the report"
    )]
    pub output_format: OutputFormat,
}

/// Output format options for the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
    /// CSV ranking for spreadsheets
    Csv,
}

impl AnalyzeArgs {
    /// Validate the analyze command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::configuration("At least one input file is required"));
        }

        for input in &self.inputs {
            if !input.exists() {
                return Err(Error::configuration(format!(
                    "Input file does not exist: {}",
                    input.display()
                )));
            }
            if !input.is_file() {
                return Err(Error::configuration(format!(
                    "Input path is not a file: {}",
                    input.display()
                )));
            }
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        if self.max_source_mb == Some(0) {
            return Err(Error::configuration(
                "Maximum source size must be greater than 0 MB",
            ));
        }

        if self.top == Some(0) {
            return Err(Error::configuration(
                "Number of ranked operators must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Apply explicitly given flags on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(batch_size) = self.batch_size {
            config.ingestion.batch_size = batch_size;
        }
        if let Some(row_ceiling) = self.row_ceiling {
            config.ingestion.row_ceiling = row_ceiling;
        }
        if let Some(megabytes) = self.max_source_mb {
            config.ingestion.max_source_bytes = megabytes.saturating_mul(1024 * 1024);
        }
        if let Some(top) = self.top {
            config.report.top_operators = top;
        }
        if let Some(preview) = self.rejection_preview {
            config.report.rejection_preview = preview;
            config.ingestion.rejection_preview_limit =
                config.ingestion.rejection_preview_limit.max(preview);
        }
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn analyze_args(inputs: Vec<PathBuf>) -> AnalyzeArgs {
        AnalyzeArgs {
            inputs,
            config_file: None,
            batch_size: None,
            row_ceiling: None,
            max_source_mb: None,
            top: None,
            rejection_preview: None,
            verbose: 0,
            quiet: false,
            output_format: OutputFormat::Human,
        }
    }

    #[test]
    fn test_parse_analyze_command() {
        let args = Args::try_parse_from([
            "callcenter-pipeline",
            "analyze",
            "calls.csv",
            "more.xlsx",
            "--batch-size",
            "500",
            "--top",
            "5",
            "-vv",
            "--output-format",
            "json",
        ])
        .unwrap();

        let Some(Commands::Analyze(analyze)) = args.command else {
            panic!("expected analyze command");
        };
        assert_eq!(
            analyze.inputs,
            vec![PathBuf::from("calls.csv"), PathBuf::from("more.xlsx")]
        );
        assert_eq!(analyze.batch_size, Some(500));
        assert_eq!(analyze.top, Some(5));
        assert_eq!(analyze.verbose, 2);
        assert_eq!(analyze.output_format, OutputFormat::Json);
        assert!(!analyze.show_progress());
    }

    #[test]
    fn test_analyze_requires_inputs() {
        assert!(Args::try_parse_from(["callcenter-pipeline", "analyze"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result =
            Args::try_parse_from(["callcenter-pipeline", "analyze", "a.csv", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let args = Args::try_parse_from(["callcenter-pipeline"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_validation() {
        let file = NamedTempFile::new().unwrap();
        let args = analyze_args(vec![file.path().to_path_buf()]);
        assert!(args.validate().is_ok());

        let missing = analyze_args(vec![PathBuf::from("/nonexistent/calls.csv")]);
        assert!(missing.validate().is_err());

        let dir = TempDir::new().unwrap();
        let directory = analyze_args(vec![dir.path().to_path_buf()]);
        assert!(directory.validate().is_err());

        let mut zero_top = args.clone();
        zero_top.top = Some(0);
        assert!(zero_top.validate().is_err());

        let mut zero_size = args.clone();
        zero_size.max_source_mb = Some(0);
        assert!(zero_size.validate().is_err());

        let mut missing_config = args;
        missing_config.config_file = Some(PathBuf::from("/nonexistent/config.toml"));
        assert!(missing_config.validate().is_err());
    }

    #[test]
    fn test_overrides_replace_loaded_values() {
        let mut args = analyze_args(vec![PathBuf::from("calls.csv")]);
        args.batch_size = Some(250);
        args.row_ceiling = Some(2_000);
        args.max_source_mb = Some(10);
        args.top = Some(3);
        args.rejection_preview = Some(50);

        let mut config = PipelineConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.ingestion.batch_size, 250);
        assert_eq!(config.ingestion.row_ceiling, 2_000);
        assert_eq!(config.ingestion.max_source_bytes, 10 * 1024 * 1024);
        assert_eq!(config.report.top_operators, 3);
        assert_eq!(config.report.rejection_preview, 50);
        assert_eq!(config.ingestion.rejection_preview_limit, 50);
    }

    #[test]
    fn test_log_levels() {
        let mut args = analyze_args(vec![PathBuf::from("calls.csv")]);
        assert_eq!(args.get_log_level(), "warn");
        args.verbose = 3;
        assert_eq!(args.get_log_level(), "trace");
        args.quiet = true;
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());
    }
}
