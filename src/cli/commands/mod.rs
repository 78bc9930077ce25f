//! Command implementations for the call-center pipeline CLI
//!
//! Each command lives in its own module; shared setup and the report
//! renderers are split out so they can be tested without a terminal.

pub mod analyze;
pub mod report;
pub mod shared;

pub use report::AnalysisReport;
pub use shared::AnalysisStats;

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Main command runner
///
/// Dispatches to the subcommand handler. Cancelling `token` stops the run at
/// the next chunk boundary; the handler still reports what it processed.
pub async fn run(args: Args, token: CancellationToken) -> Result<AnalysisStats> {
    match args.command {
        Some(Commands::Analyze(analyze_args)) => analyze::run_analyze(analyze_args, token).await,
        None => Err(Error::configuration(
            "No command given; run with --help for usage",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_command_is_a_configuration_error() {
        let args = Args { command: None };
        let error = run(args, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(error, Error::Configuration { .. }));
    }
}
