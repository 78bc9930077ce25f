//! Analyze command implementation
//!
//! Ingests every input file through its own coordinator, folds the batches of
//! each file into a file-local aggregation engine and merges that engine into
//! the run once the file has completed. A file that fails part-way therefore
//! never contributes half of its rows to the ranking.

use super::report::{AnalysisReport, write_report};
use super::shared::{AnalysisStats, is_critical_error, load_configuration, setup_logging};
use crate::app::services::aggregation::AggregationEngine;
use crate::app::services::ingestion::{
    IngestionCoordinator, IngestionEvent, IngestionOutcome, IngestionSource,
};
use crate::cli::args::AnalyzeArgs;
use crate::cli::progress::ProgressReporter;
use crate::config::{IngestionOptions, PipelineConfig};
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Analyze command runner
///
/// 1. Set up logging and configuration
/// 2. Ingest each file with progress reporting
/// 3. Rank the operators across all files
/// 4. Print the report in the requested format
pub async fn run_analyze(args: AnalyzeArgs, token: CancellationToken) -> Result<AnalysisStats> {
    setup_logging(&args)?;

    info!("Starting call-center analysis");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let report = analyze_sources(&args.inputs, &config, &token, args.show_progress()).await?;

    let mut stdout = std::io::stdout().lock();
    write_report(&mut stdout, args.output_format, &report)?;

    Ok(report.stats)
}

/// Ingest and aggregate every input, skipping files that fail
///
/// Returns `NoValidRows` when no file contributed a single record, unless the
/// run was cancelled first.
pub async fn analyze_sources(
    inputs: &[PathBuf],
    config: &PipelineConfig,
    token: &CancellationToken,
    show_progress: bool,
) -> Result<AnalysisReport> {
    let start_time = Instant::now();
    let mut engine = AggregationEngine::new();
    let mut stats = AnalysisStats::default();
    let mut sources = Vec::new();

    for (i, input) in inputs.iter().enumerate() {
        if token.is_cancelled() {
            stats.cancelled = true;
            break;
        }

        info!(
            "Ingesting file {} of {}: {}",
            i + 1,
            inputs.len(),
            input.display()
        );

        let source = IngestionSource::from_path(input);
        let (outcome, file_engine) =
            match ingest_source(source, &config.ingestion, token, show_progress).await {
                Ok(result) => result,
                Err(e) => {
                    error!("Failed to start ingestion of {}: {}", input.display(), e);
                    if is_critical_error(&e) {
                        return Err(e);
                    }
                    stats.sources_failed += 1;
                    continue;
                }
            };

        match outcome {
            IngestionOutcome::Completed(summary) => {
                if summary.is_successful() {
                    stats.sources_completed += 1;
                } else {
                    warn!("{} produced no valid rows", summary.source_name);
                    stats.sources_failed += 1;
                }
                add_rows(&mut stats, &summary);
                engine.merge(file_engine);
                sources.push(summary);
            }
            IngestionOutcome::Cancelled(summary) => {
                warn!(
                    "Ingestion of {} cancelled after {} rows",
                    summary.source_name, summary.total_rows
                );
                add_rows(&mut stats, &summary);
                engine.merge(file_engine);
                sources.push(summary);
                stats.cancelled = true;
                break;
            }
            IngestionOutcome::Failed { error, summary } => {
                error!(
                    "Ingestion of {} failed after {} rows: {}",
                    summary.source_name, summary.total_rows, error
                );
                if is_critical_error(&error) {
                    return Err(error);
                }
                stats.sources_failed += 1;
            }
        }
    }

    stats.processing_time = start_time.elapsed();

    if engine.is_empty() && !stats.cancelled {
        return Err(Error::no_valid_rows(stats.total_rows, stats.rejected_rows));
    }

    let ranking = engine.rank();
    stats.operators_ranked = ranking.len();
    info!(
        "Ranked {} operators from {} valid rows",
        stats.operators_ranked, stats.valid_rows
    );

    Ok(AnalysisReport {
        sources,
        global: engine.compute_global_metrics(),
        ranking,
        stats,
        top: config.report.top_operators,
        rejection_preview: config.report.rejection_preview,
    })
}

/// Run one source to its terminal event, folding batches as they arrive
async fn ingest_source(
    source: IngestionSource,
    options: &IngestionOptions,
    token: &CancellationToken,
    show_progress: bool,
) -> Result<(IngestionOutcome, AggregationEngine)> {
    let source_name = source.name().to_string();
    let mut coordinator = IngestionCoordinator::new(options.clone()).with_cancellation(token);
    coordinator.start(source)?;

    let mut reporter = ProgressReporter::new();
    if show_progress {
        reporter.setup(&source_name);
    }

    let mut engine = AggregationEngine::new();
    let mut outcome = None;

    while let Some(event) = coordinator.next_event().await {
        match event {
            IngestionEvent::Progress(progress) => reporter.update(&progress),
            IngestionEvent::BatchReady(batch) => engine.fold_batch(&batch),
            IngestionEvent::Completed(summary) => {
                reporter.finish(&summary);
                info!("{}: {}", source_name, summary.summary());
                outcome = Some(IngestionOutcome::Completed(summary));
            }
            IngestionEvent::Cancelled(summary) => {
                reporter.finish_cancelled(&summary);
                outcome = Some(IngestionOutcome::Cancelled(summary));
            }
            IngestionEvent::Failed(error) => {
                reporter.finish_with_error(&error.to_string());
                outcome = Some(IngestionOutcome::Failed {
                    error,
                    summary: coordinator.summary(),
                });
            }
        }
    }

    let outcome = outcome.ok_or_else(|| {
        Error::worker_failed(format!(
            "ingestion of '{}' ended without a terminal event",
            source_name
        ))
    })?;
    Ok((outcome, engine))
}

fn add_rows(stats: &mut AnalysisStats, summary: &crate::IngestionSummary) {
    stats.total_rows += summary.total_rows;
    stats.valid_rows += summary.valid_rows;
    stats.rejected_rows += summary.rejected_rows;
}
