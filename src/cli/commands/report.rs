//! Final report rendering
//!
//! Renders the merged run results as a colored terminal report, a JSON
//! document or a CSV ranking. Every renderer writes to a caller-supplied
//! writer so the binary can target stdout and tests can capture the text.

use super::shared::AnalysisStats;
use crate::app::services::aggregation::{
    GlobalMetrics, OperatorMetrics, ScoreEntry, round_average,
};
use crate::app::services::ingestion::IngestionSummary;
use crate::app::services::streaming_decoder::DetectionMode;
use crate::cli::args::OutputFormat;
use crate::{Error, Result};
use colored::*;
use indicatif::HumanDuration;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Everything the final report shows
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// One summary per input file that reached a terminal state
    pub sources: Vec<IngestionSummary>,
    pub global: GlobalMetrics,
    /// Full ranking, highest score first
    pub ranking: Vec<ScoreEntry>,
    pub stats: AnalysisStats,
    /// Ranking entries to show
    pub top: usize,
    /// Rejections listed per source
    pub rejection_preview: usize,
}

/// Write the report in the requested format
pub fn write_report<W: Write>(
    out: &mut W,
    format: OutputFormat,
    report: &AnalysisReport,
) -> Result<()> {
    match format {
        OutputFormat::Human => write_human_report(out, report),
        OutputFormat::Json => write_json_report(out, report),
        OutputFormat::Csv => write_csv_report(out, report),
    }
}

/// Generate human-readable report
fn write_human_report<W: Write>(out: &mut W, report: &AnalysisReport) -> Result<()> {
    let stats = &report.stats;

    writeln!(out)?;
    if stats.cancelled {
        writeln!(out, "{}", "Call-Center Analysis (cancelled)".yellow().bold())?;
    } else {
        writeln!(out, "{}", "Call-Center Analysis Complete".bright_green().bold())?;
    }
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;

    writeln!(out, "{}", "Sources:".bold())?;
    for summary in &report.sources {
        write_source(out, summary, report.rejection_preview)?;
    }
    if stats.sources_failed > 0 {
        writeln!(
            out,
            "   {} {} file(s) failed and were skipped",
            "!".red().bold(),
            stats.sources_failed
        )?;
    }

    let global = &report.global;
    writeln!(out)?;
    writeln!(out, "{}", "Global Metrics:".bold())?;
    writeln!(out, "   • Records: {}", global.total_records)?;
    writeln!(out, "   • Calls: {}", global.total_calls)?;
    writeln!(out, "   • Operators: {}", global.operator_count)?;
    writeln!(
        out,
        "   • Avg duration: {} min",
        round_average(global.avg_duration_minutes)
    )?;
    writeln!(
        out,
        "   • Avg pause: {} min",
        round_average(global.avg_pause_minutes)
    )?;
    writeln!(
        out,
        "   • Avg rating (attendance / solution): {} / {}",
        format_rating(global.avg_rating_attendance),
        format_rating(global.avg_rating_solution)
    )?;
    if let (Some(first), Some(last)) = (global.first_timestamp, global.last_timestamp) {
        writeln!(
            out,
            "   • Period: {} to {} ({} day(s) with calls)",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M"),
            global.calls_per_day.len()
        )?;
    }
    if let Some((day, calls)) = global
        .calls_per_day
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
    {
        writeln!(out, "   • Busiest day: {} ({} calls)", day, calls)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!(
            "Ranking (top {} of {}):",
            report.top.min(report.ranking.len()),
            report.ranking.len()
        )
        .bold()
    )?;
    writeln!(
        out,
        "   {:>4}  {:<28} {:>7} {:>7} {:>9} {:>6} {:>6} {:>8}",
        "#", "Operator", "Score", "Calls", "Avg dur", "Att", "Sol", "Avg pause"
    )?;
    for (position, entry) in report.ranking.iter().take(report.top).enumerate() {
        let metrics = &entry.metrics;
        writeln!(
            out,
            "   {:>4}  {:<28} {:>7} {:>7} {:>9} {:>6} {:>6} {:>8}",
            position + 1,
            entry.operator_id.bright_cyan(),
            format!("{:.3}", entry.display_score()),
            metrics.total_calls,
            round_average(metrics.avg_duration_minutes),
            format_rating(metrics.avg_rating_attendance),
            format_rating(metrics.avg_rating_solution),
            round_average(metrics.avg_pause_minutes)
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Processed {} rows ({} valid, {} rejected, {:.1}% success) in {}",
        stats.total_rows,
        stats.valid_rows,
        stats.rejected_rows,
        stats.success_rate(),
        HumanDuration(stats.processing_time)
    )?;
    if stats.cancelled {
        writeln!(
            out,
            "{}",
            "Run cancelled: results cover the rows processed before cancellation".yellow()
        )?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_source<W: Write>(
    out: &mut W,
    summary: &IngestionSummary,
    preview: usize,
) -> Result<()> {
    let format = summary
        .format
        .map_or_else(|| "unknown".to_string(), |f| f.to_string());
    writeln!(
        out,
        "   • {} [{}]: {} rows -> {} valid, {} rejected ({:.1}% success)",
        summary.source_name.bright_cyan(),
        format,
        summary.total_rows,
        summary.valid_rows,
        summary.rejected_rows,
        summary.success_rate()
    )?;

    if summary.detection_mode == Some(DetectionMode::Vendor) {
        writeln!(out, "       columns matched from vendor headers")?;
    }
    if !summary.missing_columns.is_empty() {
        let missing: Vec<String> = summary
            .missing_columns
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(
            out,
            "       {} missing columns: {}",
            "!".yellow().bold(),
            missing.join(", ")
        )?;
    }
    for (reason, count) in &summary.reason_counts {
        writeln!(out, "       {}: {}", reason, count)?;
    }
    for rejection in summary.rejection_preview.iter().take(preview) {
        writeln!(out, "       - {}", rejection.describe().bright_black())?;
    }
    if summary.rejected_rows > preview.min(summary.rejection_preview.len()) && preview > 0 {
        writeln!(
            out,
            "       … {} more rejection(s)",
            summary.rejected_rows - preview.min(summary.rejection_preview.len())
        )?;
    }
    Ok(())
}

fn format_rating(rating: Option<f64>) -> String {
    rating.map_or_else(|| "n/a".to_string(), |r| round_average(r).to_string())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    cancelled: bool,
    processing_time_seconds: f64,
    total_rows: usize,
    valid_rows: usize,
    rejected_rows: usize,
    sources: Vec<JsonSource<'a>>,
    global: &'a GlobalMetrics,
    ranking: Vec<JsonRankEntry<'a>>,
}

#[derive(Serialize)]
struct JsonSource<'a> {
    name: &'a str,
    format: Option<String>,
    total_rows: usize,
    valid_rows: usize,
    rejected_rows: usize,
    rejections: BTreeMap<String, usize>,
    missing_columns: Vec<String>,
}

#[derive(Serialize)]
struct JsonRankEntry<'a> {
    rank: usize,
    operator_id: &'a str,
    score: f64,
    metrics: &'a OperatorMetrics,
}

/// Generate JSON report for machine consumption
fn write_json_report<W: Write>(out: &mut W, report: &AnalysisReport) -> Result<()> {
    let json = JsonReport {
        cancelled: report.stats.cancelled,
        processing_time_seconds: report.stats.processing_time.as_secs_f64(),
        total_rows: report.stats.total_rows,
        valid_rows: report.stats.valid_rows,
        rejected_rows: report.stats.rejected_rows,
        sources: report
            .sources
            .iter()
            .map(|summary| JsonSource {
                name: &summary.source_name,
                format: summary.format.map(|f| f.to_string()),
                total_rows: summary.total_rows,
                valid_rows: summary.valid_rows,
                rejected_rows: summary.rejected_rows,
                rejections: summary
                    .reason_counts
                    .iter()
                    .map(|(reason, count)| (reason.to_string(), *count))
                    .collect(),
                missing_columns: summary
                    .missing_columns
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            })
            .collect(),
        global: &report.global,
        ranking: report
            .ranking
            .iter()
            .take(report.top)
            .enumerate()
            .map(|(position, entry)| JsonRankEntry {
                rank: position + 1,
                operator_id: &entry.operator_id,
                score: entry.display_score(),
                metrics: &entry.metrics,
            })
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *out, &json)
        .map_err(|e| Error::io("Failed to render JSON report", e.into()))?;
    writeln!(out)?;
    Ok(())
}

/// Generate CSV ranking for spreadsheets
fn write_csv_report<W: Write>(out: &mut W, report: &AnalysisReport) -> Result<()> {
    let mut writer = csv::Writer::from_writer(&mut *out);
    let csv_error = |e: csv::Error| Error::io("Failed to write CSV report", e.into());

    writer
        .write_record([
            "rank",
            "operator",
            "score",
            "total_calls",
            "avg_duration_minutes",
            "avg_rating_attendance",
            "avg_rating_solution",
            "avg_pause_minutes",
        ])
        .map_err(csv_error)?;

    for (position, entry) in report.ranking.iter().take(report.top).enumerate() {
        let metrics = &entry.metrics;
        let optional = |value: Option<f64>| value.map(|v| round_average(v).to_string()).unwrap_or_default();
        writer
            .write_record([
                (position + 1).to_string(),
                entry.operator_id.clone(),
                format!("{:.3}", entry.display_score()),
                metrics.total_calls.to_string(),
                round_average(metrics.avg_duration_minutes).to_string(),
                optional(metrics.avg_rating_attendance),
                optional(metrics.avg_rating_solution),
                round_average(metrics.avg_pause_minutes).to_string(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .flush()
        .map_err(|e| Error::io("Failed to write CSV report", e))?;
    Ok(())
}
