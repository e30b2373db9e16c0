//! Terminal presentation of per-source reports and the batch summary.
//!
//! Everything here writes to stdout. Colors are dropped when `NO_COLOR` is
//! set or stdout is not a color-capable terminal.

use console::style;
use desync_core::analysis::{DriftReport, Severity, SummaryEntry, TrackDiffReport};
use desync_core::config::Method;
use desync_core::{BatchOutcome, DesyncError, MethodReport, Source, SourceReport, Verdict};
use owo_colors::OwoColorize;
use serde_json::{Value, json};
use unicode_width::UnicodeWidthStr;

/// Check if color should be used (respects NO_COLOR and terminal support)
pub fn should_use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
        && supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// A plain text table with columns padded to their display width.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
        }
        widths
    }

    fn render_line(cells: &[String], widths: &[usize]) -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.width());
                format!("{}{}", " ".repeat(pad), cell)
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Renders header, separator and rows, one line each.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(Self::render_line(&self.headers, &widths));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            lines.push(Self::render_line(row, &widths));
        }
        lines.join("\n")
    }
}

fn secs(value: f64) -> String {
    format!("{:.6}", value)
}

/// Packet table for a track-diff report.
pub fn track_diff_table(report: &TrackDiffReport) -> Table {
    let mut table = Table::new([
        "#",
        "Video PTS",
        "Video duration",
        "Audio PTS",
        "Audio duration",
        "diff",
    ]);
    for row in &report.rows {
        table.push_row(vec![
            row.video.sequence_number.to_string(),
            secs(row.video.presentation_time),
            secs(row.video.duration),
            secs(row.audio.presentation_time),
            secs(row.audio.duration),
            secs(row.diff),
        ]);
    }
    table
}

/// Packet table for a drift report.
pub fn drift_table(report: &DriftReport) -> Table {
    let mut table = Table::new(["#", "Video PTS", "Audio PTS", "Diff", "Drift from prev"]);
    for row in &report.rows {
        table.push_row(vec![
            row.number.to_string(),
            secs(row.video_pts),
            secs(row.audio_pts),
            secs(row.audio_delta),
            secs(row.drift_from_prev),
        ]);
    }
    table
}

/// Print a heading with colored styling and clear separation
pub fn print_heading(text: &str) {
    println!();
    if should_use_color() {
        println!("{}", "=".repeat(50).bright_blue());
        println!("{}", style(text).bold());
        println!("{}", "=".repeat(50).bright_blue());
    } else {
        println!("{}", "=".repeat(50));
        println!("{}", text);
        println!("{}", "=".repeat(50));
    }
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: std::fmt::Display>(label: &str, value: T) {
    if should_use_color() {
        println!("{}: {}", label.bright_cyan(), value);
    } else {
        println!("{}: {}", label, value);
    }
}

fn verdict_text(verdict: Verdict) -> String {
    let label = verdict.label();
    if !should_use_color() {
        return label.to_string();
    }
    match verdict.severity() {
        Severity::InSync => label.green().to_string(),
        Severity::Offset => label.yellow().to_string(),
        Severity::Desynced => label.bright_red().bold().to_string(),
    }
}

fn source_title(source: &Source) -> String {
    if source.group.is_empty() {
        source.name.clone()
    } else {
        format!("{} / {}", source.group, source.name)
    }
}

/// Prints the tables and verdict of one analyzed source.
pub fn print_report(report: &SourceReport) {
    print_heading(&format!("Camera: {}", source_title(&report.source)));
    print_info("Source", &report.source.uri);

    match &report.details {
        MethodReport::TrackDiff(details) => {
            println!("{}", track_diff_table(details).render());
            println!();
            print_info("Average PTS diff", secs(details.mean_abs_diff));
        }
        MethodReport::Drift(details) => {
            println!("{}", drift_table(details).render());
            println!();
            print_info("First diff", secs(details.first_delta));
            print_info("Last diff", secs(details.last_delta));
            print_info("Average diff", secs(details.avg_delta));
            print_info("Total drift change", secs(details.total_drift_change));
            print_info("Drift rate (per packet)", secs(details.drift_rate));
            print_info("Total duration diff", secs(details.total_duration_diff));
            print_info("Duration diff rate", secs(details.duration_diff_rate));
        }
        MethodReport::StartDiff {
            video_start,
            audio_start,
            offset,
        } => {
            print_info("Video start", secs(*video_start));
            print_info("Audio start", secs(*audio_start));
            print_info("Start time difference", secs(*offset));
        }
        MethodReport::FirstPackets {
            video_first,
            audio_first,
        } => {
            print_info("First video packet", secs(*video_first));
            print_info("First audio packet", secs(*audio_first));
        }
    }

    if let Some(mismatch) = report.details.count_mismatch() {
        print_warning(&mismatch.to_string());
    }
    println!("{}", verdict_text(report.verdict));
}

/// Prints a source that could not be analyzed.
pub fn print_failure(source: &Source, error: &DesyncError) {
    print_heading(&format!("Camera: {}", source_title(source)));
    print_info("Source", &source.uri);
    print_warning(&format!("Not analyzed: {}", error));
}

/// Print a warning message with yellow styling
pub fn print_warning(message: &str) {
    if should_use_color() {
        println!("{} {}", "!".yellow().bold(), message.yellow());
    } else {
        println!("! {}", message);
    }
}

/// Print an error message with red styling
pub fn print_error(message: &str) {
    if std::env::var_os("NO_COLOR").is_none()
        && supports_color::on(supports_color::Stream::Stderr).is_some()
    {
        eprintln!("{} {}", "Error:".bold().bright_red(), message);
    } else {
        eprintln!("Error: {}", message);
    }
}

/// Table of every verdict in aggregation order plus the failed sources.
pub fn summary_table(entries: &[SummaryEntry<'_>], outcome: &BatchOutcome) -> Table {
    let mut table = Table::new(["Apartment", "Camera", "Metric", "Value", "Verdict"]);
    for entry in entries {
        table.push_row(vec![
            entry.result.source_label.clone(),
            entry.result.source_identifier.clone(),
            entry.result.metric.as_str().to_string(),
            secs(entry.result.primary_metric),
            entry.verdict.label().to_string(),
        ]);
    }
    for (source, _) in outcome.failures() {
        table.push_row(vec![
            source.group.clone(),
            source.uri.clone(),
            "-".to_string(),
            "-".to_string(),
            "not analyzed".to_string(),
        ]);
    }
    table
}

/// Prints the batch summary.
pub fn print_summary(entries: &[SummaryEntry<'_>], outcome: &BatchOutcome) {
    print_heading("Summary");
    println!("{}", summary_table(entries, outcome).render());
    println!();

    for entry in entries.iter().filter(|e| e.severity == Severity::Desynced) {
        let line = format!(
            "{} in {} {}",
            entry.verdict.label(),
            entry.result.source_label,
            entry.result.source_identifier
        );
        if should_use_color() {
            println!("{}", line.bright_red().bold());
        } else {
            println!("{}", line);
        }
    }

    print_info(
        "Analyzed",
        format!(
            "{} of {} source(s) in {:.1}s",
            entries.len(),
            outcome.outcomes.len(),
            outcome.elapsed.as_secs_f64()
        ),
    );
}

/// JSON document for `--json`.
pub fn json_summary(method: Method, entries: &[SummaryEntry<'_>], outcome: &BatchOutcome) -> Value {
    let failures: Vec<Value> = outcome
        .failures()
        .map(|(source, error)| {
            json!({
                "source": source,
                "error": error.to_string(),
            })
        })
        .collect();

    json!({
        "method": method,
        "started_at": outcome.started_at.to_rfc3339(),
        "elapsed_secs": outcome.elapsed.as_secs_f64(),
        "results": entries,
        "failures": failures,
    })
}
