//! Implementation of the analysis run.
//!
//! Loads the sources named on the command line, analyzes them with the
//! configured method and reports each source followed by the batch summary.

use crate::cli::Cli;
use crate::error::StepContext;
use crate::output;

use desync_core::{
    Aggregator, Analyzer, BatchOutcome, DesyncError, FfmpegRecorder, FfprobeRunner, Severity,
    Result, Source, SourceOutcome, Thresholds, load_source_list,
};

use log::{debug, info};

/// Exit code when every source is in sync or merely offset.
pub const EXIT_OK: i32 = 0;
/// Exit code for fatal errors.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when at least one source drifts or is desynchronized.
pub const EXIT_DESYNC: i32 = 2;

/// Sources named by `--csv` or `--file`.
pub fn resolve_sources(cli: &Cli) -> Result<Vec<Source>> {
    if let Some(path) = &cli.csv {
        let sources = load_source_list(path)
            .step(format!("Failed to load source list {}", path.display()))?;
        if sources.is_empty() {
            return Err(DesyncError::SourceList {
                line: 0,
                message: format!("{} contains no usable sources", path.display()),
            });
        }
        return Ok(sources);
    }

    let locator = cli
        .file
        .as_deref()
        .ok_or_else(|| DesyncError::Config("either --file or --csv must be given".to_string()))?;
    Ok(vec![Source::single(locator)])
}

/// Process exit code for a finished batch.
///
/// Counts the per-source verdicts as well as the summary verdicts.
pub fn exit_code(outcome: &BatchOutcome, aggregator: &Aggregator, thresholds: &Thresholds) -> i32 {
    let worst = outcome
        .worst_severity()
        .max(aggregator.worst_severity(thresholds));
    if worst == Severity::Desynced {
        EXIT_DESYNC
    } else if aggregator.is_empty() && outcome.failure_count() > 0 {
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

/// Runs the analysis and returns the process exit code.
pub fn run_analyze(cli: &Cli) -> Result<i32> {
    let sources = resolve_sources(cli)?;
    let config = cli.analysis_config();
    debug!("Analysis configuration: {:?}", config);

    let prober = FfprobeRunner::new(&config);
    let recorder = FfmpegRecorder::new(config.temp_dir.clone());
    let analyzer = Analyzer::new(config, prober, recorder).step("Invalid analysis settings")?;
    let method = analyzer.config().method;
    let thresholds = analyzer.config().thresholds;

    if !cli.json {
        output::print_heading("find-desync");
        output::print_info("Method", method);
        output::print_info("Sources", sources.len());
    }

    let mut aggregator = Aggregator::new();
    let outcome = analyzer.run_batch(&sources, &mut aggregator);
    let entries = aggregator.summary(&thresholds);

    if cli.json {
        let document = output::json_summary(method, &entries, &outcome);
        let text =
            serde_json::to_string_pretty(&document).step("Failed to encode summary")?;
        println!("{}", text);
    } else {
        for source_outcome in &outcome.outcomes {
            match source_outcome {
                SourceOutcome::Analyzed(report) => output::print_report(report),
                SourceOutcome::Failed { source, error } => output::print_failure(source, error),
            }
        }
        output::print_summary(&entries, &outcome);
    }

    let code = exit_code(&outcome, &aggregator, &thresholds);
    info!("Finished with exit code {}", code);
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use desync_core::{DiffResult, MethodReport, MetricKind, SourceReport, Verdict};
    use std::time::Duration;

    fn batch(failed: usize) -> BatchOutcome {
        BatchOutcome {
            started_at: chrono::Local::now(),
            elapsed: Duration::ZERO,
            outcomes: (0..failed)
                .map(|i| SourceOutcome::Failed {
                    source: Source::single(&format!("cam-{i}")),
                    error: DesyncError::Recording("boom".to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_exit_codes() {
        let thresholds = Thresholds::default();
        let mut agg = Aggregator::new();
        assert_eq!(exit_code(&batch(0), &agg, &thresholds), EXIT_OK);
        assert_eq!(exit_code(&batch(1), &agg, &thresholds), EXIT_FAILURE);

        agg.push(DiffResult::new("", "a", MetricKind::StartOffset, 0.05));
        assert_eq!(exit_code(&batch(1), &agg, &thresholds), EXIT_OK);

        agg.push(DiffResult::new("", "b", MetricKind::MeanAbsDiff, 0.9));
        assert_eq!(exit_code(&batch(0), &agg, &thresholds), EXIT_DESYNC);
    }

    #[test]
    fn test_per_source_drift_verdict_sets_desync_exit() {
        let thresholds = Thresholds::default();
        let source = Source::single("/media/hall.mkv");
        let result = DiffResult::new("", &source.uri, MetricKind::TotalDriftChange, 0.8);
        let mut agg = Aggregator::new();
        agg.push(result.clone());

        let mut outcome = batch(0);
        outcome.outcomes.push(SourceOutcome::Analyzed(SourceReport {
            source,
            details: MethodReport::StartDiff {
                video_start: 0.0,
                audio_start: 0.0,
                offset: 0.0,
            },
            result,
            verdict: Verdict::DriftDetected,
        }));

        assert_eq!(agg.worst_severity(&thresholds), Severity::InSync);
        assert_eq!(exit_code(&outcome, &agg, &thresholds), EXIT_DESYNC);
    }

    #[test]
    fn test_single_file_source() {
        let cli = Cli::parse_from(["find-desync", "-f", "/media/hall.mkv"]);
        let sources = resolve_sources(&cli).unwrap();
        assert_eq!(sources, vec![Source::single("/media/hall.mkv")]);
    }

    #[test]
    fn test_missing_source_list_has_context() {
        let cli = Cli::parse_from(["find-desync", "-c", "/nonexistent/cameras.csv"]);
        let err = resolve_sources(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to load source list"));
    }
}
