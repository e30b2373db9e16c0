// ============================================================================
// desync-core/src/analyzer.rs
// ============================================================================
//
// PER-SOURCE ANALYSIS AND BATCH DRIVER
//
// The analyzer glues the collaborators to the pure analysis code:
//
//   source ──(ClipRecorder, optional)──> locator ──(ProbeRunner)──> raw text
//          ──(parser)──> track samples ──(diff)──> metric ──(classify)──> verdict
//
// Each entry point returns a SourceReport for presentation and appends one
// DiffResult to the caller's Aggregator. Failures stay per-source: the batch
// driver records them as SourceOutcome::Failed and moves on.
//
// AI-ASSISTANT-INFO: Per-source analysis entry points and batch driver

// ---- External crate imports ----
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

// ---- Standard library imports ----
use std::time::{Duration, Instant};

// ---- Internal crate imports ----
use crate::analysis::{
    self, Aggregator, CountMismatch, DiffResult, DriftDetails, DriftReport, MetricKind,
    Severity, TrackDiffReport, Verdict,
};
use crate::config::{AnalysisConfig, Method, SourceMode};
use crate::error::{DesyncError, Result};
use crate::packet::{TrackKind, TrackSample};
use crate::probe::{self, OutputShape, ProbeRequest, ProbeRunner, ReadInterval};
use crate::recording::{ClipRecorder, RecordedClip};
use crate::sources::Source;

/// Method-specific figures behind a verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MethodReport {
    TrackDiff(TrackDiffReport),
    Drift(DriftReport),
    StartDiff {
        video_start: f64,
        audio_start: f64,
        offset: f64,
    },
    FirstPackets {
        video_first: f64,
        audio_first: f64,
    },
}

impl MethodReport {
    pub fn count_mismatch(&self) -> Option<CountMismatch> {
        match self {
            MethodReport::TrackDiff(report) => report.mismatch,
            MethodReport::Drift(report) => report.mismatch,
            MethodReport::StartDiff { .. } | MethodReport::FirstPackets { .. } => None,
        }
    }
}

/// Everything produced by analyzing one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub details: MethodReport,
    pub result: DiffResult,
    pub verdict: Verdict,
}

/// Outcome of one source in a batch.
#[derive(Debug)]
pub enum SourceOutcome {
    Analyzed(SourceReport),
    Failed { source: Source, error: DesyncError },
}

impl SourceOutcome {
    pub fn source(&self) -> &Source {
        match self {
            SourceOutcome::Analyzed(report) => &report.source,
            SourceOutcome::Failed { source, .. } => source,
        }
    }
}

/// Result of a batch run, in source order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub outcomes: Vec<SourceOutcome>,
}

impl BatchOutcome {
    pub fn analyzed(&self) -> impl Iterator<Item = &SourceReport> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            SourceOutcome::Analyzed(report) => Some(report),
            SourceOutcome::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Source, &DesyncError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            SourceOutcome::Failed { source, error } => Some((source, error)),
            SourceOutcome::Analyzed(_) => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Worst per-source verdict severity, `InSync` when nothing was analyzed.
    pub fn worst_severity(&self) -> Severity {
        self.analyzed()
            .map(|report| report.verdict.severity())
            .max()
            .unwrap_or(Severity::InSync)
    }
}

/// Per-source analyzer over a prober and a clip recorder.
pub struct Analyzer<P: ProbeRunner, R: ClipRecorder> {
    config: AnalysisConfig,
    prober: P,
    recorder: R,
}

impl<P: ProbeRunner, R: ClipRecorder> Analyzer<P, R> {
    pub fn new(config: AnalysisConfig, prober: P, recorder: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            prober,
            recorder,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Mean absolute PTS difference between the tracks.
    pub fn track_diff(&self, source: &Source, aggregator: &mut Aggregator) -> Result<SourceReport> {
        self.evaluate_track_diff(source).map(|report| record(report, aggregator))
    }

    /// Drift of successive audio packet deltas.
    pub fn drift(&self, source: &Source, aggregator: &mut Aggregator) -> Result<SourceReport> {
        self.evaluate_drift(source).map(|report| record(report, aggregator))
    }

    /// Offset between the stream start times reported in the stream banner.
    pub fn start_diff(&self, source: &Source, aggregator: &mut Aggregator) -> Result<SourceReport> {
        self.evaluate_start_diff(source).map(|report| record(report, aggregator))
    }

    /// Distance between the first video and first audio frame times.
    pub fn first_packets(
        &self,
        source: &Source,
        aggregator: &mut Aggregator,
    ) -> Result<SourceReport> {
        self.evaluate_first_packets(source)
            .map(|report| record(report, aggregator))
    }

    /// Runs the configured method.
    pub fn analyze(&self, source: &Source, aggregator: &mut Aggregator) -> Result<SourceReport> {
        self.evaluate(source).map(|report| record(report, aggregator))
    }

    /// Analyzes every source, keeping going past failures.
    ///
    /// Results are appended to `aggregator` in source order, whatever the
    /// number of jobs.
    pub fn run_batch(&self, sources: &[Source], aggregator: &mut Aggregator) -> BatchOutcome {
        let started_at = Local::now();
        let timer = Instant::now();

        info!(
            "Analyzing {} source(s) with method {} ({} job(s))",
            sources.len(),
            self.config.method,
            self.config.jobs
        );

        // ========================================================================
        // STEP 1: EVALUATE SOURCES
        // ========================================================================

        let evaluated: Vec<Result<SourceReport>> = if self.config.jobs > 1 && sources.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    sources
                        .par_iter()
                        .map(|source| self.evaluate_logged(source))
                        .collect()
                }),
                Err(e) => {
                    warn!("Failed to start worker pool, analyzing sequentially: {}", e);
                    sources.iter().map(|s| self.evaluate_logged(s)).collect()
                }
            }
        } else {
            sources.iter().map(|s| self.evaluate_logged(s)).collect()
        };

        // ========================================================================
        // STEP 2: APPEND IN SOURCE ORDER
        // ========================================================================

        let outcomes: Vec<SourceOutcome> = sources
            .iter()
            .zip(evaluated)
            .map(|(source, result)| match result {
                Ok(report) => SourceOutcome::Analyzed(record(report, aggregator)),
                Err(error) => SourceOutcome::Failed {
                    source: source.clone(),
                    error,
                },
            })
            .collect();

        let elapsed = timer.elapsed();
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, SourceOutcome::Failed { .. }))
            .count();
        info!(
            "Batch finished in {:.1}s: {} analyzed, {} failed",
            elapsed.as_secs_f64(),
            outcomes.len() - failed,
            failed
        );

        BatchOutcome {
            started_at,
            elapsed,
            outcomes,
        }
    }

    fn evaluate_logged(&self, source: &Source) -> Result<SourceReport> {
        info!("Analyzing {} ({})", source.name, source.uri);
        let result = self.evaluate(source);
        match &result {
            Ok(report) => info!("{}: {}", source.name, report.verdict),
            Err(e) if e.is_insufficient_packets() => {
                warn!("Skipping {}: {}", source.name, e)
            }
            Err(e) => error!("Analysis of {} failed: {}", source.name, e),
        }
        result
    }

    fn evaluate(&self, source: &Source) -> Result<SourceReport> {
        match self.config.method {
            Method::TrackDiff => self.evaluate_track_diff(source),
            Method::Drift => self.evaluate_drift(source),
            Method::StartDiff => self.evaluate_start_diff(source),
            Method::FirstPackets => self.evaluate_first_packets(source),
        }
    }

    fn evaluate_track_diff(&self, source: &Source) -> Result<SourceReport> {
        let (video, audio) = self.sample_tracks(source)?;
        let report = analysis::track_diff(&video, &audio)?;
        warn_on_mismatch(source, report.mismatch);

        let verdict =
            analysis::classify_track_desync(report.mean_abs_diff, &self.config.thresholds);
        let result = DiffResult::new(
            &source.group,
            &source.uri,
            MetricKind::MeanAbsDiff,
            report.mean_abs_diff,
        );
        debug!(
            "{}: mean diff {:.4}s over {} packets",
            source.name, report.mean_abs_diff, report.comparable
        );

        Ok(SourceReport {
            source: source.clone(),
            details: MethodReport::TrackDiff(report),
            result,
            verdict,
        })
    }

    fn evaluate_drift(&self, source: &Source) -> Result<SourceReport> {
        let (video, audio) = self.sample_tracks(source)?;
        let report = analysis::drift(&video, &audio)?;
        warn_on_mismatch(source, report.mismatch);

        let verdict = analysis::classify_drift(
            report.total_drift_change,
            report.avg_delta,
            &self.config.thresholds,
        );
        let result = DiffResult::new(
            &source.group,
            &source.uri,
            MetricKind::TotalDriftChange,
            report.total_drift_change,
        )
        .with_drift(DriftDetails::from(&report));
        debug!(
            "{}: drift change {:.4}s, rate {:.6}s/packet",
            source.name, report.total_drift_change, report.drift_rate
        );

        Ok(SourceReport {
            source: source.clone(),
            details: MethodReport::Drift(report),
            result,
            verdict,
        })
    }

    // The stream banner is always read from the source itself.
    fn evaluate_start_diff(&self, source: &Source) -> Result<SourceReport> {
        let banner = self.prober.run(&ProbeRequest::StreamInfo {
            source: source.uri.clone(),
        })?;
        let video_start = probe::stream_start_time(TrackKind::Video, &banner)?;
        let audio_start = probe::stream_start_time(TrackKind::Audio, &banner)?;
        let offset = analysis::start_offset(video_start, audio_start);

        let verdict = analysis::classify_start_offset(offset, &self.config.thresholds);
        let result = DiffResult::new(&source.group, &source.uri, MetricKind::StartOffset, offset);

        Ok(SourceReport {
            source: source.clone(),
            details: MethodReport::StartDiff {
                video_start,
                audio_start,
                offset,
            },
            result,
            verdict,
        })
    }

    fn evaluate_first_packets(&self, source: &Source) -> Result<SourceReport> {
        let clip = self.record_if_needed(source, true)?;
        let locator = locator_for(source, clip.as_ref());

        let video_first = self.first_frame(&locator, TrackKind::Video)?;
        let audio_first = self.first_frame(&locator, TrackKind::Audio)?;

        let verdict =
            analysis::classify_first_packets(video_first, audio_first, &self.config.thresholds);
        let result = DiffResult::new(
            &source.group,
            &source.uri,
            MetricKind::FirstPacketOffset,
            video_first - audio_first,
        );

        Ok(SourceReport {
            source: source.clone(),
            details: MethodReport::FirstPackets {
                video_first,
                audio_first,
            },
            result,
            verdict,
        })
    }

    fn record_if_needed(&self, source: &Source, align: bool) -> Result<Option<RecordedClip>> {
        match self.config.source_mode {
            SourceMode::Direct => Ok(None),
            SourceMode::Recorded => self
                .recorder
                .record(&source.uri, self.config.clip_length(), align)
                .map(Some),
        }
    }

    /// Samples both tracks; a recorded clip lives until both are read.
    fn sample_tracks(&self, source: &Source) -> Result<(TrackSample, TrackSample)> {
        let clip = self.record_if_needed(source, false)?;
        let locator = locator_for(source, clip.as_ref());
        let interval = ReadInterval::from(self.config.measurement);

        let video = self.frames(&locator, TrackKind::Video, interval)?;
        let audio = self.frames(&locator, TrackKind::Audio, interval)?;
        Ok((video, audio))
    }

    fn frames(&self, locator: &str, track: TrackKind, interval: ReadInterval) -> Result<TrackSample> {
        let request = ProbeRequest::Frames {
            source: locator.to_string(),
            track,
            interval,
        };
        let raw = self.prober.run(&request)?;
        probe::parse_track(track, &raw, OutputShape::Csv)
    }

    fn first_frame(&self, locator: &str, track: TrackKind) -> Result<f64> {
        let raw = self.prober.run(&ProbeRequest::FirstFrame {
            source: locator.to_string(),
            track,
        })?;
        probe::first_frame_time(track, &raw)
    }
}

fn locator_for(source: &Source, clip: Option<&RecordedClip>) -> String {
    clip.map(RecordedClip::locator)
        .unwrap_or_else(|| source.uri.clone())
}

fn warn_on_mismatch(source: &Source, mismatch: Option<CountMismatch>) {
    if let Some(mismatch) = mismatch {
        warn!("{}: {}", source.name, mismatch);
    }
}

fn record(report: SourceReport, aggregator: &mut Aggregator) -> SourceReport {
    aggregator.push(report.result.clone());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfigBuilder, Measurement};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FixedProber {
        video: String,
        audio: String,
        banner: String,
        requests: Mutex<Vec<ProbeRequest>>,
    }

    impl FixedProber {
        fn new(video: &str, audio: &str) -> Self {
            Self {
                video: video.to_string(),
                audio: audio.to_string(),
                banner: String::new(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProbeRunner for FixedProber {
        fn run(&self, request: &ProbeRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(match request {
                ProbeRequest::Frames { track: TrackKind::Video, .. }
                | ProbeRequest::FirstFrame { track: TrackKind::Video, .. } => self.video.clone(),
                ProbeRequest::Frames { .. } | ProbeRequest::FirstFrame { .. } => {
                    self.audio.clone()
                }
                ProbeRequest::StreamInfo { .. } => self.banner.clone(),
            })
        }
    }

    struct NoRecorder;

    impl ClipRecorder for NoRecorder {
        fn record(&self, _source: &str, _seconds: u32, _align: bool) -> Result<RecordedClip> {
            Err(DesyncError::Recording("recording disabled".to_string()))
        }
    }

    struct TempRecorder {
        base: PathBuf,
    }

    impl ClipRecorder for TempRecorder {
        fn record(&self, _source: &str, seconds: u32, align: bool) -> Result<RecordedClip> {
            assert_eq!(seconds, 7);
            assert!(!align);
            let dir = tempfile::Builder::new().tempdir_in(&self.base)?;
            let path = dir.path().join("clip.mkv");
            std::fs::write(&path, b"")?;
            Ok(RecordedClip::new(dir, path))
        }
    }

    fn csv(pts: &[f64]) -> String {
        pts.iter()
            .map(|p| format!("a,b,c,d,{p},f,g,h,i,j,0.02\n"))
            .collect()
    }

    #[test]
    fn test_track_diff_appends_result() {
        let prober = FixedProber::new(&csv(&[0.0, 0.6, 1.2]), &csv(&[0.0, 0.5, 1.0]));
        let config = AnalysisConfigBuilder::new().method(Method::TrackDiff).build();
        let analyzer = Analyzer::new(config, prober, NoRecorder).unwrap();
        let mut agg = Aggregator::new();

        let report = analyzer
            .track_diff(&Source::new("hall", "/m/hall.mkv", "apt-1"), &mut agg)
            .unwrap();

        assert_eq!(report.verdict, Verdict::InSync);
        assert!((report.result.primary_metric - 0.1).abs() < 1e-9);
        assert_eq!(agg.results()[0].source_label, "apt-1");
        assert_eq!(agg.results()[0].source_identifier, "/m/hall.mkv");
    }

    #[test]
    fn test_insufficient_packets_records_nothing() {
        let prober = FixedProber::new(&csv(&[0.0]), &csv(&[0.0]));
        let config = AnalysisConfigBuilder::new().method(Method::Drift).build();
        let analyzer = Analyzer::new(config, prober, NoRecorder).unwrap();
        let mut agg = Aggregator::new();

        let err = analyzer.drift(&Source::single("x"), &mut agg).unwrap_err();
        assert!(err.is_insufficient_packets());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_recorded_mode_probes_clip_and_cleans_up() {
        let base = tempfile::tempdir().unwrap();
        let prober = FixedProber::new(&csv(&[0.0, 0.5]), &csv(&[0.0, 0.5]));
        let config = AnalysisConfigBuilder::new()
            .method(Method::TrackDiff)
            .measurement(Measurement::Seconds(7))
            .source_mode(SourceMode::Recorded)
            .build();
        let recorder = TempRecorder {
            base: base.path().to_path_buf(),
        };
        let analyzer = Analyzer::new(config, &prober, recorder).unwrap();
        let mut agg = Aggregator::new();

        analyzer
            .analyze(&Source::single("rtsp://cam/live"), &mut agg)
            .unwrap();

        let requests = prober.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].source().starts_with(base.path().to_str().unwrap()));
        assert!(matches!(
            requests[1],
            ProbeRequest::Frames {
                interval: ReadInterval::Seconds(7),
                ..
            }
        ));
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfigBuilder::new().jobs(0).build();
        let prober = FixedProber::new("", "");
        assert!(Analyzer::new(config, prober, NoRecorder).is_err());
    }
}
