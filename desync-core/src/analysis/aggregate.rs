//! Batch accumulation of per-source results.

use serde::Serialize;

use crate::config::Thresholds;

use super::classify::{classify_summary, Severity, Verdict};
use super::diff::DriftReport;

/// Which measurement a [`DiffResult`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Mean absolute pointwise PTS difference.
    MeanAbsDiff,
    /// Change between the first and last audio packet deltas.
    TotalDriftChange,
    /// Signed video minus audio stream start time.
    StartOffset,
    /// Signed video minus audio first packet time.
    FirstPacketOffset,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::MeanAbsDiff => "mean diff",
            MetricKind::TotalDriftChange => "drift change",
            MetricKind::StartOffset => "start offset",
            MetricKind::FirstPacketOffset => "first packet offset",
        }
    }
}

/// Duration figures recorded alongside drift results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftDetails {
    pub video_duration: f64,
    pub audio_duration: f64,
    pub total_duration_diff: f64,
    pub duration_diff_rate: f64,
}

impl From<&DriftReport> for DriftDetails {
    fn from(report: &DriftReport) -> Self {
        Self {
            video_duration: report.video_duration,
            audio_duration: report.audio_duration,
            total_duration_diff: report.total_duration_diff,
            duration_diff_rate: report.duration_diff_rate,
        }
    }
}

/// Outcome of comparing the tracks of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    /// Group (apartment) the source belongs to.
    pub source_label: String,
    /// Camera or stream identifier.
    pub source_identifier: String,
    pub metric: MetricKind,
    pub primary_metric: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftDetails>,
}

impl DiffResult {
    pub fn new(
        source_label: impl Into<String>,
        source_identifier: impl Into<String>,
        metric: MetricKind,
        primary_metric: f64,
    ) -> Self {
        Self {
            source_label: source_label.into(),
            source_identifier: source_identifier.into(),
            metric,
            primary_metric,
            drift: None,
        }
    }

    pub fn with_drift(mut self, details: DriftDetails) -> Self {
        self.drift = Some(details);
        self
    }
}

/// One line of the batch summary.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryEntry<'a> {
    #[serde(flatten)]
    pub result: &'a DiffResult,
    pub verdict: Verdict,
    pub severity: Severity,
}

/// Ordered, append-only list of results for one batch run.
#[derive(Debug, Default, Clone)]
pub struct Aggregator {
    results: Vec<DiffResult>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: DiffResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[DiffResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Clears all results so the aggregator can serve another run.
    pub fn reset(&mut self) {
        self.results.clear();
    }

    /// Classifies every result in insertion order.
    pub fn summary(&self, thresholds: &Thresholds) -> Vec<SummaryEntry<'_>> {
        self.results
            .iter()
            .map(|result| {
                let verdict = classify_summary(result.metric, result.primary_metric, thresholds);
                SummaryEntry {
                    result,
                    verdict,
                    severity: verdict.severity(),
                }
            })
            .collect()
    }

    /// Worst severity in the summary, `InSync` when empty.
    pub fn worst_severity(&self, thresholds: &Thresholds) -> Severity {
        self.summary(thresholds)
            .iter()
            .map(|entry| entry.severity)
            .max()
            .unwrap_or(Severity::InSync)
    }
}
