//! Verdicts for computed metrics.
//!
//! Each mode has its own thresholds (see [`Thresholds`]). Comparisons are
//! strict `>` except for the first-packet rule, which accepts a distance
//! equal to its tolerance.

use std::fmt;

use serde::Serialize;

use crate::config::Thresholds;

use super::aggregate::MetricKind;

/// Coarse severity shared by all verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    InSync,
    Offset,
    Desynced,
}

/// Mode-specific verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// Start times are aligned.
    Aligned,
    /// Small start time difference.
    SmallDifference,
    /// Start time mismatch.
    Mismatch,
    /// Streams are in sync.
    InSync,
    /// Constant offset without drift.
    FixedOffset,
    /// Drift detected.
    DriftDetected,
    /// No significant drift.
    NoSignificantDrift,
    /// Mean track difference above the desync limit.
    Desynchronized,
    /// First packets too far apart.
    Desynced,
}

impl Verdict {
    pub fn severity(&self) -> Severity {
        match self {
            Verdict::Aligned | Verdict::InSync | Verdict::NoSignificantDrift => Severity::InSync,
            Verdict::SmallDifference | Verdict::FixedOffset => Severity::Offset,
            Verdict::Mismatch
            | Verdict::DriftDetected
            | Verdict::Desynchronized
            | Verdict::Desynced => Severity::Desynced,
        }
    }

    pub fn is_in_sync(&self) -> bool {
        self.severity() == Severity::InSync
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Aligned => "Start times are aligned",
            Verdict::SmallDifference => "Small start time difference",
            Verdict::Mismatch => "START TIME MISMATCH",
            Verdict::InSync => "Streams are in sync",
            Verdict::FixedOffset => "FIXED OFFSET (no drift)",
            Verdict::DriftDetected => "DRIFT DETECTED",
            Verdict::NoSignificantDrift => "No significant drift",
            Verdict::Desynchronized => "Desynchronization spotted",
            Verdict::Desynced => "Tracks are desynced",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Start-time offset: mismatch, small difference or aligned.
pub fn classify_start_offset(diff: f64, t: &Thresholds) -> Verdict {
    let abs = diff.abs();
    if abs > t.start_mismatch {
        Verdict::Mismatch
    } else if abs > t.start_small_diff {
        Verdict::SmallDifference
    } else {
        Verdict::Aligned
    }
}

/// Drift rate: drift takes precedence over a fixed offset.
pub fn classify_drift(total_drift_change: f64, avg_delta: f64, t: &Thresholds) -> Verdict {
    if total_drift_change.abs() > t.drift_change {
        Verdict::DriftDetected
    } else if avg_delta.abs() > t.fixed_offset {
        Verdict::FixedOffset
    } else {
        Verdict::InSync
    }
}

/// Batch summary rule for drift entries.
pub fn classify_aggregate_drift(diff: f64, t: &Thresholds) -> Verdict {
    if diff.abs() > t.aggregate_drift {
        Verdict::DriftDetected
    } else {
        Verdict::NoSignificantDrift
    }
}

/// Batch desync rule for mean track differences. Signed comparison.
pub fn classify_track_desync(diff: f64, t: &Thresholds) -> Verdict {
    if diff > t.track_desync {
        Verdict::Desynchronized
    } else {
        Verdict::InSync
    }
}

/// First-packet comparison.
pub fn classify_first_packets(video_first: f64, audio_first: f64, t: &Thresholds) -> Verdict {
    if (video_first - audio_first).abs() <= t.first_packet_tolerance {
        Verdict::InSync
    } else {
        Verdict::Desynced
    }
}

/// Single-value rule used by the batch summary for a metric kind.
pub fn classify_summary(kind: MetricKind, value: f64, t: &Thresholds) -> Verdict {
    match kind {
        MetricKind::MeanAbsDiff => classify_track_desync(value, t),
        MetricKind::TotalDriftChange => classify_aggregate_drift(value, t),
        MetricKind::StartOffset => classify_start_offset(value, t),
        MetricKind::FirstPacketOffset => classify_first_packets(value, 0.0, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn test_start_offset_boundaries() {
        assert_eq!(classify_start_offset(0.1, &t()), Verdict::SmallDifference);
        assert_eq!(classify_start_offset(0.01, &t()), Verdict::Aligned);
        assert_eq!(classify_start_offset(-0.2, &t()), Verdict::Mismatch);
        assert_eq!(classify_start_offset(0.05, &t()), Verdict::SmallDifference);
        assert_eq!(classify_start_offset(0.0, &t()), Verdict::Aligned);
    }

    #[test]
    fn test_drift_precedence() {
        assert_eq!(classify_drift(1.2, 0.9, &t()), Verdict::DriftDetected);
        assert_eq!(classify_drift(0.05, -0.9, &t()), Verdict::FixedOffset);
        assert_eq!(classify_drift(0.1, 0.5, &t()), Verdict::InSync);
    }

    #[test]
    fn test_aggregate_and_track_rules() {
        assert_eq!(classify_aggregate_drift(-1.5, &t()), Verdict::DriftDetected);
        assert_eq!(classify_aggregate_drift(1.0, &t()), Verdict::NoSignificantDrift);
        assert_eq!(classify_track_desync(0.51, &t()), Verdict::Desynchronized);
        assert_eq!(classify_track_desync(0.5, &t()), Verdict::InSync);
        assert_eq!(classify_track_desync(-3.0, &t()), Verdict::InSync);
    }

    #[test]
    fn test_first_packet_tolerance_inclusive() {
        assert_eq!(classify_first_packets(2.0, 1.0, &t()), Verdict::InSync);
        assert_eq!(classify_first_packets(0.0, 1.5, &t()), Verdict::Desynced);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(Verdict::FixedOffset.severity(), Severity::Offset);
        assert_eq!(Verdict::Mismatch.severity(), Severity::Desynced);
        assert!(Verdict::NoSignificantDrift.is_in_sync());
        assert!(Severity::Desynced > Severity::Offset);
    }
}
