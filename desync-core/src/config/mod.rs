//! Configuration structures and constants for the desync-core library.
//!
//! This module provides the configuration for a batch run: which analysis
//! method to apply, how much of each source to sample, whether sources are
//! probed directly or through a recorded slice, and the verdict thresholds.

mod builder;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DesyncError;

pub use builder::AnalysisConfigBuilder;

// Default constants

/// Start-time offset above which the tracks are reported as mismatched (seconds).
pub const DEFAULT_START_MISMATCH: f64 = 0.1;

/// Start-time offset above which a small difference is reported (seconds).
pub const DEFAULT_START_SMALL_DIFF: f64 = 0.01;

/// Total drift change above which drift is reported (seconds).
pub const DEFAULT_DRIFT_CHANGE: f64 = 0.1;

/// Average successive-packet delta above which a fixed offset is reported (seconds).
pub const DEFAULT_FIXED_OFFSET: f64 = 0.5;

/// Batch summary limit for drift entries (seconds).
pub const DEFAULT_AGGREGATE_DRIFT: f64 = 1.0;

/// Mean absolute PTS difference above which a source is desynchronized (seconds).
pub const DEFAULT_TRACK_DESYNC: f64 = 0.5;

/// Maximum first-packet PTS distance still considered in sync (seconds).
pub const DEFAULT_FIRST_PACKET_TOLERANCE: f64 = 1.0;

/// ffprobe `-analyzeduration`/`-probesize` used for frame sampling.
pub const DEFAULT_PROBE_SIZE: &str = "5M";

/// ffprobe `-analyzeduration`/`-probesize` used for the stream banner.
pub const DEFAULT_STREAM_INFO_PROBE_SIZE: &str = "10M";

/// Directory where recorded slices are written.
pub const DEFAULT_TEMP_DIR: &str = "./temp";

/// The analysis applied to every source of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Mean absolute PTS difference of index-aligned packets.
    TrackDiff,
    /// Drift of successive audio packet deltas.
    Drift,
    /// Compare the first video and audio packet timestamps.
    FirstPackets,
    /// Compare the stream start times from the probe banner.
    StartDiff,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::TrackDiff => "trackdiff",
            Method::Drift => "drift",
            Method::FirstPackets => "firstpackets",
            Method::StartDiff => "startdiff",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = DesyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trackdiff" => Ok(Method::TrackDiff),
            "drift" => Ok(Method::Drift),
            "firstpackets" => Ok(Method::FirstPackets),
            "startdiff" => Ok(Method::StartDiff),
            other => Err(DesyncError::Config(format!(
                "unknown method '{other}' (expected trackdiff, drift, firstpackets or startdiff)"
            ))),
        }
    }
}

/// How much of a source to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Measurement {
    /// Read this many packets per track.
    Packets(u32),
    /// Read this many seconds per track.
    Seconds(u32),
}

impl Measurement {
    pub fn value(&self) -> u32 {
        match self {
            Measurement::Packets(n) | Measurement::Seconds(n) => *n,
        }
    }
}

/// Whether a source is probed in place or through a recorded slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceMode {
    Direct,
    Recorded,
}

/// Verdict thresholds, in seconds.
///
/// The defaults differ by mode and are kept exactly as the operators know
/// them; override a field only when it is explicitly requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub start_mismatch: f64,
    pub start_small_diff: f64,
    pub drift_change: f64,
    pub fixed_offset: f64,
    pub aggregate_drift: f64,
    pub track_desync: f64,
    pub first_packet_tolerance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            start_mismatch: DEFAULT_START_MISMATCH,
            start_small_diff: DEFAULT_START_SMALL_DIFF,
            drift_change: DEFAULT_DRIFT_CHANGE,
            fixed_offset: DEFAULT_FIXED_OFFSET,
            aggregate_drift: DEFAULT_AGGREGATE_DRIFT,
            track_desync: DEFAULT_TRACK_DESYNC,
            first_packet_tolerance: DEFAULT_FIRST_PACKET_TOLERANCE,
        }
    }
}

impl Thresholds {
    fn validate(&self) -> Result<(), DesyncError> {
        let named = [
            ("start_mismatch", self.start_mismatch),
            ("start_small_diff", self.start_small_diff),
            ("drift_change", self.drift_change),
            ("fixed_offset", self.fixed_offset),
            ("aggregate_drift", self.aggregate_drift),
            ("track_desync", self.track_desync),
            ("first_packet_tolerance", self.first_packet_tolerance),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(DesyncError::Config(format!(
                    "threshold {name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Main configuration for a batch run.
///
/// Built by the CLI through [`AnalysisConfigBuilder`] and shared by every
/// per-source analysis of the run.
///
/// # Examples
///
/// ```rust
/// use desync_core::config::{AnalysisConfigBuilder, Measurement, Method, SourceMode};
///
/// let config = AnalysisConfigBuilder::new()
///     .method(Method::Drift)
///     .measurement(Measurement::Packets(200))
///     .source_mode(SourceMode::Direct)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub method: Method,
    pub measurement: Measurement,
    pub source_mode: SourceMode,
    pub thresholds: Thresholds,

    /// `-analyzeduration`/`-probesize` for frame sampling
    pub probe_size: String,

    /// `-analyzeduration`/`-probesize` for the stream banner
    pub stream_info_probe_size: String,

    /// Where recorded slices are written
    pub temp_dir: PathBuf,

    /// Recorded slice length in seconds; falls back to the measurement value
    pub clip_seconds: Option<u32>,

    /// Number of sources analyzed at once
    pub jobs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            method: Method::StartDiff,
            measurement: Measurement::Packets(100),
            source_mode: SourceMode::Direct,
            thresholds: Thresholds::default(),
            probe_size: DEFAULT_PROBE_SIZE.to_string(),
            stream_info_probe_size: DEFAULT_STREAM_INFO_PROBE_SIZE.to_string(),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            clip_seconds: None,
            jobs: 1,
        }
    }
}

impl AnalysisConfig {
    /// Checks the configuration for values that would make every analysis fail.
    pub fn validate(&self) -> Result<(), DesyncError> {
        if self.measurement.value() == 0 {
            return Err(DesyncError::Config(
                "measurement must be at least 1 packet or second".to_string(),
            ));
        }
        if self.clip_seconds == Some(0) {
            return Err(DesyncError::Config(
                "clip length must be at least 1 second".to_string(),
            ));
        }
        if self.jobs == 0 {
            return Err(DesyncError::Config("jobs must be at least 1".to_string()));
        }
        self.thresholds.validate()
    }

    /// Length of a recorded slice in seconds.
    pub fn clip_length(&self) -> u32 {
        self.clip_seconds.unwrap_or_else(|| self.measurement.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_match_domain_constants() {
        let t = Thresholds::default();
        assert_eq!(t.start_mismatch, 0.1);
        assert_eq!(t.start_small_diff, 0.01);
        assert_eq!(t.drift_change, 0.1);
        assert_eq!(t.fixed_offset, 0.5);
        assert_eq!(t.aggregate_drift, 1.0);
        assert_eq!(t.track_desync, 0.5);
        assert_eq!(t.first_packet_tolerance, 1.0);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("trackdiff".parse::<Method>().unwrap(), Method::TrackDiff);
        assert_eq!("DRIFT".parse::<Method>().unwrap(), Method::Drift);
        assert_eq!("firstpackets".parse::<Method>().unwrap(), Method::FirstPackets);
        assert_eq!(" startdiff ".parse::<Method>().unwrap(), Method::StartDiff);
        assert!("median".parse::<Method>().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_measurement() {
        let config = AnalysisConfig {
            measurement: Measurement::Seconds(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let mut config = AnalysisConfig::default();
        config.thresholds.track_desync = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clip_length_falls_back_to_measurement() {
        let mut config = AnalysisConfig {
            measurement: Measurement::Packets(30),
            ..Default::default()
        };
        assert_eq!(config.clip_length(), 30);
        config.clip_seconds = Some(12);
        assert_eq!(config.clip_length(), 12);
    }
}
