// ============================================================================
// desync-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for AnalysisConfig
//
// This module implements the builder pattern for AnalysisConfig, providing a
// fluent API for assembling a batch configuration from CLI arguments. Fields
// that are never set keep the defaults from the parent module.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::{AnalysisConfig, Measurement, Method, SourceMode, Thresholds};

/// Builder for creating AnalysisConfig instances.
///
/// # Examples
///
/// ```rust
/// use desync_core::config::{AnalysisConfigBuilder, Measurement, Method, SourceMode};
///
/// let config = AnalysisConfigBuilder::new()
///     .method(Method::TrackDiff)
///     .measurement(Measurement::Seconds(10))
///     .source_mode(SourceMode::Recorded)
///     .temp_dir("/tmp/desync")
///     .jobs(4)
///     .build();
/// assert_eq!(config.jobs, 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the analysis method.
    pub fn method(mut self, method: Method) -> Self {
        self.config.method = method;
        self
    }

    /// Sets how much of each source is sampled.
    pub fn measurement(mut self, measurement: Measurement) -> Self {
        self.config.measurement = measurement;
        self
    }

    /// Sets whether sources are probed directly or through a recorded slice.
    pub fn source_mode(mut self, mode: SourceMode) -> Self {
        self.config.source_mode = mode;
        self
    }

    /// Replaces all verdict thresholds.
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Overrides the batch desync limit for mean track differences.
    pub fn track_desync_threshold(mut self, seconds: f64) -> Self {
        self.config.thresholds.track_desync = seconds;
        self
    }

    /// Overrides the batch summary limit for drift entries.
    pub fn aggregate_drift_threshold(mut self, seconds: f64) -> Self {
        self.config.thresholds.aggregate_drift = seconds;
        self
    }

    /// Sets the ffprobe analyze duration and probe size for frame sampling.
    pub fn probe_size<S: Into<String>>(mut self, size: S) -> Self {
        self.config.probe_size = size.into();
        self
    }

    /// Sets the directory for recorded slices.
    pub fn temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    /// Sets the recorded slice length in seconds.
    pub fn clip_seconds(mut self, seconds: Option<u32>) -> Self {
        self.config.clip_seconds = seconds;
        self
    }

    /// Sets the number of sources analyzed at once.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Builds the configuration. Call `validate()` on the result before use.
    pub fn build(self) -> AnalysisConfig {
        self.config
    }
}
