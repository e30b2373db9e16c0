//! Core library for detecting audio/video desynchronization using ffprobe.
//!
//! This crate samples the video and audio tracks of a media file or live
//! stream, compares their packet timestamps, and classifies the result as in
//! sync, offset or desynchronized. Results from many sources are collected
//! in an [`Aggregator`] for a batch summary.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use desync_core::{
//!     Aggregator, AnalysisConfigBuilder, Analyzer, FfmpegRecorder, FfprobeRunner, Method,
//!     Source,
//! };
//!
//! let config = AnalysisConfigBuilder::new().method(Method::Drift).build();
//! let prober = FfprobeRunner::new(&config);
//! let recorder = FfmpegRecorder::new(config.temp_dir.clone());
//! let analyzer = Analyzer::new(config, prober, recorder).unwrap();
//!
//! let mut aggregator = Aggregator::new();
//! let outcome = analyzer.run_batch(&[Source::single("/path/to/clip.mkv")], &mut aggregator);
//!
//! for entry in aggregator.summary(&analyzer.config().thresholds) {
//!     println!("{}: {}", entry.result.source_identifier, entry.verdict);
//! }
//! assert_eq!(outcome.outcomes.len(), 1);
//! ```

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod packet;
pub mod probe;
pub mod recording;
pub mod sources;
pub mod util;

// Re-exports for public API
pub use analysis::{Aggregator, DiffResult, MetricKind, Severity, SummaryEntry, Verdict};
pub use analyzer::{Analyzer, BatchOutcome, MethodReport, SourceOutcome, SourceReport};
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, Measurement, Method, SourceMode, Thresholds,
};
pub use error::{DesyncError, Result};
pub use packet::{Packet, TrackKind, TrackSample};
pub use probe::{FfprobeRunner, ProbeRequest, ProbeRunner};
pub use recording::{ClipRecorder, FfmpegRecorder, RecordedClip};
pub use sources::{Source, load_source_list, parse_source_list};
