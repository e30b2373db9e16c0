// ============================================================================
// desync-core/src/analysis/mod.rs
// ============================================================================
//
// SYNC ANALYSIS: Calculator, Classifier and Aggregator
//
// The pure half of the tool. Given two parsed track samples, the calculator
// (diff.rs) produces pointwise differences and drift statistics; the
// classifier (classify.rs) turns a scalar metric into a verdict using the
// thresholds for that mode; the aggregator (aggregate.rs) collects one
// result per analyzed source and answers the batch summary.
//
// Nothing in this module touches processes or the filesystem.

pub mod aggregate;
pub mod classify;
pub mod diff;

pub use aggregate::{Aggregator, DiffResult, DriftDetails, MetricKind, SummaryEntry};
pub use classify::{
    classify_aggregate_drift, classify_drift, classify_first_packets, classify_start_offset,
    classify_summary, classify_track_desync, Severity, Verdict,
};
pub use diff::{
    comparable_packets, count_mismatch, drift, mean_abs_diff, start_offset, track_diff,
    CountMismatch, DriftReport, DriftRow, PairDiff, TrackDiffReport,
};
