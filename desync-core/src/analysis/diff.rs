//! Diff and drift calculations over aligned track samples.
//!
//! Packets are aligned by index: `video[i]` is paired with `audio[i]` for
//! `i < min(len(video), len(audio))`. Everything here is pure; logging of
//! the results is left to the caller.

use serde::Serialize;

use crate::error::{DesyncError, Result};
use crate::packet::{Packet, TrackSample};

/// The two tracks yielded different packet counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountMismatch {
    /// More video packets than audio packets.
    NotEnoughAudio { video: usize, audio: usize },
    /// More audio packets than video packets.
    NotEnoughVideo { video: usize, audio: usize },
}

impl std::fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountMismatch::NotEnoughAudio { video, audio } => write!(
                f,
                "Not enough audio packets ({audio} audio vs {video} video). Possible desync"
            ),
            CountMismatch::NotEnoughVideo { video, audio } => write!(
                f,
                "Not enough video packets ({video} video vs {audio} audio). Possible desync"
            ),
        }
    }
}

/// Flags a packet-count mismatch. Informative only; metrics are still
/// computed over the overlapping range.
pub fn count_mismatch(video: &TrackSample, audio: &TrackSample) -> Option<CountMismatch> {
    let (v, a) = (video.len(), audio.len());
    if v > a {
        Some(CountMismatch::NotEnoughAudio { video: v, audio: a })
    } else if v < a {
        Some(CountMismatch::NotEnoughVideo { video: v, audio: a })
    } else {
        None
    }
}

/// Number of index-aligned packet pairs.
pub fn comparable_packets(video: &TrackSample, audio: &TrackSample) -> usize {
    video.len().min(audio.len())
}

fn require(available: usize, required: usize) -> Result<()> {
    if available < required {
        return Err(DesyncError::InsufficientPackets {
            required,
            available,
        });
    }
    Ok(())
}

/// One aligned packet pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairDiff {
    pub video: Packet,
    pub audio: Packet,
    /// `|video.pts - audio.pts|`
    pub diff: f64,
}

/// Pointwise comparison of two tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackDiffReport {
    pub rows: Vec<PairDiff>,
    pub comparable: usize,
    /// Arithmetic mean of the absolute PTS differences.
    pub mean_abs_diff: f64,
    pub mismatch: Option<CountMismatch>,
}

/// Mean absolute PTS difference of index-aligned packets.
///
/// Fails with `InsufficientPackets` when there is no comparable pair.
pub fn track_diff(video: &TrackSample, audio: &TrackSample) -> Result<TrackDiffReport> {
    let comparable = comparable_packets(video, audio);
    let mismatch = count_mismatch(video, audio);
    require(comparable, 1)?;

    let rows: Vec<PairDiff> = video
        .packets()
        .iter()
        .zip(audio.packets())
        .map(|(v, a)| PairDiff {
            video: *v,
            audio: *a,
            diff: (v.presentation_time - a.presentation_time).abs(),
        })
        .collect();

    let mean_abs_diff = rows.iter().map(|r| r.diff).sum::<f64>() / comparable as f64;

    Ok(TrackDiffReport {
        rows,
        comparable,
        mean_abs_diff,
        mismatch,
    })
}

/// Convenience wrapper returning only the mean absolute difference.
pub fn mean_abs_diff(video: &TrackSample, audio: &TrackSample) -> Result<f64> {
    track_diff(video, audio).map(|report| report.mean_abs_diff)
}

/// One row of the drift table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftRow {
    pub number: usize,
    pub video_pts: f64,
    pub audio_pts: f64,
    /// PTS delta from the previous audio packet (0 for the first).
    pub audio_delta: f64,
    /// Change of `audio_delta` from the previous row (0 for the first).
    pub drift_from_prev: f64,
}

/// Drift of successive audio packet deltas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub rows: Vec<DriftRow>,
    pub comparable: usize,
    pub first_delta: f64,
    pub last_delta: f64,
    /// Mean of the audio deltas, the first (zero) delta included.
    pub avg_delta: f64,
    /// `last_delta - first_delta`
    pub total_drift_change: f64,
    /// `total_drift_change / (comparable - 1)`
    pub drift_rate: f64,
    /// Sum of video packet durations over the comparable range.
    pub video_duration: f64,
    /// Sum of audio packet durations over the comparable range.
    pub audio_duration: f64,
    /// `video_duration - audio_duration`
    pub total_duration_diff: f64,
    /// `total_duration_diff / comparable`
    pub duration_diff_rate: f64,
    pub mismatch: Option<CountMismatch>,
}

/// Computes the drift report. Needs at least two comparable packets.
pub fn drift(video: &TrackSample, audio: &TrackSample) -> Result<DriftReport> {
    let comparable = comparable_packets(video, audio);
    let mismatch = count_mismatch(video, audio);
    require(comparable, 2)?;

    let audio_packets = &audio.packets()[..comparable];
    let video_packets = &video.packets()[..comparable];

    let deltas: Vec<f64> = std::iter::once(0.0)
        .chain(
            audio_packets
                .windows(2)
                .map(|pair| pair[1].presentation_time - pair[0].presentation_time),
        )
        .collect();

    let rows: Vec<DriftRow> = (0..comparable)
        .map(|i| DriftRow {
            number: audio_packets[i].sequence_number,
            video_pts: video_packets[i].presentation_time,
            audio_pts: audio_packets[i].presentation_time,
            audio_delta: deltas[i],
            drift_from_prev: if i == 0 { 0.0 } else { deltas[i] - deltas[i - 1] },
        })
        .collect();

    let first_delta = deltas[0];
    let last_delta = deltas[comparable - 1];
    let avg_delta = deltas.iter().sum::<f64>() / comparable as f64;
    let total_drift_change = last_delta - first_delta;
    let drift_rate = total_drift_change / (comparable - 1) as f64;

    let video_duration: f64 = video_packets.iter().map(|p| p.duration).sum();
    let audio_duration: f64 = audio_packets.iter().map(|p| p.duration).sum();
    let total_duration_diff = video_duration - audio_duration;

    Ok(DriftReport {
        rows,
        comparable,
        first_delta,
        last_delta,
        avg_delta,
        total_drift_change,
        drift_rate,
        video_duration,
        audio_duration,
        total_duration_diff,
        duration_diff_rate: total_duration_diff / comparable as f64,
        mismatch,
    })
}

/// Signed offset between two track start timestamps.
pub fn start_offset(video_start: f64, audio_start: f64) -> f64 {
    video_start - audio_start
}
