//! Probe output parsing.
//!
//! Turns raw ffprobe output into [`TrackSample`]s and scalar start times.
//! The field offsets of ffprobe's CSV frame layout live here and nowhere
//! else; if the tool's default output changes, this is the file to touch.
//!
//! Parsing is lenient: a line that does not match the frame layout, or whose
//! timestamp does not parse, is dropped. Partial trailing lines are normal
//! when sampling a live stream and must not abort the whole parse.

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{DesyncError, Result};
use crate::packet::{TrackKind, TrackSample};

/// `-show_frames -of csv=p=0`: skip four fields, capture the presentation
/// time, skip five more, capture the duration.
static FRAME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:[\w.]+,){4}([^,\r\n]+),(?:[\w.]+,){5}([^,\r\n]+)")
        .expect("frame line pattern is valid")
});

static VIDEO_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Stream #\d+:\d+.*Video.*start\s+([\d.]+)").expect("video start pattern is valid")
});

static AUDIO_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Stream #\d+:\d+.*Audio.*start\s+([\d.]+)").expect("audio start pattern is valid")
});

/// Shape of a probe response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// One comma-separated line per frame.
    Csv,
    /// `{"frames": [{"stream_index": 0, "pts_time": "0.000"}, ...]}`
    Json,
}

impl OutputShape {
    /// ffprobe `-of` writer producing this shape.
    pub fn ffprobe_writer(self) -> &'static str {
        match self {
            OutputShape::Csv => "csv=p=0",
            OutputShape::Json => "json",
        }
    }
}

#[derive(Debug, Deserialize)]
struct FrameList {
    #[serde(default)]
    frames: Vec<FrameEntry>,
}

#[derive(Debug, Deserialize)]
struct FrameEntry {
    pts_time: Option<String>,
    #[serde(alias = "pkt_duration_time")]
    duration_time: Option<String>,
}

/// Parses one track's probe output in the given shape.
pub fn parse_track(kind: TrackKind, raw: &str, shape: OutputShape) -> Result<TrackSample> {
    match shape {
        OutputShape::Csv => Ok(parse_csv_frames(kind, raw)),
        OutputShape::Json => parse_json_frames(kind, raw),
    }
}

/// Parses CSV frame lines. Never fails; unusable lines are skipped.
pub fn parse_csv_frames(kind: TrackKind, raw: &str) -> TrackSample {
    let mut matched = 0usize;
    let timings: Vec<(f64, f64)> = FRAME_LINE
        .captures_iter(raw)
        .filter_map(|caps| {
            matched += 1;
            let pts = parse_seconds(&caps[1]);
            let duration = parse_seconds(&caps[2]);
            match (pts, duration) {
                (Some(pts), Some(duration)) => Some((pts, duration)),
                _ => {
                    trace!("Skipping {} frame with unparsable timing: {:?}", kind, &caps[0]);
                    None
                }
            }
        })
        .collect();

    debug!(
        "Parsed {} {} packets ({} matching lines, {} skipped)",
        timings.len(),
        kind,
        matched,
        matched - timings.len()
    );
    TrackSample::from_timings(kind, timings)
}

/// Parses a JSON frame list, skipping entries without a usable `pts_time`.
pub fn parse_json_frames(kind: TrackKind, raw: &str) -> Result<TrackSample> {
    let list: FrameList = serde_json::from_str(raw)?;
    let total = list.frames.len();
    let timings: Vec<(f64, f64)> = list
        .frames
        .iter()
        .filter_map(|frame| {
            let pts = frame.pts_time.as_deref().and_then(parse_seconds)?;
            let duration = frame
                .duration_time
                .as_deref()
                .and_then(parse_seconds)
                .unwrap_or(0.0);
            Some((pts, duration))
        })
        .collect();

    debug!("Parsed {} of {} {} JSON frames", timings.len(), total, kind);
    Ok(TrackSample::from_timings(kind, timings))
}

/// Reads the presentation time of the first frame in a JSON frame list.
///
/// Only the first entry is consulted. An empty list is reported as an
/// insufficient-packets condition; a missing or malformed `pts_time` is an
/// error for this source.
pub fn first_frame_time(kind: TrackKind, raw: &str) -> Result<f64> {
    let list: FrameList = serde_json::from_str(raw)?;
    let first = list.frames.first().ok_or(DesyncError::InsufficientPackets {
        required: 1,
        available: 0,
    })?;
    let value = first.pts_time.as_deref().unwrap_or_default();
    parse_seconds(value).ok_or_else(|| {
        debug!("First {} frame has unusable pts_time '{}'", kind, value);
        DesyncError::MalformedNumber {
            field: "pts_time",
            value: value.to_string(),
        }
    })
}

/// Extracts a track's start time from the ffprobe stream banner.
pub fn stream_start_time(kind: TrackKind, raw: &str) -> Result<f64> {
    let pattern = match kind {
        TrackKind::Video => &*VIDEO_START,
        TrackKind::Audio => &*AUDIO_START,
    };
    let caps = pattern
        .captures(raw)
        .ok_or(DesyncError::StreamStartNotFound(kind))?;
    let value = &caps[1];
    parse_seconds(value).ok_or_else(|| DesyncError::MalformedNumber {
        field: "start",
        value: value.to_string(),
    })
}

fn parse_seconds(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_line(pts: &str, duration: &str) -> String {
        format!("video,0,1,900,{pts},900,{pts},3600,0.040000,3600,{duration},N/A,N/A,1920,1080")
    }

    #[test]
    fn test_csv_captures_fifth_and_eleventh_fields() {
        let raw = [frame_line("0.000000", "0.040000"), frame_line("0.040000", "0.040000")].join("\n");
        let sample = parse_csv_frames(TrackKind::Video, &raw);
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.packets()[0].presentation_time, 0.0);
        assert_eq!(sample.packets()[1].presentation_time, 0.04);
        assert_eq!(sample.packets()[1].duration, 0.04);
    }

    #[test]
    fn test_csv_skips_unparsable_and_renumbers() {
        let raw = [
            frame_line("0.000000", "0.040000"),
            frame_line("N/A", "0.040000"),
            "garbage line".to_string(),
            frame_line("0.080000", "0.040000"),
            "video,0,1,9".to_string(),
        ]
        .join("\n");
        let sample = parse_csv_frames(TrackKind::Video, &raw);
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.packets()[1].sequence_number, 2);
        assert_eq!(sample.packets()[1].presentation_time, 0.08);
    }

    #[test]
    fn test_csv_empty_input() {
        assert!(parse_csv_frames(TrackKind::Audio, "").is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = [frame_line("1.5", "0.02"), frame_line("1.52", "0.02")].join("\n");
        assert_eq!(
            parse_csv_frames(TrackKind::Audio, &raw),
            parse_csv_frames(TrackKind::Audio, &raw)
        );
    }

    #[test]
    fn test_first_frame_time() {
        let raw = r#"{"frames": [{"stream_index": 1, "pts_time": "0.021000"}, {"stream_index": 1, "pts_time": "bad"}]}"#;
        assert_eq!(first_frame_time(TrackKind::Audio, raw).unwrap(), 0.021);
    }

    #[test]
    fn test_first_frame_time_malformed_is_error() {
        let raw = r#"{"frames": [{"stream_index": 0, "pts_time": "N/A"}]}"#;
        let err = first_frame_time(TrackKind::Video, raw).unwrap_err();
        assert!(matches!(err, DesyncError::MalformedNumber { field: "pts_time", .. }));
    }

    #[test]
    fn test_first_frame_time_empty_list() {
        let err = first_frame_time(TrackKind::Video, r#"{"frames": []}"#).unwrap_err();
        assert!(err.is_insufficient_packets());
        let err = first_frame_time(TrackKind::Video, "{}").unwrap_err();
        assert!(err.is_insufficient_packets());
    }

    #[test]
    fn test_json_frames_skip_bad_entries() {
        let raw = r#"{"frames": [
            {"stream_index": 0, "pts_time": "0.0", "pkt_duration_time": "0.04"},
            {"stream_index": 0},
            {"stream_index": 0, "pts_time": "0.08"}
        ]}"#;
        let sample = parse_track(TrackKind::Video, raw, OutputShape::Json).unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.packets()[0].duration, 0.04);
        assert_eq!(sample.packets()[1].duration, 0.0);
    }

    #[test]
    fn test_stream_start_time() {
        let raw = "  Stream #0:0: Video: h264 (High), yuv420p, 1920x1080, start 1.400000\n  Stream #0:1: Audio: pcm_mulaw, 8000 Hz, mono, start 1.250000\n";
        assert_eq!(stream_start_time(TrackKind::Video, raw).unwrap(), 1.4);
        assert_eq!(stream_start_time(TrackKind::Audio, raw).unwrap(), 1.25);
    }

    #[test]
    fn test_stream_start_time_missing_and_malformed() {
        let raw = "  Stream #0:0: Video: h264, start 1.2.3\n";
        assert!(matches!(
            stream_start_time(TrackKind::Audio, raw).unwrap_err(),
            DesyncError::StreamStartNotFound(TrackKind::Audio)
        ));
        assert!(matches!(
            stream_start_time(TrackKind::Video, raw).unwrap_err(),
            DesyncError::MalformedNumber { field: "start", .. }
        ));
    }
}
