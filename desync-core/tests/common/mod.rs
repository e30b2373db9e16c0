// desync-core/tests/common/mod.rs
//
// Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use desync_core::error::{DesyncError, Result};
use desync_core::probe::ProbeRequest;
use desync_core::{ClipRecorder, ProbeRunner, RecordedClip, TrackKind};

/// Canned probe output for one source.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub video: String,
    pub audio: String,
    pub banner: String,
    pub fail: bool,
}

impl Script {
    pub fn frames(video_pts: &[f64], audio_pts: &[f64]) -> Self {
        Self {
            video: csv_frames(video_pts, 0.04),
            audio: csv_frames(audio_pts, 0.02),
            ..Self::default()
        }
    }

    pub fn banner(video_start: f64, audio_start: f64) -> Self {
        Self {
            banner: stream_banner(video_start, audio_start),
            ..Self::default()
        }
    }

    pub fn first_frames(video_first: f64, audio_first: f64) -> Self {
        Self {
            video: json_first_frame(0, video_first),
            audio: json_first_frame(1, audio_first),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

/// Prober answering from scripts keyed by source locator.
#[derive(Default)]
pub struct ScriptedProber {
    scripts: HashMap<String, Script>,
    pub requests: Mutex<Vec<ProbeRequest>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &str, script: Script) -> Self {
        self.scripts.insert(source.to_string(), script);
        self
    }
}

impl ProbeRunner for ScriptedProber {
    fn run(&self, request: &ProbeRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self.scripts.get(request.source()).cloned().unwrap_or_default();
        if script.fail {
            return Err(DesyncError::CommandFailed {
                program: "ffprobe".to_string(),
                code: 1,
                stderr: format!("{}: Connection refused", request.source()),
            });
        }
        Ok(match request {
            ProbeRequest::Frames { track: TrackKind::Video, .. }
            | ProbeRequest::FirstFrame { track: TrackKind::Video, .. } => script.video,
            ProbeRequest::Frames { .. } | ProbeRequest::FirstFrame { .. } => script.audio,
            ProbeRequest::StreamInfo { .. } => script.banner,
        })
    }
}

/// Recorder that must never be reached.
pub struct UnusedRecorder;

impl ClipRecorder for UnusedRecorder {
    fn record(&self, source: &str, _seconds: u32, _align: bool) -> Result<RecordedClip> {
        Err(DesyncError::Recording(format!("unexpected recording of {source}")))
    }
}

/// ffprobe `-show_frames -of csv=p=0` style lines.
pub fn csv_frames(pts: &[f64], duration: f64) -> String {
    pts.iter()
        .map(|p| format!("video,0,1,1,{p:.6},1,{p:.6},1,{p:.6},1,{duration:.6},N/A,1024\n"))
        .collect()
}

/// ffprobe banner with both stream start times.
pub fn stream_banner(video_start: f64, audio_start: f64) -> String {
    format!(
        "Input #0, rtsp, from 'rtsp://cam/live':\n  \
         Duration: N/A, start: {video_start:.6}, bitrate: N/A\n    \
         Stream #0:0: Video: h264 (Main), yuv420p, 1920x1080, 25 fps, start {video_start:.6}\n    \
         Stream #0:1: Audio: pcm_mulaw, 8000 Hz, mono, s16, 64 kb/s, start {audio_start:.6}\n"
    )
}

/// `-show_entries frame=stream_index,pts_time -of json` output.
pub fn json_first_frame(stream_index: u32, pts: f64) -> String {
    format!(
        "{{\n  \"frames\": [\n    {{\n      \"stream_index\": {stream_index},\n      \"pts_time\": \"{pts:.6}\"\n    }}\n  ]\n}}\n"
    )
}
