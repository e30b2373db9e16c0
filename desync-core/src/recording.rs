// ============================================================================
// desync-core/src/recording.rs
// ============================================================================
//
// CLIP RECORDING: Bounded Slices of Live Sources
//
// When a source is analyzed through a recorded slice, ffmpeg first writes a
// short .mkv clip and the prober reads the clip instead of the live source.
// Each clip lives in its own temporary directory owned by the RecordedClip,
// so the analysis that created it is the only one that can see it and the
// file is removed when the clip is dropped, on success and on error alike.

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use log::{debug, info, warn};
use tempfile::{Builder as TempFileBuilder, TempDir};

// ---- Standard library imports ----
use std::path::{Path, PathBuf};

// ---- Internal crate imports ----
use crate::error::{DesyncError, Result};

/// Audio samples per frame in recorded clips.
const AUDIO_FRAME_SAMPLES: u32 = 320;

/// A recorded slice of a source. The file is deleted on drop.
#[derive(Debug)]
pub struct RecordedClip {
    path: PathBuf,
    _dir: TempDir,
}

impl RecordedClip {
    /// Wraps a clip written inside `dir`; the directory is removed with the clip.
    pub fn new(dir: TempDir, path: PathBuf) -> Self {
        Self { path, _dir: dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as a probe source locator.
    pub fn locator(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Records bounded slices of sources.
pub trait ClipRecorder: Sync {
    /// Records `seconds` of `source`. With `align`, both tracks are
    /// re-timed to start at zero.
    fn record(&self, source: &str, seconds: u32, align: bool) -> Result<RecordedClip>;
}

/// Records clips with ffmpeg through ffmpeg-sidecar.
#[derive(Debug, Clone)]
pub struct FfmpegRecorder {
    temp_dir: PathBuf,
}

impl FfmpegRecorder {
    pub fn new<P: Into<PathBuf>>(temp_dir: P) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }
}

/// ffmpeg arguments that record `seconds` of `source` into `output`.
pub fn clip_args(source: &str, seconds: u32, align: bool, output: &Path) -> Vec<String> {
    let (video_filter, audio_filter) = if align {
        (
            "setpts=PTS-STARTPTS".to_string(),
            format!("asetnsamples={AUDIO_FRAME_SAMPLES},asetpts=PTS-STARTPTS"),
        )
    } else {
        ("null".to_string(), format!("asetnsamples={AUDIO_FRAME_SAMPLES}"))
    };

    let mut args = Vec::new();
    if source.contains("rtsp") {
        args.extend(["-rtsp_transport".to_string(), "tcp".to_string()]);
    }
    args.extend([
        "-i".to_string(),
        source.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "pcm_mulaw".to_string(),
        "-vf".to_string(),
        video_filter,
        "-af".to_string(),
        audio_filter,
        "-t".to_string(),
        seconds.to_string(),
        "-y".to_string(),
        output.to_string_lossy().into_owned(),
    ]);
    args
}

impl ClipRecorder for FfmpegRecorder {
    fn record(&self, source: &str, seconds: u32, align: bool) -> Result<RecordedClip> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let dir = TempFileBuilder::new()
            .prefix("desync-clip-")
            .tempdir_in(&self.temp_dir)?;
        let output = dir.path().join("clip.mkv");

        info!("Recording {}s of {} to {}", seconds, source, output.display());

        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.args(clip_args(source, seconds, align, &output));
        debug!("Running clip recording command: {:?}", cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| DesyncError::Recording(format!("failed to start ffmpeg: {e}")))?;

        // Drain events so ffmpeg never blocks on a full pipe.
        let mut last_error = None;
        let events = child
            .iter()
            .map_err(|e| DesyncError::Recording(format!("failed to read ffmpeg output: {e}")))?;
        for event in events {
            match event {
                FfmpegEvent::Error(msg) | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) => {
                    warn!("ffmpeg: {}", msg);
                    last_error = Some(msg);
                }
                _ => {}
            }
        }

        let status = child
            .wait()
            .map_err(|e| DesyncError::Recording(format!("failed waiting for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(DesyncError::Recording(format!(
                "ffmpeg exited with {}: {}",
                status,
                last_error.unwrap_or_else(|| "no error output".to_string())
            )));
        }
        if !output.exists() {
            return Err(DesyncError::Recording(format!(
                "ffmpeg produced no clip for {source}"
            )));
        }

        Ok(RecordedClip::new(dir, output))
    }
}
