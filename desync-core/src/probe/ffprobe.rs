//! FFprobe-backed probe runner.
//!
//! Builds an argument vector per [`ProbeRequest`] and runs `ffprobe`
//! directly, without a shell, so source locators never need quoting.

use std::process::Command;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::util::command;

use super::{ProbeRequest, ProbeRunner};

/// Runs probe requests with the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeRunner {
    program: String,
    probe_size: String,
    stream_info_probe_size: String,
}

impl FfprobeRunner {
    /// Create a runner using `ffprobe` from `PATH` and the configured probe sizes
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            program: "ffprobe".to_string(),
            probe_size: config.probe_size.clone(),
            stream_info_probe_size: config.stream_info_probe_size.clone(),
        }
    }

    /// Use a different ffprobe binary
    pub fn with_program<S: Into<String>>(mut self, program: S) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to ffprobe for a request.
    pub fn args(&self, request: &ProbeRequest) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match request {
            ProbeRequest::Frames { source, track, interval } => {
                args.extend(["-v", "quiet"].map(String::from));
                push_probe_size(&mut args, &self.probe_size);
                args.extend([
                    "-i".to_string(),
                    source.clone(),
                    "-select_streams".to_string(),
                    track.selector().to_string(),
                    "-show_frames".to_string(),
                    "-read_intervals".to_string(),
                    interval.to_string(),
                ]);
            }
            ProbeRequest::FirstFrame { source, track } => {
                args.extend([
                    "-v".to_string(),
                    "quiet".to_string(),
                    "-show_entries".to_string(),
                    "frame=stream_index,pts_time".to_string(),
                    "-select_streams".to_string(),
                    track.first_stream_selector().to_string(),
                    "-read_intervals".to_string(),
                    "%+1".to_string(),
                    "-i".to_string(),
                    source.clone(),
                ]);
            }
            ProbeRequest::StreamInfo { source } => {
                push_probe_size(&mut args, &self.stream_info_probe_size);
                args.push(source.clone());
            }
        }
        if let Some(shape) = request.shape() {
            args.extend(["-of".to_string(), shape.ffprobe_writer().to_string()]);
        }
        args
    }
}

fn push_probe_size(args: &mut Vec<String>, size: &str) {
    args.extend([
        "-analyzeduration".to_string(),
        size.to_string(),
        "-probesize".to_string(),
        size.to_string(),
    ]);
}

impl ProbeRunner for FfprobeRunner {
    fn run(&self, request: &ProbeRequest) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(request));

        let output = command::run_command(&mut cmd)?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();

        // The stream banner is written to stderr.
        if matches!(request, ProbeRequest::StreamInfo { .. }) {
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::TrackKind;
    use crate::probe::ReadInterval;

    fn runner() -> FfprobeRunner {
        FfprobeRunner::new(&AnalysisConfig::default())
    }

    #[test]
    fn test_frames_args() {
        let req = ProbeRequest::Frames {
            source: "rtsp://cam/1".to_string(),
            track: TrackKind::Audio,
            interval: ReadInterval::Packets(100),
        };
        let args = runner().args(&req);
        assert_eq!(
            args,
            vec![
                "-v", "quiet", "-analyzeduration", "5M", "-probesize", "5M", "-i", "rtsp://cam/1",
                "-select_streams", "a", "-show_frames", "-read_intervals", "%+#100", "-of", "csv=p=0",
            ]
        );
    }

    #[test]
    fn test_first_frame_args() {
        let req = ProbeRequest::FirstFrame {
            source: "clip.mkv".to_string(),
            track: TrackKind::Video,
        };
        let args = runner().args(&req);
        assert!(args.windows(2).any(|w| w == ["-select_streams", "v:0"]));
        assert!(args.windows(2).any(|w| w == ["-of", "json"]));
        assert!(args.windows(2).any(|w| w == ["-i", "clip.mkv"]));
    }

    #[test]
    fn test_stream_info_args() {
        let req = ProbeRequest::StreamInfo { source: "clip.mkv".to_string() };
        assert_eq!(
            runner().args(&req),
            vec!["-analyzeduration", "10M", "-probesize", "10M", "clip.mkv"]
        );
    }

    #[test]
    fn test_missing_binary_is_command_start_error() {
        let runner = runner().with_program("definitely-not-ffprobe-binary");
        let req = ProbeRequest::StreamInfo { source: "x".to_string() };
        let err = runner.run(&req).unwrap_err();
        assert!(matches!(err, crate::DesyncError::CommandStart { .. }));
    }
}
