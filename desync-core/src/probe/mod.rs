// ============================================================================
// desync-core/src/probe/mod.rs
// ============================================================================
//
// PROBING: Requests to the External Prober and Parsing of its Output
//
// The analysis engine never runs processes itself. It describes what it
// needs as a ProbeRequest and hands it to a ProbeRunner, which returns the
// raw text. FfprobeRunner is the process-backed runner; tests script their
// own.
//
// KEY COMPONENTS:
// - ProbeRequest / ReadInterval: what to sample from which track
// - ProbeRunner: trait seam for the external prober
// - parser: raw output -> TrackSample / start times

// ---- Standard library imports ----
use std::fmt;

// ---- Internal crate imports ----
use crate::config::Measurement;
use crate::error::Result;
use crate::packet::TrackKind;

pub mod ffprobe;
pub mod parser;

pub use ffprobe::FfprobeRunner;
pub use parser::{OutputShape, first_frame_time, parse_csv_frames, parse_track, stream_start_time};

/// ffprobe `-read_intervals` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadInterval {
    /// `%+#N`: the first N packets
    Packets(u32),
    /// `%+N`: the first N seconds
    Seconds(u32),
}

impl From<Measurement> for ReadInterval {
    fn from(measurement: Measurement) -> Self {
        match measurement {
            Measurement::Packets(n) => ReadInterval::Packets(n),
            Measurement::Seconds(n) => ReadInterval::Seconds(n),
        }
    }
}

impl fmt::Display for ReadInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadInterval::Packets(n) => write!(f, "%+#{n}"),
            ReadInterval::Seconds(n) => write!(f, "%+{n}"),
        }
    }
}

/// A single question for the external prober.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeRequest {
    /// Per-frame CSV lines for every stream of one track type.
    Frames {
        source: String,
        track: TrackKind,
        interval: ReadInterval,
    },
    /// JSON frame list (stream index and pts time) for the first stream of a type.
    FirstFrame { source: String, track: TrackKind },
    /// The human-readable stream banner, stderr included.
    StreamInfo { source: String },
}

impl ProbeRequest {
    pub fn source(&self) -> &str {
        match self {
            ProbeRequest::Frames { source, .. }
            | ProbeRequest::FirstFrame { source, .. }
            | ProbeRequest::StreamInfo { source } => source,
        }
    }

    /// Structured shape of the output, `None` for the free-text stream banner.
    pub fn shape(&self) -> Option<OutputShape> {
        match self {
            ProbeRequest::Frames { .. } => Some(OutputShape::Csv),
            ProbeRequest::FirstFrame { .. } => Some(OutputShape::Json),
            ProbeRequest::StreamInfo { .. } => None,
        }
    }
}

/// Runs probe requests against the external prober.
///
/// Implementations return the raw output on success and a
/// `CommandStart`/`CommandFailed` error when the prober cannot run or exits
/// non-zero. `Sync` lets the batch driver share one runner across workers.
pub trait ProbeRunner: Sync {
    fn run(&self, request: &ProbeRequest) -> Result<String>;
}

impl<T: ProbeRunner + ?Sized> ProbeRunner for &T {
    fn run(&self, request: &ProbeRequest) -> Result<String> {
        (**self).run(request)
    }
}
