//! Error types for desync-core.
//!
//! Every fallible operation in the library returns [`Result`]. Failures are
//! scoped to a single source: the batch driver records them and keeps going.

use thiserror::Error;

/// Custom error types for desync analysis
#[derive(Error, Debug)]
pub enum DesyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start '{program}': {source}")]
    CommandStart {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with code {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Not enough packets: {required} required, {available} available")]
    InsufficientPackets { required: usize, available: usize },

    #[error("Could not find {0} stream start time")]
    StreamStartNotFound(crate::packet::TrackKind),

    #[error("Cannot parse {field} from '{value}'")]
    MalformedNumber { field: &'static str, value: String },

    #[error("Invalid probe JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Recording failed: {0}")]
    Recording(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Source list line {line}: {message}")]
    SourceList { line: usize, message: String },

    /// A failure annotated with the step that was running.
    #[error("{step}: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<DesyncError>,
    },
}

impl DesyncError {
    /// True for the recoverable "not enough data" condition.
    pub fn is_insufficient_packets(&self) -> bool {
        matches!(self, DesyncError::InsufficientPackets { .. })
    }

    pub fn during(self, step: impl Into<String>) -> Self {
        DesyncError::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }
}

/// Result type for desync operations
pub type Result<T> = std::result::Result<T, DesyncError>;
