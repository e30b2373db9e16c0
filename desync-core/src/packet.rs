//! Packet timing records.
//!
//! A [`TrackSample`] is the ordered list of packets read from one track of
//! one source. It is built once by the parser and never changed afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two tracks being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    /// ffprobe `-select_streams` specifier for the whole track type.
    pub fn selector(&self) -> &'static str {
        match self {
            TrackKind::Video => "v",
            TrackKind::Audio => "a",
        }
    }

    /// ffprobe `-select_streams` specifier for the first stream of the type.
    pub fn first_stream_selector(&self) -> &'static str {
        match self {
            TrackKind::Video => "v:0",
            TrackKind::Audio => "a:0",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => f.write_str("video"),
            TrackKind::Audio => f.write_str("audio"),
        }
    }
}

/// One decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// 1-based position among the packets kept by the parser
    pub sequence_number: usize,
    /// Presentation timestamp in seconds
    pub presentation_time: f64,
    /// Reported duration in seconds
    pub duration: f64,
}

/// Ordered packets for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    kind: TrackKind,
    packets: Vec<Packet>,
}

impl TrackSample {
    /// Builds a sample from `(presentation_time, duration)` pairs in arrival
    /// order, numbering them from 1.
    pub fn from_timings<I>(kind: TrackKind, timings: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let packets = timings
            .into_iter()
            .enumerate()
            .map(|(i, (presentation_time, duration))| Packet {
                sequence_number: i + 1,
                presentation_time,
                duration,
            })
            .collect();
        Self { kind, packets }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn first(&self) -> Option<&Packet> {
        self.packets.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_start_at_one() {
        let sample = TrackSample::from_timings(TrackKind::Audio, [(0.0, 0.02), (0.02, 0.02), (0.04, 0.02)]);
        let numbers: Vec<usize> = sample.packets().iter().map(|p| p.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(sample.kind(), TrackKind::Audio);
    }

    #[test]
    fn test_selectors() {
        assert_eq!(TrackKind::Video.selector(), "v");
        assert_eq!(TrackKind::Audio.first_stream_selector(), "a:0");
    }
}
