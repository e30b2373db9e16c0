// desync-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{ArgGroup, Parser};
use desync_core::config::{
    AnalysisConfig, AnalysisConfigBuilder, DEFAULT_TEMP_DIR, Measurement, Method, SourceMode,
};
use std::path::PathBuf;

/// Packets sampled when neither `--packets` nor `--time` is given.
pub const DEFAULT_PACKETS: u32 = 100;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "find-desync: audio/video desynchronization detector",
    long_about = "Samples the video and audio tracks of files or camera streams with ffprobe \
                  and reports start offsets, timestamp differences and drift."
)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "csv"])))]
pub struct Cli {
    /// File or stream to analyze
    #[arg(short = 'f', long = "file", value_name = "LOCATOR")]
    pub file: Option<String>,

    /// CSV camera list with a `name,uri,apart` header
    #[arg(short = 'c', long = "csv", value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Number of packets to analyze. Mutually exclusive with --time
    #[arg(short = 'p', long, value_name = "COUNT", conflicts_with = "time",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub packets: Option<u32>,

    /// Seconds of the input to analyze. Mutually exclusive with --packets
    #[arg(short = 't', long, value_name = "SECONDS",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub time: Option<u32>,

    /// Method to analyze: trackdiff, drift, firstpackets, startdiff
    #[arg(short = 'm', long, value_name = "METHOD", default_value = "startdiff")]
    pub method: Method,

    /// Analyze the source directly instead of a recorded slice of it
    #[arg(short = 'd', long)]
    pub direct: bool,

    /// Length in seconds of recorded slices (defaults to the measurement value)
    #[arg(long, value_name = "SECONDS",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub clip_seconds: Option<u32>,

    /// Directory for recorded slices
    #[arg(long, value_name = "DIR", default_value = DEFAULT_TEMP_DIR, env = "FIND_DESYNC_TEMP_DIR")]
    pub temp_dir: PathBuf,

    /// Number of sources analyzed in parallel
    #[arg(short = 'j', long, value_name = "N", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Print the batch summary as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn measurement(&self) -> Measurement {
        match (self.packets, self.time) {
            (_, Some(seconds)) => Measurement::Seconds(seconds),
            (Some(count), None) => Measurement::Packets(count),
            (None, None) => Measurement::Packets(DEFAULT_PACKETS),
        }
    }

    pub fn source_mode(&self) -> SourceMode {
        if self.direct {
            SourceMode::Direct
        } else {
            SourceMode::Recorded
        }
    }

    /// Analysis configuration described by the arguments.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfigBuilder::new()
            .method(self.method)
            .measurement(self.measurement())
            .source_mode(self.source_mode())
            .temp_dir(self.temp_dir.clone())
            .clip_seconds(self.clip_seconds)
            .jobs(usize::from(self.jobs))
            .build()
    }
}
