// desync-cli/src/main.rs
//
// Entry point for the find-desync binary.
//
// Responsibilities:
// - Parsing command-line arguments (bad arguments exit with code 1).
// - Setting up console logging.
// - Running the analysis and mapping its outcome to the process exit code.

use clap::Parser;
use desync_cli::output::{print_error, should_use_color};
use desync_cli::{Cli, EXIT_FAILURE, logging, run_analyze};
use std::process;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not errors
            let code = if e.use_stderr() { EXIT_FAILURE } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    logging::init(cli.verbose, should_use_color());

    match run_analyze(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            print_error(&e.to_string());
            process::exit(EXIT_FAILURE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desync_core::config::{Measurement, Method, SourceMode};
    use std::path::PathBuf;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["find-desync", "-f", "rtsp://cam/live"]);
        assert_eq!(cli.file.as_deref(), Some("rtsp://cam/live"));
        assert_eq!(cli.method, Method::StartDiff);
        assert_eq!(cli.measurement(), Measurement::Packets(100));
        assert_eq!(cli.source_mode(), SourceMode::Recorded);
        assert_eq!(cli.temp_dir, PathBuf::from("./temp"));
        assert_eq!(cli.jobs, 1);
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_full_arguments() {
        let cli = Cli::parse_from([
            "find-desync",
            "--csv",
            "cameras.csv",
            "-t",
            "30",
            "-m",
            "drift",
            "-d",
            "--clip-seconds",
            "12",
            "--jobs",
            "4",
            "--json",
            "-v",
        ]);
        assert_eq!(cli.csv, Some(PathBuf::from("cameras.csv")));
        assert_eq!(cli.measurement(), Measurement::Seconds(30));

        let config = cli.analysis_config();
        assert_eq!(config.method, Method::Drift);
        assert_eq!(config.source_mode, SourceMode::Direct);
        assert_eq!(config.clip_length(), 12);
        assert_eq!(config.jobs, 4);
        assert!(cli.verbose);
    }

    #[test]
    fn test_packets_and_time_conflict() {
        let result = Cli::try_parse_from(["find-desync", "-f", "x", "-p", "10", "-t", "5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["find-desync", "-m", "drift"]).is_err());
        assert!(Cli::try_parse_from(["find-desync", "-f", "a", "-c", "b.csv"]).is_err());
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(Cli::try_parse_from(["find-desync", "-f", "x", "-m", "bogus"]).is_err());
    }
}
