// ============================================================================
// desync-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Backend for the `log` Facade
//
// The core library logs through `log` only; this module installs the
// console backend. Output goes to stderr so that stdout carries nothing but
// the report (tables or JSON).
//
// USAGE:
// - default: info
// - --verbose: debug (probe command lines, parse statistics)
// - RUST_LOG=...: overrides both

// ---- External crate imports ----
use env_logger::{Builder, Env};
use log::{LevelFilter, debug};
use owo_colors::OwoColorize;

// ---- Standard library imports ----
use std::io::Write;

/// Default filter for the given verbosity.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the console logger. `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool, use_color: bool) {
    let level = default_level(verbose);
    let env = Env::default().default_filter_or(level.as_str());

    Builder::from_env(env)
        .format(move |buf, record| {
            let timestamp = buf.timestamp();
            let level_str = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };

            if !use_color {
                return writeln!(buf, "{} {} {}", timestamp, level_str, record.args());
            }

            let level_colored = match record.level() {
                log::Level::Error => level_str.bright_red().to_string(),
                log::Level::Warn => level_str.yellow().to_string(),
                log::Level::Info => level_str.green().to_string(),
                log::Level::Debug => level_str.blue().to_string(),
                log::Level::Trace => level_str.magenta().to_string(),
            };
            writeln!(
                buf,
                "{} {} {}",
                timestamp.to_string().white(),
                level_colored,
                record.args()
            )
        })
        .init();

    debug!("Logger initialized with default level: {}", level);
}
