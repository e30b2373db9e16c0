//! Command implementations for the CLI.

/// Module containing the analysis run: load sources, analyze, report.
pub mod analyze;
