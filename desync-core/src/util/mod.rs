//! Utility functions and helpers module
//!
//! Command execution for the external tools, with the command line logged
//! at debug level before it runs.

pub mod command;

pub use command::{log_command, run_command};
