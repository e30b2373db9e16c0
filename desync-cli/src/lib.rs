// desync-cli/src/lib.rs
//
// Library portion of the find-desync CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::Cli;
pub use commands::analyze::{EXIT_DESYNC, EXIT_FAILURE, EXIT_OK, run_analyze};
