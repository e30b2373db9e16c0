use std::process::{Command, Output};

use log::{debug, error};

use crate::error::{DesyncError, Result};

/// Log a command being executed
pub fn log_command(cmd: &Command) {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|arg| arg.to_string_lossy()).collect();

    debug!("Executing command: {} {}", program, args.join(" "));
}

/// Execute a command and return its output, failing on a non-zero exit
pub fn run_command(cmd: &mut Command) -> Result<Output> {
    log_command(cmd);
    let program = cmd.get_program().to_string_lossy().into_owned();

    let output = cmd.output().map_err(|e| {
        error!("Failed to execute {}: {}", program, e);
        DesyncError::CommandStart {
            program: program.clone(),
            source: e,
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let code = output.status.code().unwrap_or(-1);
        error!("{} failed with exit code {}: {}", program, code, stderr);

        return Err(DesyncError::CommandFailed {
            program,
            code,
            stderr,
        });
    }

    Ok(output)
}
