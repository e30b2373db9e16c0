// ============================================================================
// desync-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Naming the Failed Step
//
// The CLI reports core errors as-is, prefixed with the step of the run that
// failed (loading the camera list, checking settings, writing JSON). The
// underlying error stays reachable through `source()`.

use desync_core::{DesyncError, Result};

/// Tags a failed step of the analysis run.
pub trait StepContext<T> {
    fn step(self, step: impl Into<String>) -> Result<T>;
}

impl<T, E> StepContext<T> for std::result::Result<T, E>
where
    E: Into<DesyncError>,
{
    fn step(self, step: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().during(step))
    }
}
