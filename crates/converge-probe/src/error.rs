//! Error types for probe execution.

use thiserror::Error;

/// Errors that can occur while running a probe on a remote host.
///
/// All of these are transport-level: the command did not produce output
/// that could even be looked at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Could not reach the host.
    #[error("connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// The command ran but exited unsuccessfully.
    #[error("command `{command}` failed (exit={exit_code:?}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The probe did not finish in time.
    #[error("probe timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("{0}")]
    Other(String),
}

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
