//! Error types for the harness.

use converge_poll::PollOutcome;
use converge_probe::Endpoint;
use thiserror::Error;

/// Errors around a poll: environment lifecycle, configuration, task failures.
///
/// A poll that does not converge is not an error here; it is a
/// [`PollOutcome::Failed`].
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The environment could not be stood up.
    #[error("provisioning failed: {0:#}")]
    Provision(anyhow::Error),

    /// Teardown failed. The poll outcome is kept so it is not lost.
    #[error("teardown of {endpoint} failed after poll ({outcome}): {source:#}")]
    Teardown {
        endpoint: Endpoint,
        outcome: PollOutcome,
        source: anyhow::Error,
    },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No expected snapshot was given in the configuration.
    #[error("no expected snapshot configured")]
    MissingExpected,

    /// A concurrent poll task panicked or was aborted.
    #[error("poll task failed: {0}")]
    Task(String),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
