//! Error types for the poller.
//!
//! Only terminal conditions are errors here. Per-attempt failures are
//! [`AttemptFailure`] values that the poller absorbs and retries.

use thiserror::Error;

use crate::outcome::{AttemptFailure, Attempts};

/// Terminal poll failures.
#[derive(Debug, Error)]
pub enum PollError {
    /// The attempt budget ran out without convergence.
    #[error("no convergence after {}; last failure: {last}", Attempts::of(.attempts))]
    Exhausted { attempts: u32, last: AttemptFailure },

    /// The caller cancelled the poll.
    #[error("poll cancelled after {}", Attempts::of(.attempts))]
    Cancelled {
        attempts: u32,
        last: Option<AttemptFailure>,
    },

    /// The configuration can never produce a verdict.
    #[error("invalid poll configuration: {0}")]
    InvalidConfig(String),
}

impl PollError {
    /// The most recent attempt failure, if any attempt failed.
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        match self {
            PollError::Exhausted { last, .. } => Some(last),
            PollError::Cancelled { last, .. } => last.as_ref(),
            PollError::InvalidConfig(_) => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollError::Exhausted { attempts, .. } | PollError::Cancelled { attempts, .. } => {
                *attempts
            }
            PollError::InvalidConfig(_) => 0,
        }
    }
}

/// Result type for poll operations.
pub type Result<T> = std::result::Result<T, PollError>;
