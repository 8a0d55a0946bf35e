//! Per-attempt diagnostics and terminal outcomes.

use std::fmt;
use std::time::Duration;

use converge_core::{DecodeError, Difference, StateSnapshot};
use converge_probe::ProbeError;

use crate::error::PollError;

/// Longest raw-output excerpt rendered by `Display`.
const RAW_EXCERPT_LEN: usize = 512;

/// Why a single attempt did not converge.
///
/// The full raw output is kept; only the `Display` rendering is shortened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The probe could not be run.
    Transport(ProbeError),
    /// The probe ran but its output was not a device list.
    Decode { error: DecodeError, raw: String },
    /// The output decoded but differs from expectation.
    Mismatch {
        observed: StateSnapshot,
        differences: Vec<Difference>,
        raw: String,
    },
}

impl AttemptFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptFailure::Transport(_) => "transport",
            AttemptFailure::Decode { .. } => "decode",
            AttemptFailure::Mismatch { .. } => "mismatch",
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AttemptFailure::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, AttemptFailure::Decode { .. })
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, AttemptFailure::Mismatch { .. })
    }

    /// Raw probe output, if the probe produced any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            AttemptFailure::Transport(_) => None,
            AttemptFailure::Decode { raw, .. } | AttemptFailure::Mismatch { raw, .. } => Some(raw),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Transport(e) => write!(f, "transport error: {e}"),
            AttemptFailure::Decode { error, raw } => {
                write!(f, "decode error: {error}; raw output: {}", excerpt(raw))
            }
            AttemptFailure::Mismatch {
                differences, raw, ..
            } => {
                f.write_str("snapshot mismatch: ")?;
                for (i, d) in differences.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{d}")?;
                }
                write!(f, "; raw output: {}", excerpt(raw))
            }
        }
    }
}

fn excerpt(raw: &str) -> String {
    let raw = raw.trim();
    match raw.char_indices().nth(RAW_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}... ({} bytes)", &raw[..cut], raw.len()),
        None => raw.to_string(),
    }
}

/// An attempt count rendered as "1 attempt" or "N attempts".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Attempts(pub(crate) u32);

impl Attempts {
    pub(crate) fn of(count: &u32) -> Self {
        Self(*count)
    }
}

impl fmt::Display for Attempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => f.write_str("1 attempt"),
            n => write!(f, "{n} attempts"),
        }
    }
}

/// Summary of a converged poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Probe invocations made, including the converging one.
    pub attempts: u32,
    /// Time from first probe to convergence.
    pub elapsed: Duration,
}

/// Why a poll ended without converging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Exhausted { attempts: u32 },
    Cancelled { attempts: u32 },
    InvalidConfig(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Exhausted { attempts } => {
                write!(f, "not converged after {}", Attempts(*attempts))
            }
            FailureReason::Cancelled { attempts } => {
                write!(f, "cancelled after {}", Attempts(*attempts))
            }
            FailureReason::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

/// Terminal outcome of a poll, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Converged {
        attempts: u32,
    },
    Failed {
        reason: FailureReason,
        last_diagnostic: Option<AttemptFailure>,
    },
}

impl PollOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, PollOutcome::Converged { .. })
    }

    /// Probe invocations made, when known.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            PollOutcome::Converged { attempts }
            | PollOutcome::Failed {
                reason:
                    FailureReason::Exhausted { attempts } | FailureReason::Cancelled { attempts },
                ..
            } => Some(*attempts),
            PollOutcome::Failed { .. } => None,
        }
    }

    pub fn last_diagnostic(&self) -> Option<&AttemptFailure> {
        match self {
            PollOutcome::Converged { .. } => None,
            PollOutcome::Failed {
                last_diagnostic, ..
            } => last_diagnostic.as_ref(),
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::Converged { attempts } => {
                write!(f, "converged after {}", Attempts(*attempts))
            }
            PollOutcome::Failed {
                reason,
                last_diagnostic: Some(last),
            } => write!(f, "{reason}; last failure: {last}"),
            PollOutcome::Failed { reason, .. } => write!(f, "{reason}"),
        }
    }
}

impl From<Result<PollReport, PollError>> for PollOutcome {
    fn from(result: Result<PollReport, PollError>) -> Self {
        match result {
            Ok(report) => PollOutcome::Converged {
                attempts: report.attempts,
            },
            Err(PollError::Exhausted { attempts, last }) => PollOutcome::Failed {
                reason: FailureReason::Exhausted { attempts },
                last_diagnostic: Some(last),
            },
            Err(PollError::Cancelled { attempts, last }) => PollOutcome::Failed {
                reason: FailureReason::Cancelled { attempts },
                last_diagnostic: last,
            },
            Err(PollError::InvalidConfig(msg)) => PollOutcome::Failed {
                reason: FailureReason::InvalidConfig(msg),
                last_diagnostic: None,
            },
        }
    }
}
