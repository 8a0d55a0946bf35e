//! # Converge Poll
//!
//! Retry poller that waits for a remote host's block devices to reach an
//! expected state.
//!
//! ## Overview
//!
//! Each attempt runs the probe, decodes its output, and compares the result
//! with the expected snapshot. Transport errors, decode errors, and
//! mismatches all count as failed attempts and are retried after a fixed
//! interval. The poll ends when the observation matches, when the attempt
//! budget runs out, or when the caller cancels.
//!
//! ## State Machine
//!
//! ```text
//!             ┌──────── wait(interval) ◄──────┐
//!             ▼                               │ failed, budget left
//!   ──► Attempting ── probe ─► decode ─► compare
//!             │                               │
//!   cancel ───┤                  match ───────┴──► Converged
//!             ▼                  budget spent ───► Exhausted
//!         Cancelled
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use converge_core::{Disk, StateSnapshot};
//! use converge_poll::{PollConfig, PollSession};
//! use converge_probe::{Endpoint, ProbeCommand, ScriptedExecutor};
//!
//! async fn example() {
//!     let expected = StateSnapshot::new(vec![Disk::new("xvdf1", "xfs", "XVDF", "/app/xvdf")]);
//!     let executor = ScriptedExecutor::new();
//!     let session = PollSession::new(
//!         &executor,
//!         Endpoint::new("10.0.0.7", "ec2-user"),
//!         ProbeCommand::lsblk_for(&expected),
//!         PollConfig::default(),
//!     );
//!
//!     match session.run(&expected).await {
//!         Ok(report) => println!("converged after {} attempts", report.attempts),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod outcome;
pub mod session;

pub use config::{Backoff, PollConfig};
pub use error::{PollError, Result};
pub use outcome::{AttemptFailure, FailureReason, PollOutcome, PollReport};
pub use session::{poll_until_converged, PollSession};

pub use tokio_util::sync::CancellationToken;
