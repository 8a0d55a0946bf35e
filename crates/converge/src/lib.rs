//! # Converge
//!
//! Wait for a remote host's block devices to match an expected layout.
//!
//! ## Overview
//!
//! After infrastructure code attaches and formats volumes, a validation step
//! has to confirm the host actually sees them: right filesystem, right
//! label, mounted in the right place. Boot is asynchronous, so the check
//! polls: run `lsblk` on the host, decode the JSON, compare it with the
//! expected snapshot, and retry on a fixed interval until it matches or the
//! attempt budget runs out.
//!
//! ## Key Concepts
//!
//! - **Probe**: a read-only command run on the host (`lsblk -J -fs ...`)
//! - **Snapshot**: an ordered list of devices, observed or expected
//! - **Convergence**: the observed snapshot exactly equals the expected one
//! - **Retry budget**: the maximum number of probes before giving up
//!
//! ## Usage
//!
//! ```rust,no_run
//! use converge::{Harness, HarnessConfig, StaticEnvironment};
//! use converge::core::{Disk, StateSnapshot};
//! use converge::probe::{Endpoint, ScriptedExecutor};
//!
//! async fn example() -> converge::Result<()> {
//!     let expected = StateSnapshot::new(vec![
//!         Disk::new("xvdf1", "xfs", "XVDF", "/app/xvdf"),
//!         Disk::unformatted("xvdh"),
//!     ]);
//!
//!     let harness = Harness::new(ScriptedExecutor::new(), HarnessConfig::default());
//!     let env = StaticEnvironment::new(Endpoint::new("10.0.0.7", "ec2-user"));
//!
//!     let outcome = harness.validate(&env, &expected).await?;
//!     assert!(outcome.is_converged(), "{outcome}");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `converge::core` - Snapshot model, decoder, comparator
//! - `converge::probe` - Probe executor interface
//! - `converge::poll` - Retry poller

pub mod config;
pub mod environment;
pub mod error;
pub mod harness;
pub mod logging;

// Re-export component crates
pub use converge_core as core;
pub use converge_poll as poll;
pub use converge_probe as probe;

pub use config::HarnessConfig;
pub use environment::{Environment, StaticEnvironment};
pub use error::{HarnessError, Result};
pub use harness::{
    run_convergence_poll, run_convergence_poll_with_cancellation, FleetResult, Harness,
};

// Re-export commonly used types
pub use converge_core::{Disk, StateSnapshot};
pub use converge_poll::{
    AttemptFailure, CancellationToken, FailureReason, PollConfig, PollOutcome,
};
pub use converge_probe::{Endpoint, ProbeCommand, ProbeExecutor};
