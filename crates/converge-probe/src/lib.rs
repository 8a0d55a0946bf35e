//! # Converge Probe
//!
//! The narrow interface between the convergence poller and whatever runs
//! commands on a remote host.
//!
//! ## Overview
//!
//! The poller never opens connections itself. It hands an [`Endpoint`] and a
//! [`ProbeCommand`] to a [`ProbeExecutor`] and gets back the command's
//! standard output or a [`ProbeError`]. How the command reaches the host
//! (SSH, SSM, a local shell) is the executor's business.
//!
//! ## Key Types
//!
//! - [`ProbeExecutor`] - The async trait every transport implements
//! - [`Endpoint`] - An opaque, connectable host reference
//! - [`ProbeCommand`] - A read-only command, e.g. `lsblk -J -fs /dev/xvdf1`
//! - [`ScriptedExecutor`] - In-memory executor with canned responses, for tests
//!
//! ## Usage
//!
//! ```rust
//! use converge_probe::{Endpoint, ProbeCommand, ProbeExecutor, ScriptedExecutor};
//!
//! async fn example() {
//!     let executor = ScriptedExecutor::new().with_output(r#"{"blockdevices":[]}"#);
//!     let endpoint = Endpoint::new("10.0.0.7", "ec2-user");
//!     let command = ProbeCommand::lsblk(["xvdf1", "xvdh"]);
//!
//!     let raw = executor.execute(&endpoint, &command).await.unwrap();
//!     assert_eq!(raw, r#"{"blockdevices":[]}"#);
//! }
//! ```

pub mod command;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod memory;

pub use command::ProbeCommand;
pub use endpoint::Endpoint;
pub use error::{ProbeError, Result};
pub use executor::ProbeExecutor;
pub use memory::{ProbeCall, ScriptedExecutor};
