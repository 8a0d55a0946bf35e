//! Probe executor abstraction.
//!
//! Implementations may use SSH, a cloud run-command API, or a local shell.
//! Each call is independent from the poller's point of view; reusing a
//! connection between calls is an implementation detail.

use std::sync::Arc;

use async_trait::async_trait;

use crate::command::ProbeCommand;
use crate::endpoint::Endpoint;
use crate::error::Result;

/// Runs a read-only command on a remote endpoint.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// Run `command` on `endpoint` and return its standard output.
    ///
    /// A non-zero exit, a dropped connection, or a timeout is an error.
    async fn execute(&self, endpoint: &Endpoint, command: &ProbeCommand) -> Result<String>;
}

#[async_trait]
impl<T: ProbeExecutor + ?Sized> ProbeExecutor for Arc<T> {
    async fn execute(&self, endpoint: &Endpoint, command: &ProbeCommand) -> Result<String> {
        (**self).execute(endpoint, command).await
    }
}

#[async_trait]
impl<T: ProbeExecutor + ?Sized> ProbeExecutor for &T {
    async fn execute(&self, endpoint: &Endpoint, command: &ProbeCommand) -> Result<String> {
        (**self).execute(endpoint, command).await
    }
}
