//! Environment lifecycle: where the host under test comes from.
//!
//! Provisioning and teardown belong to infrastructure tooling, not to this
//! crate. The harness only needs to ask for an endpoint and to hand it back.

use async_trait::async_trait;
use converge_probe::Endpoint;

/// Stands up and releases the host a poll runs against.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Create the infrastructure and return a connectable endpoint.
    async fn provision(&self) -> anyhow::Result<Endpoint>;

    /// Release the infrastructure. Called after every poll, whatever its outcome.
    async fn teardown(&self, endpoint: &Endpoint) -> anyhow::Result<()>;
}

/// A host that already exists. Nothing to create, nothing to release.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    endpoint: Endpoint,
}

impl StaticEnvironment {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl Environment for StaticEnvironment {
    async fn provision(&self) -> anyhow::Result<Endpoint> {
        Ok(self.endpoint.clone())
    }

    async fn teardown(&self, _endpoint: &Endpoint) -> anyhow::Result<()> {
        Ok(())
    }
}
