//! The Harness: provision, poll, tear down.
//!
//! The harness wraps a poll session with the environment lifecycle around
//! it and fans out over several hosts when asked to.

use std::sync::Arc;

use converge_core::{SnapshotDecoder, StateSnapshot};
use converge_poll::{poll_until_converged, CancellationToken, PollConfig, PollOutcome, PollSession};
use converge_probe::{Endpoint, ProbeCommand, ProbeExecutor};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::HarnessConfig;
use crate::environment::Environment;
use crate::error::{HarnessError, Result};

/// Poll one endpoint until it converges, and report a single outcome.
///
/// Transport, decode, and mismatch failures are retried; the returned
/// [`PollOutcome`] carries the last of them when the poll gives up.
pub async fn run_convergence_poll<E, D>(
    executor: &E,
    endpoint: &Endpoint,
    command: &ProbeCommand,
    decoder: &D,
    expected: &StateSnapshot,
    config: &PollConfig,
) -> PollOutcome
where
    E: ProbeExecutor + ?Sized,
    D: SnapshotDecoder + ?Sized,
{
    run_convergence_poll_with_cancellation(
        executor,
        endpoint,
        command,
        decoder,
        expected,
        config,
        &CancellationToken::new(),
    )
    .await
}

/// [`run_convergence_poll`] that stops when `cancel` fires.
///
/// Use this to bound a poll instead of dropping its future: a cancelled
/// poll still returns [`FailureReason::Cancelled`] with the attempt count
/// and the last diagnostic.
///
/// [`FailureReason::Cancelled`]: converge_poll::FailureReason::Cancelled
pub async fn run_convergence_poll_with_cancellation<E, D>(
    executor: &E,
    endpoint: &Endpoint,
    command: &ProbeCommand,
    decoder: &D,
    expected: &StateSnapshot,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> PollOutcome
where
    E: ProbeExecutor + ?Sized,
    D: SnapshotDecoder + ?Sized,
{
    let span = tracing::info_span!("poll", endpoint = %endpoint, command = %command);

    poll_until_converged(
        || executor.execute(endpoint, command),
        decoder,
        expected,
        config,
        cancel,
    )
    .instrument(span)
    .await
    .into()
}

/// Result of polling one host in a fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetResult {
    pub endpoint: Endpoint,
    pub outcome: PollOutcome,
}

impl FleetResult {
    pub fn is_converged(&self) -> bool {
        self.outcome.is_converged()
    }
}

/// Validation harness.
///
/// Owns the probe executor (shared across fleet tasks), the harness
/// configuration, and a cancellation token that stops every poll it runs.
pub struct Harness<E: ProbeExecutor> {
    /// The probe backend.
    executor: Arc<E>,
    /// Configuration.
    config: HarnessConfig,
    /// Cancels all polls started by this harness.
    cancel: CancellationToken,
}

impl<E: ProbeExecutor> Harness<E> {
    /// Create a new harness.
    pub fn new(executor: E, config: HarnessConfig) -> Self {
        Self::from_shared(Arc::new(executor), config)
    }

    /// Create a harness around an executor the caller keeps a handle to.
    pub fn from_shared(executor: Arc<E>, config: HarnessConfig) -> Self {
        Self {
            executor,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie the harness to a caller-owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// A handle that cancels every poll this harness runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The probe command for `expected`.
    ///
    /// Configured devices win; otherwise the targets are the expected
    /// device names, so output order follows expectation order.
    pub fn probe_command(&self, expected: &StateSnapshot) -> ProbeCommand {
        if self.config.devices.is_empty() {
            ProbeCommand::lsblk_for(expected)
        } else {
            ProbeCommand::lsblk(&self.config.devices)
        }
    }

    fn description_for(&self, endpoint: &Endpoint) -> String {
        match &self.config.description {
            Some(description) => format!("{description} ({endpoint})"),
            None => format!("probe {endpoint}"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single Host
    // ─────────────────────────────────────────────────────────────────────────

    /// Poll an already reachable endpoint.
    pub async fn poll(&self, endpoint: &Endpoint, expected: &StateSnapshot) -> PollOutcome {
        let session = PollSession::new(
            Arc::clone(&self.executor),
            endpoint.clone(),
            self.probe_command(expected),
            self.config.poll.clone(),
        )
        .with_cancellation(self.cancel.child_token())
        .with_description(self.description_for(endpoint));

        session.run(expected).await.into()
    }

    /// Provision the environment, poll it, and tear it down.
    ///
    /// Teardown runs whatever the poll outcome is. A teardown failure is
    /// reported as [`HarnessError::Teardown`], which still carries the
    /// outcome. A non-converged poll is `Ok` with a failed outcome.
    ///
    /// Teardown only runs if this future is driven to completion. Dropping
    /// it (for example under `tokio::time::timeout`) or a panic inside the
    /// executor skips teardown. To bound a validation, cancel the harness
    /// token ([`with_cancellation`](Self::with_cancellation) or
    /// [`cancellation_token`](Self::cancellation_token)) instead: the poll
    /// ends with a cancelled outcome and teardown still runs.
    pub async fn validate<V>(&self, env: &V, expected: &StateSnapshot) -> Result<PollOutcome>
    where
        V: Environment + ?Sized,
    {
        let endpoint = env.provision().await.map_err(HarnessError::Provision)?;
        tracing::info!(%endpoint, "environment provisioned");

        let outcome = self.poll(&endpoint, expected).await;
        if outcome.is_converged() {
            tracing::info!(%endpoint, %outcome, "validation passed");
        } else {
            tracing::warn!(%endpoint, %outcome, "validation failed");
        }

        match env.teardown(&endpoint).await {
            Ok(()) => {
                tracing::info!(%endpoint, "environment torn down");
                Ok(outcome)
            }
            Err(source) => {
                tracing::error!(%endpoint, error = %source, "teardown failed");
                Err(HarnessError::Teardown {
                    endpoint,
                    outcome,
                    source,
                })
            }
        }
    }

    /// [`validate`](Self::validate) against the snapshot given in the configuration.
    pub async fn validate_configured<V>(&self, env: &V) -> Result<PollOutcome>
    where
        V: Environment + ?Sized,
    {
        let expected = self
            .config
            .expected
            .as_ref()
            .ok_or(HarnessError::MissingExpected)?;
        self.validate(env, expected).await
    }
}

impl<E: ProbeExecutor + 'static> Harness<E> {
    // ─────────────────────────────────────────────────────────────────────────
    // Fleet
    // ─────────────────────────────────────────────────────────────────────────

    /// Poll several endpoints concurrently, one task each.
    ///
    /// Results come back in the order of `endpoints`. Sessions share the
    /// executor and nothing else.
    pub async fn validate_fleet(
        &self,
        endpoints: Vec<Endpoint>,
        expected: &StateSnapshot,
    ) -> Result<Vec<FleetResult>> {
        let expected = Arc::new(expected.clone());
        let command = self.probe_command(&expected);
        let mut tasks = JoinSet::new();

        for (index, endpoint) in endpoints.into_iter().enumerate() {
            let session = PollSession::new(
                Arc::clone(&self.executor),
                endpoint.clone(),
                command.clone(),
                self.config.poll.clone(),
            )
            .with_cancellation(self.cancel.child_token())
            .with_description(self.description_for(&endpoint));
            let expected = Arc::clone(&expected);

            tasks.spawn(async move {
                let outcome = PollOutcome::from(session.run(&expected).await);
                (index, FleetResult { endpoint, outcome })
            });
        }

        let mut results: Vec<(usize, FleetResult)> = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    tasks.abort_all();
                    return Err(HarnessError::Task(e.to_string()));
                }
            }
        }
        results.sort_by_key(|(index, _)| *index);

        let converged = results.iter().filter(|(_, r)| r.is_converged()).count();
        tracing::info!(hosts = results.len(), converged, "fleet validation finished");

        Ok(results.into_iter().map(|(_, r)| r).collect())
    }
}
