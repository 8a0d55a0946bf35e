//! Poll session: the probe → decode → compare → wait loop.

use std::future::Future;
use std::time::Duration;

use converge_core::{check, Convergence, LsblkJsonDecoder, SnapshotDecoder, StateSnapshot};
use converge_probe::{Endpoint, ProbeCommand, ProbeError, ProbeExecutor};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::PollConfig;
use crate::error::{PollError, Result};
use crate::outcome::{AttemptFailure, PollReport};

/// Poll until the decoded probe output equals `expected`.
///
/// `probe` is called once per attempt and never concurrently. A failed
/// attempt (transport error, decode error, or mismatch) is retried after
/// `config.delay_after(n)` until `config.max_attempts` probes have been made.
/// Cancelling `cancel` interrupts both the in-flight probe and the wait.
///
/// Decode and compare only run on attempts where the probe succeeded.
pub async fn poll_until_converged<P, F, D>(
    mut probe: P,
    decoder: &D,
    expected: &StateSnapshot,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PollReport>
where
    P: FnMut() -> F,
    F: Future<Output = std::result::Result<String, ProbeError>>,
    D: SnapshotDecoder + ?Sized,
{
    config.validate()?;

    let started = Instant::now();
    let mut attempts: u32 = 0;
    let mut last: Option<AttemptFailure> = None;

    loop {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled { attempts, last });
        }

        attempts += 1;
        tracing::debug!(attempt = attempts, max_attempts = config.max_attempts, "probing");

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(attempt = attempts, "poll cancelled during probe");
                return Err(PollError::Cancelled { attempts, last });
            }
            output = run_probe(probe(), config.probe_timeout) => output,
        };

        let failure = match evaluate(output, decoder, expected) {
            Ok(()) => {
                let elapsed = started.elapsed();
                tracing::info!(attempts, ?elapsed, "converged");
                return Ok(PollReport { attempts, elapsed });
            }
            Err(failure) => failure,
        };

        match &failure {
            AttemptFailure::Transport(e) => {
                tracing::warn!(attempt = attempts, error = %e, "probe failed");
            }
            AttemptFailure::Decode { error, .. } => {
                tracing::warn!(attempt = attempts, error = %error, "probe output not decodable");
            }
            AttemptFailure::Mismatch { differences, .. } => {
                tracing::debug!(
                    attempt = attempts,
                    differences = differences.len(),
                    "not converged yet"
                );
            }
        }

        if attempts >= config.max_attempts {
            tracing::error!(attempts, last = %failure, "attempt budget exhausted");
            return Err(PollError::Exhausted {
                attempts,
                last: failure,
            });
        }

        let delay = config.delay_after(attempts);
        last = Some(failure);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(attempts, "poll cancelled while waiting");
                return Err(PollError::Cancelled { attempts, last });
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn run_probe<F>(probe: F, timeout: Option<Duration>) -> std::result::Result<String, ProbeError>
where
    F: Future<Output = std::result::Result<String, ProbeError>>,
{
    match timeout {
        None => probe.await,
        Some(limit) => tokio::time::timeout(limit, probe)
            .await
            .unwrap_or_else(|_| {
                Err(ProbeError::Timeout {
                    timeout_ms: limit.as_millis() as u64,
                })
            }),
    }
}

/// One attempt's verdict: `Ok(())` on convergence.
fn evaluate<D: SnapshotDecoder + ?Sized>(
    output: std::result::Result<String, ProbeError>,
    decoder: &D,
    expected: &StateSnapshot,
) -> std::result::Result<(), AttemptFailure> {
    let raw = output.map_err(AttemptFailure::Transport)?;
    let observed = match decoder.decode(&raw) {
        Ok(snapshot) => snapshot,
        Err(error) => return Err(AttemptFailure::Decode { error, raw }),
    };
    match check(&observed, expected) {
        Convergence::Converged => Ok(()),
        Convergence::Diverged { differences } => Err(AttemptFailure::Mismatch {
            observed,
            differences,
            raw,
        }),
    }
}

/// A poll against one endpoint.
///
/// The session owns its configuration and cancellation token; the expected
/// snapshot is only borrowed for the duration of [`run`](Self::run).
pub struct PollSession<E: ProbeExecutor, D: SnapshotDecoder = LsblkJsonDecoder> {
    executor: E,
    endpoint: Endpoint,
    command: ProbeCommand,
    decoder: D,
    config: PollConfig,
    cancel: CancellationToken,
    description: String,
}

impl<E: ProbeExecutor> PollSession<E> {
    /// Create a session that decodes lsblk JSON.
    pub fn new(executor: E, endpoint: Endpoint, command: ProbeCommand, config: PollConfig) -> Self {
        let description = format!("probe {endpoint}");
        Self {
            executor,
            endpoint,
            command,
            decoder: LsblkJsonDecoder,
            config,
            cancel: CancellationToken::new(),
            description,
        }
    }
}

impl<E: ProbeExecutor, D: SnapshotDecoder> PollSession<E, D> {
    /// Use a different decoder for probe output.
    pub fn with_decoder<D2: SnapshotDecoder>(self, decoder: D2) -> PollSession<E, D2> {
        PollSession {
            executor: self.executor,
            endpoint: self.endpoint,
            command: self.command,
            decoder,
            config: self.config,
            cancel: self.cancel,
            description: self.description,
        }
    }

    /// Tie the session to a caller-owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Human-readable label used in logs.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn command(&self) -> &ProbeCommand {
        &self.command
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// A handle that cancels this session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Poll until the endpoint's state equals `expected`.
    pub async fn run(&self, expected: &StateSnapshot) -> Result<PollReport> {
        let span = tracing::info_span!(
            "poll",
            description = %self.description,
            endpoint = %self.endpoint,
            command = %self.command,
        );

        let executor = &self.executor;
        let endpoint = &self.endpoint;
        let command = &self.command;

        poll_until_converged(
            move || executor.execute(endpoint, command),
            &self.decoder,
            expected,
            &self.config,
            &self.cancel,
        )
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use converge_core::{decode_lsblk, DecodeError, Disk};
    use converge_probe::ScriptedExecutor;

    const INTERVAL: Duration = Duration::from_secs(5);

    fn expected() -> StateSnapshot {
        StateSnapshot::new(vec![
            Disk::new("xvdf1", "xfs", "XVDF", "/app/xvdf"),
            Disk::new("xvdg1", "xfs", "", "/app/xvdg"),
            Disk::unformatted("xvdh"),
        ])
    }

    fn partial() -> String {
        expected()
            .iter()
            .take(2)
            .cloned()
            .collect::<StateSnapshot>()
            .to_lsblk_json()
    }

    fn session<'a>(
        executor: &'a ScriptedExecutor,
        max_attempts: u32,
    ) -> PollSession<&'a ScriptedExecutor> {
        PollSession::new(
            executor,
            Endpoint::new("10.0.0.7", "ec2-user"),
            ProbeCommand::lsblk_for(&expected()),
            PollConfig::fixed(max_attempts, INTERVAL),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_converges_on_first_attempt() {
        let executor = ScriptedExecutor::new().with_output(expected().to_lsblk_json());

        let report = session(&executor, 5).run(&expected()).await.unwrap();

        assert_eq!(report.attempts, 1);
        assert!(report.elapsed < INTERVAL);
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_converged_with_fixed_interval() {
        let executor = ScriptedExecutor::new()
            .with_output(partial())
            .with_output(partial())
            .with_output(expected().to_lsblk_json());

        let report = session(&executor, 5).run(&expected()).await.unwrap();

        assert_eq!(report.attempts, 3);
        assert!(report.elapsed >= INTERVAL * 2);
        assert!(report.elapsed < INTERVAL * 3);
        assert_eq!(executor.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_on_persistent_mismatch() {
        let executor = ScriptedExecutor::new().with_output(partial());

        let err = session(&executor, 3).run(&expected()).await.unwrap_err();

        assert_eq!(executor.call_count(), 3);
        match err {
            PollError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.is_mismatch());
                assert_eq!(last.raw_output(), Some(partial().as_str()));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_skip_decode() {
        let executor = ScriptedExecutor::new().with_error(ProbeError::Connection {
            endpoint: "ec2-user@10.0.0.7".into(),
            message: "connection refused".into(),
        });
        let decodes = AtomicUsize::new(0);
        let decoder = |raw: &str| {
            decodes.fetch_add(1, Ordering::SeqCst);
            decode_lsblk(raw)
        };

        let err = session(&executor, 4)
            .with_decoder(decoder)
            .run(&expected())
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 4);
        assert!(err.last_failure().unwrap().is_transport());
        assert_eq!(executor.call_count(), 4);
        assert_eq!(decodes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_error_is_retried() {
        let executor = ScriptedExecutor::new()
            .with_output(r#"{"blockdevices":[{"name":"xvdf1","#)
            .with_output(expected().to_lsblk_json());

        let report = session(&executor, 3).run(&expected()).await.unwrap();
        assert_eq!(report.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_failure_is_reported_not_first() {
        let executor = ScriptedExecutor::new()
            .with_error(ProbeError::Other("boot".into()))
            .with_output("not json");

        let err = session(&executor, 2).run(&expected()).await.unwrap_err();
        assert!(matches!(
            err.last_failure(),
            Some(AttemptFailure::Decode {
                error: DecodeError::Syntax { .. },
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait() {
        let executor = ScriptedExecutor::new().with_output(partial());
        let poll = session(&executor, 100);
        let token = poll.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            token.cancel();
        });

        let err = poll.run(&expected()).await.unwrap_err();
        match err {
            PollError::Cancelled { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.unwrap().is_mismatch());
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }
        assert_eq!(executor.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_issues_no_probe() {
        let executor = ScriptedExecutor::new().with_output(expected().to_lsblk_json());
        let token = CancellationToken::new();
        token.cancel();

        let err = session(&executor, 3)
            .with_cancellation(token)
            .run(&expected())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled { attempts: 0, last: None }));
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_is_rejected() {
        let executor = ScriptedExecutor::new().with_output(expected().to_lsblk_json());

        let err = session(&executor, 0).run(&expected()).await.unwrap_err();

        assert!(matches!(err, PollError::InvalidConfig(_)));
        assert_eq!(executor.call_count(), 0);
    }

    struct StalledExecutor;

    #[async_trait]
    impl ProbeExecutor for StalledExecutor {
        async fn execute(&self, _: &Endpoint, _: &ProbeCommand) -> converge_probe::Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_counts_as_transport_error() {
        let session = PollSession::new(
            StalledExecutor,
            Endpoint::new("10.0.0.7", "ec2-user"),
            ProbeCommand::lsblk_for(&expected()),
            PollConfig::fixed(2, INTERVAL).with_probe_timeout(Duration::from_secs(1)),
        );

        let err = session.run(&expected()).await.unwrap_err();
        assert!(matches!(
            err.last_failure(),
            Some(AttemptFailure::Transport(ProbeError::Timeout { timeout_ms: 1000 }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_probe() {
        let poll = PollSession::new(
            StalledExecutor,
            Endpoint::new("10.0.0.7", "ec2-user"),
            ProbeCommand::lsblk_for(&expected()),
            PollConfig::fixed(5, INTERVAL),
        );
        let token = poll.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            token.cancel();
        });

        let started = Instant::now();
        let err = poll.run(&expected()).await.unwrap_err();

        assert!(matches!(err, PollError::Cancelled { attempts: 1, last: None }));
        assert!(started.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_function_with_closures() {
        let calls = AtomicUsize::new(0);
        let payload = expected().to_lsblk_json();
        let probe = || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let out = if n < 1 { partial() } else { payload.clone() };
            async move { Ok(out) }
        };

        let report = poll_until_converged(
            probe,
            &LsblkJsonDecoder,
            &expected(),
            &PollConfig::fixed(5, Duration::from_millis(10)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
