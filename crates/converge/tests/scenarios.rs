//! End-to-end polling scenarios against scripted hosts.
//!
//! The clock is paused, so a 30 x 5 s budget runs instantly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use converge::core::{decode_lsblk, DecodeError, LsblkJsonDecoder};
use converge::poll::PollConfig;
use converge::probe::{ProbeError, ScriptedExecutor};
use converge::{
    run_convergence_poll, run_convergence_poll_with_cancellation, CancellationToken, Endpoint,
    Environment, FailureReason, Harness, HarnessConfig, HarnessError, PollOutcome, ProbeCommand,
    StateSnapshot,
};
use converge_testkit::fixtures::{
    connection_refused, expected_volumes, ext4_volumes, lsblk_payload, partial_volumes, scripted,
    test_endpoint,
};

const INTERVAL: Duration = Duration::from_secs(5);

fn harness(executor: ScriptedExecutor, max_attempts: u32) -> Harness<ScriptedExecutor> {
    converge::logging::init_for_tests();
    let config = HarnessConfig::default().with_poll(PollConfig::fixed(max_attempts, INTERVAL));
    Harness::new(executor, config)
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_scenario_a_first_attempt_converges() {
    let expected = expected_volumes();
    let harness = harness(scripted([Ok(lsblk_payload(&expected))]), 30);

    let outcome = harness.poll(&test_endpoint(), &expected).await;

    assert_eq!(outcome, PollOutcome::Converged { attempts: 1 });
    let calls = harness.executor().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].command.to_string(),
        "lsblk -J -fs /dev/xvdf1 /dev/xvdg1 /dev/xvdh"
    );
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_converges_when_last_volume_appears() {
    let expected = expected_volumes();
    let partial = lsblk_payload(&partial_volumes());
    let executor = scripted([
        Ok(partial.clone()),
        Ok(partial),
        Ok(lsblk_payload(&expected)),
    ]);
    let harness = harness(executor, 5);

    let started = tokio::time::Instant::now();
    let outcome = harness.poll(&test_endpoint(), &expected).await;

    assert_eq!(outcome, PollOutcome::Converged { attempts: 3 });
    assert_eq!(harness.executor().call_count(), 3);
    assert!(started.elapsed() >= INTERVAL * 2);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_persistent_mismatch_exhausts() {
    let expected = expected_volumes();
    let harness = harness(scripted([Ok(lsblk_payload(&ext4_volumes()))]), 3);

    let outcome = harness.poll(&test_endpoint(), &expected).await;

    match &outcome {
        PollOutcome::Failed {
            reason: FailureReason::Exhausted { attempts: 3 },
            last_diagnostic: Some(last),
        } => {
            assert!(last.is_mismatch());
            assert!(last.to_string().contains(r#"fstype expected "xfs", got "ext4""#));
        }
        other => panic!("unexpected outcome: {other}"),
    }
    assert_eq!(harness.executor().call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_d_transport_errors_never_decode() {
    let expected = expected_volumes();
    let executor = scripted([Err(connection_refused())]);
    let decodes = AtomicUsize::new(0);
    let decoder = |raw: &str| -> Result<StateSnapshot, DecodeError> {
        decodes.fetch_add(1, Ordering::SeqCst);
        decode_lsblk(raw)
    };

    let outcome = run_convergence_poll(
        &executor,
        &test_endpoint(),
        &ProbeCommand::lsblk_for(&expected),
        &decoder,
        &expected,
        &PollConfig::fixed(4, INTERVAL),
    )
    .await;

    assert_eq!(outcome.attempts(), Some(4));
    assert!(matches!(
        outcome,
        PollOutcome::Failed {
            reason: FailureReason::Exhausted { .. },
            ..
        }
    ));
    assert!(outcome.last_diagnostic().unwrap().is_transport());
    assert_eq!(executor.call_count(), 4);
    assert_eq!(decodes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_poll_keeps_last_diagnostic() {
    let expected = expected_volumes();
    let executor = scripted([Err(connection_refused())]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        trigger.cancel();
    });

    let outcome = run_convergence_poll_with_cancellation(
        &executor,
        &test_endpoint(),
        &ProbeCommand::lsblk_for(&expected),
        &LsblkJsonDecoder,
        &expected,
        &PollConfig::fixed(30, INTERVAL),
        &cancel,
    )
    .await;

    match &outcome {
        PollOutcome::Failed {
            reason: FailureReason::Cancelled { attempts: 3 },
            last_diagnostic: Some(last),
        } => assert!(last.is_transport()),
        other => panic!("unexpected outcome: {other}"),
    }
    assert_eq!(executor.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_garbage_then_good_output_converges() {
    let expected = expected_volumes();
    let executor = scripted([
        Ok(String::new()),
        Ok("lsblk: /dev/xvdh: not a block device".to_string()),
        Ok(lsblk_payload(&expected)),
    ]);

    let outcome = run_convergence_poll(
        &executor,
        &test_endpoint(),
        &ProbeCommand::lsblk_for(&expected),
        &LsblkJsonDecoder,
        &expected,
        &PollConfig::fixed(5, INTERVAL),
    )
    .await;

    assert_eq!(outcome, PollOutcome::Converged { attempts: 3 });
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingEnvironment {
    fail_provision: bool,
    fail_teardown: bool,
    events: Mutex<Vec<String>>,
}

impl RecordingEnvironment {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Environment for RecordingEnvironment {
    async fn provision(&self) -> anyhow::Result<Endpoint> {
        self.events.lock().unwrap().push("provision".into());
        if self.fail_provision {
            anyhow::bail!("instance limit exceeded");
        }
        Ok(test_endpoint())
    }

    async fn teardown(&self, endpoint: &Endpoint) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(format!("teardown {endpoint}"));
        if self.fail_teardown {
            anyhow::bail!("volume still attached");
        }
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_teardown_runs_after_success() {
    let expected = expected_volumes();
    let harness = harness(scripted([Ok(lsblk_payload(&expected))]), 3);
    let env = RecordingEnvironment::default();

    let outcome = harness.validate(&env, &expected).await.unwrap();

    assert!(outcome.is_converged());
    assert_eq!(env.events(), vec!["provision", "teardown ec2-user@10.0.0.7"]);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_runs_after_failure() {
    let expected = expected_volumes();
    let harness = harness(scripted([Err(connection_refused())]), 3);
    let env = RecordingEnvironment::default();

    let outcome = harness.validate(&env, &expected).await.unwrap();

    assert!(!outcome.is_converged());
    assert_eq!(outcome.attempts(), Some(3));
    assert_eq!(env.events(), vec!["provision", "teardown ec2-user@10.0.0.7"]);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_runs_after_cancellation() {
    let expected = expected_volumes();
    let harness = harness(scripted([Err(connection_refused())]), 30);
    let cancel = harness.cancellation_token();
    let env = RecordingEnvironment::default();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        cancel.cancel();
    });

    let outcome = harness.validate(&env, &expected).await.unwrap();

    assert!(matches!(
        outcome,
        PollOutcome::Failed {
            reason: FailureReason::Cancelled { attempts: 2 },
            ..
        }
    ));
    assert_eq!(env.events(), vec!["provision", "teardown ec2-user@10.0.0.7"]);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_failure_keeps_outcome() {
    let expected = expected_volumes();
    let harness = harness(scripted([Ok(lsblk_payload(&expected))]), 3);
    let env = RecordingEnvironment {
        fail_teardown: true,
        ..Default::default()
    };

    let err = harness.validate(&env, &expected).await.unwrap_err();

    match err {
        HarnessError::Teardown {
            endpoint, outcome, ..
        } => {
            assert_eq!(endpoint, test_endpoint());
            assert_eq!(outcome, PollOutcome::Converged { attempts: 1 });
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_provision_failure_skips_poll_and_teardown() {
    let expected = expected_volumes();
    let harness = harness(scripted([Ok(lsblk_payload(&expected))]), 3);
    let env = RecordingEnvironment {
        fail_provision: true,
        ..Default::default()
    };

    let err = harness.validate(&env, &expected).await.unwrap_err();

    assert!(matches!(err, HarnessError::Provision(_)));
    assert!(err.to_string().contains("instance limit exceeded"));
    assert_eq!(harness.executor().call_count(), 0);
    assert_eq!(env.events(), vec!["provision"]);
}

#[tokio::test(start_paused = true)]
async fn test_validate_configured_uses_file_expectation() {
    let config = HarnessConfig::from_json_str(
        r#"{
            "description": "ebs volumes",
            "poll": { "max_attempts": 2, "interval_ms": 1000 },
            "expected": { "blockdevices": [
                { "name": "xvdf1", "fstype": "xfs", "label": "XVDF", "mountpoint": "/app/xvdf" },
                { "name": "xvdg1", "fstype": "xfs", "label": null, "mountpoint": "/app/xvdg" },
                { "name": "xvdh" }
            ] }
        }"#,
    )
    .unwrap();
    let executor = scripted([Ok(lsblk_payload(&expected_volumes()))]);
    let harness = Harness::new(executor, config);

    let outcome = harness
        .validate_configured(&RecordingEnvironment::default())
        .await
        .unwrap();
    assert!(outcome.is_converged());

    let bare = Harness::new(ScriptedExecutor::new(), HarnessConfig::default());
    let err = bare
        .validate_configured(&RecordingEnvironment::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::MissingExpected));
}

// ─────────────────────────────────────────────────────────────────────────────
// Fleet
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_fleet_polls_hosts_independently() {
    let expected = expected_volumes();
    let good = lsblk_payload(&expected);
    let executor = ScriptedExecutor::new()
        .with_host_script(
            "10.0.0.7",
            [Err(connection_refused()), Ok(good.clone())],
        )
        .with_host_script("10.0.0.8", [Ok(lsblk_payload(&ext4_volumes()))])
        .with_host_script("10.0.0.9", [Ok(good)]);
    let harness = harness(executor, 3);

    let endpoints = vec![
        Endpoint::new("10.0.0.7", "ec2-user"),
        Endpoint::new("10.0.0.8", "ec2-user"),
        Endpoint::new("10.0.0.9", "ec2-user"),
    ];
    let results = harness
        .validate_fleet(endpoints.clone(), &expected)
        .await
        .unwrap();

    let returned: Vec<_> = results.iter().map(|r| r.endpoint.clone()).collect();
    assert_eq!(returned, endpoints);
    assert_eq!(results[0].outcome, PollOutcome::Converged { attempts: 2 });
    assert_eq!(results[1].outcome.attempts(), Some(3));
    assert!(results[1].outcome.last_diagnostic().unwrap().is_mismatch());
    assert_eq!(results[2].outcome, PollOutcome::Converged { attempts: 1 });

    let executor = harness.executor();
    assert_eq!(executor.calls_for("10.0.0.7"), 2);
    assert_eq!(executor.calls_for("10.0.0.8"), 3);
    assert_eq!(executor.calls_for("10.0.0.9"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_harness_stops_fleet() {
    let expected = expected_volumes();
    let executor = scripted([Err(ProbeError::Timeout { timeout_ms: 100 })]);
    let harness = harness(executor, 30);
    let cancel = harness.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        cancel.cancel();
    });

    let results = harness
        .validate_fleet(
            vec![
                Endpoint::new("10.0.0.7", "ec2-user"),
                Endpoint::new("10.0.0.8", "ec2-user"),
            ],
            &expected,
        )
        .await
        .unwrap();

    for result in &results {
        assert!(matches!(
            result.outcome,
            PollOutcome::Failed {
                reason: FailureReason::Cancelled { attempts: 3 },
                ..
            }
        ));
    }
}
