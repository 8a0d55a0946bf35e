//! In-memory probe executor with scripted responses.
//!
//! Used by tests and by dry runs. Nothing leaves the process: each call pops
//! the next canned response for the endpoint's host (or the default script)
//! and records the call for later inspection.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::command::ProbeCommand;
use crate::endpoint::Endpoint;
use crate::error::{ProbeError, Result};
use crate::executor::ProbeExecutor;

/// A recorded probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCall {
    pub endpoint: Endpoint,
    pub command: ProbeCommand,
}

/// A queue of responses. Once drained, the last response repeats.
#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<Result<String>>,
    last: Option<Result<String>>,
}

impl Script {
    fn next(&mut self) -> Result<String> {
        if let Some(step) = self.steps.pop_front() {
            self.last = Some(step.clone());
            return step;
        }
        self.last
            .clone()
            .unwrap_or_else(|| Err(ProbeError::Other("no scripted response".into())))
    }
}

#[derive(Debug, Default)]
struct Inner {
    default: Script,
    hosts: HashMap<String, Script>,
    calls: Vec<ProbeCall>,
}

/// Probe executor that replays scripted responses.
///
/// Thread-safe via Mutex; share it behind an `Arc` across sessions.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    inner: Mutex<Inner>,
}

impl ScriptedExecutor {
    /// Create an executor with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a successful output to the default script.
    pub fn with_output(self, output: impl Into<String>) -> Self {
        self.push_output(output);
        self
    }

    /// Append an error to the default script.
    pub fn with_error(self, error: ProbeError) -> Self {
        self.push_error(error);
        self
    }

    /// Give `host` its own script, used instead of the default one.
    pub fn with_host_script<I>(self, host: impl Into<String>, steps: I) -> Self
    where
        I: IntoIterator<Item = Result<String>>,
    {
        self.lock()
            .hosts
            .entry(host.into())
            .or_default()
            .steps
            .extend(steps);
        self
    }

    pub fn push_output(&self, output: impl Into<String>) {
        self.lock().default.steps.push_back(Ok(output.into()));
    }

    pub fn push_error(&self, error: ProbeError) {
        self.lock().default.steps.push_back(Err(error));
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<ProbeCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of calls made against `host`.
    pub fn calls_for(&self, host: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint.host == host)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProbeExecutor for ScriptedExecutor {
    async fn execute(&self, endpoint: &Endpoint, command: &ProbeCommand) -> Result<String> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.calls.push(ProbeCall {
            endpoint: endpoint.clone(),
            command: command.clone(),
        });
        match inner.hosts.get_mut(&endpoint.host) {
            Some(script) => script.next(),
            None => inner.default.next(),
        }
    }
}
