//! Poll configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PollError, Result};

/// How the wait between attempts evolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Same interval every time.
    #[default]
    Fixed,
    /// `interval * n` after the n-th failure.
    Linear,
    /// `interval * 2^(n-1)` after the n-th failure.
    Exponential,
}

/// Configuration for a poll session.
///
/// Serialized with durations in milliseconds:
///
/// ```json
/// {"max_attempts": 30, "interval_ms": 5000, "backoff": "fixed"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum number of probe invocations. Must be at least 1.
    pub max_attempts: u32,
    /// Base wait between attempts.
    #[serde(rename = "interval_ms", with = "duration_ms")]
    pub interval: Duration,
    pub backoff: Backoff,
    /// Upper bound on the wait when backoff grows it.
    #[serde(rename = "max_interval_ms", with = "option_duration_ms")]
    pub max_interval: Option<Duration>,
    /// Per-probe deadline. An expired deadline counts as a transport error.
    #[serde(rename = "probe_timeout_ms", with = "option_duration_ms")]
    pub probe_timeout: Option<Duration>,
}

impl Default for PollConfig {
    /// 30 attempts, 5 seconds apart.
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(5),
            backoff: Backoff::Fixed,
            max_interval: None,
            probe_timeout: None,
        }
    }
}

impl PollConfig {
    /// Fixed-interval config with the given budget.
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff, max_interval: Option<Duration>) -> Self {
        self.backoff = backoff;
        self.max_interval = max_interval;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Reject configurations that could never produce a verdict.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PollError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.probe_timeout == Some(Duration::ZERO) {
            return Err(PollError::InvalidConfig(
                "probe_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Wait before the next attempt, given `failures` failed attempts so far.
    pub fn delay_after(&self, failures: u32) -> Duration {
        let n = failures.max(1);
        let delay = match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Linear => self.interval.saturating_mul(n),
            Backoff::Exponential => self
                .interval
                .saturating_mul(2u32.saturating_pow(n - 1)),
        };
        match self.max_interval {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
