//! Harness configuration.
//!
//! A JSON file describing one validation run:
//!
//! ```json
//! {
//!   "description": "ebs volumes",
//!   "poll": { "max_attempts": 30, "interval_ms": 5000 },
//!   "devices": ["xvdf1", "xvdg1", "xvdh"],
//!   "expected": {
//!     "blockdevices": [
//!       { "name": "xvdf1", "fstype": "xfs", "label": "XVDF", "mountpoint": "/app/xvdf" }
//!     ]
//!   }
//! }
//! ```
//!
//! Every field is optional.

use std::path::Path;

use converge_core::StateSnapshot;
use converge_poll::PollConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for the harness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Label used in logs instead of `probe <endpoint>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Poll configuration.
    pub poll: PollConfig,
    /// Probe targets. Empty means the expected snapshot's device names.
    pub devices: Vec<String>,
    /// Expected state, when it lives in the file rather than in code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<StateSnapshot>,
}

impl HarnessConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading harness config");
        Self::from_json_str(&json)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_devices<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devices = devices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expected(mut self, expected: StateSnapshot) -> Self {
        self.expected = Some(expected);
        self
    }
}
