//! Endpoint: a connectable reference to a remote host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Where a probe runs.
///
/// Opaque to the poller; only executors interpret it. Auth material is not
/// part of the endpoint and stays with the executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname or IP address.
    pub host: String,
    /// Login user.
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Endpoint {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == DEFAULT_PORT {
            write!(f, "{}@{}", self.user, self.host)
        } else {
            write!(f, "{}@{}:{}", self.user, self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ep = Endpoint::new("10.0.0.7", "ec2-user");
        assert_eq!(ep.to_string(), "ec2-user@10.0.0.7");
        assert_eq!(ep.with_port(2222).to_string(), "ec2-user@10.0.0.7:2222");
    }

    #[test]
    fn test_port_defaults_when_absent() {
        let ep: Endpoint = serde_json::from_str(r#"{"host":"h","user":"u"}"#).unwrap();
        assert_eq!(ep.port, DEFAULT_PORT);
    }
}
