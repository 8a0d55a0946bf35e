//! Logging initialization.
//!
//! Libraries in this workspace only emit `tracing` events; binaries and test
//! suites pick a subscriber here. `RUST_LOG` overrides the default filter.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Default filter: everything under the `converge*` crates at info.
const DEFAULT_FILTER: &str = "converge=info";

/// Logging profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Human-readable output.
    #[default]
    Development,
    /// JSON structured output, one object per line.
    Production,
}

static INIT_ONCE: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber for `profile`.
///
/// Only the first call has an effect. If another global subscriber is
/// already installed, that one is left in place.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter())
                .try_init(),
        };
        if installed.is_err() {
            tracing::debug!("global subscriber already set; keeping it");
        }
    });
}

/// Subscriber for tests: output goes through the test harness's capture.
///
/// Safe to call from every test.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(env_filter())
        .try_init();
}
