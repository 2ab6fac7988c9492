//! Shared fixtures for the `runxfer` integration tests.
//!
//! One fake per capability the crate abstracts over (process execution,
//! blob storage, notification sinks), plus tracing and timeout helpers.

pub mod fake_executor;
pub mod fake_store;
pub mod memory_sink;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use runxfer::logging::LOG_ENV_VAR;
use tracing_subscriber::EnvFilter;

/// Upper bound for one test body that talks to real processes or sockets.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// The filter comes from `RUNXFER_LOG`, like the binary's, and falls back
/// to `runxfer=debug,warn`. Output only shows up for failing tests unless
/// the harness runs with `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| EnvFilter::try_new(s).ok())
            .unwrap_or_else(|| EnvFilter::new("runxfer=debug,warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `fut`, failing the test if it runs longer than [`TEST_TIMEOUT`].
///
/// Not for `start_paused` tests: the paused clock would fire it early.
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(output) => output,
        Err(_) => panic!("test did not finish within {TEST_TIMEOUT:?}"),
    }
}
