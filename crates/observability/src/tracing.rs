//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber: JSON lines, filtered by `RUST_LOG`
/// with `info` as the fallback.
///
/// Safe to call multiple times; only the first call installs anything.
pub fn init() {
    init_with_default("info");
}

/// Same as [`init`] with an explicit fallback filter, for tests that want
/// noisy targets quieted without touching the environment.
pub fn init_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
