//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "TESSERA_LOG";

/// Builds the filter: `TESSERA_LOG`, then `RUST_LOG`, then `debug` or `info`.
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Installs the global subscriber, writing to stderr. Calling it twice is a no-op.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
