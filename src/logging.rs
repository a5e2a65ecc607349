//! Logging setup for binaries that embed the engine.

use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global tracing subscriber that logs to stderr.
///
/// The log level is read from the `RUST_LOG` environment variable and
/// defaults to `info` when the variable is unset or invalid.
///
/// # Panics
/// Panics if a global subscriber has already been installed, so call this at
/// most once, early in `main`.
pub fn initialize() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
