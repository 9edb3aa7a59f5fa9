//! Logging setup.
//!
//! Stdout is reserved for probe output, so log lines always go to stderr.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Pick the filter: explicit directive, then `RUST_LOG`, then [`DEFAULT_LOG_FILTER`].
#[must_use]
pub fn env_filter(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    }
}

/// Install the global stderr subscriber. Later calls are ignored.
pub fn init(directive: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
