//! Tracing initialization for host shells.

use tracing_subscriber::EnvFilter;

/// Install the default `tracing` subscriber.
///
/// Honors `RUST_LOG`, defaulting to `info`. Calling this more than once is a
/// no-op after the first successful initialization, so shells and tests can
/// both call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
