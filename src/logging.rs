//! Tracing subscriber setup for binaries and tests embedding the adapter

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global subscriber.
///
/// Honors `RUST_LOG`, falling back to `info`. Returns `false` if a
/// subscriber was already installed.
pub fn init(json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(env_filter)
            .try_init()
            .is_ok()
    }
}
