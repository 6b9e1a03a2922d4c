//! Tracing/logging initialization.
//!
//! JSON lines on stderr; verbosity comes from `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset: session lifecycle and storage fallbacks at
/// `info`, everything else at `warn`.
pub const DEFAULT_FILTER: &str =
    "warn,vendorhub_session=info,vendorhub_storage=info,vendorhub_cache=info";

/// Install the global subscriber.
///
/// Returns `false` when one was already installed; the existing subscriber
/// keeps running.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
