//! Opt-in log output.
//!
//! The library only emits `tracing` events and never installs a subscriber
//! by itself. Callers that want to see them can install one for the current
//! thread:
//!
//! ```rust
//! let _guard = pulsefit_rs::logging::scoped_subscriber("pulsefit_rs=debug");
//! // events from this thread are printed until `_guard` is dropped
//! ```

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Install a formatted subscriber for the current thread.
///
/// `RUST_LOG` takes precedence over `default_filter` when it is set and
/// valid. The subscriber stays active until the returned guard is dropped.
pub fn scoped_subscriber(default_filter: &str) -> DefaultGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_default(subscriber)
}
