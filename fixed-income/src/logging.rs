//! Logging bootstrap.
//!
//! The library crates only emit `tracing` events; installing a subscriber is
//! left to the application.  [`init_logging`] is the one-line way to do it.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a formatting subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (for example `"ql_bootstrap=debug,info"`) when the
/// variable is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes; calling it more than once is harmless.
pub fn init_logging(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
