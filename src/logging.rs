// ── Logging setup ─────────────────────────────────────────────────────────────
//
// Structured logging via `tracing`.  Release builds run without a console,
// so output is only visible when launched from a terminal or when stderr is
// redirected; the subscriber is still initialised unconditionally because it
// is cheap and `RUST_LOG` may point at a file via shell redirection.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initialise the global `tracing` subscriber.
///
/// The filter honours `RUST_LOG`; when unset, debug builds log at DEBUG and
/// release builds at WARN.
pub(crate) fn init() {
    let default_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
