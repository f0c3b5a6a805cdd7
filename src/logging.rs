//! Diagnostic logging.
//!
//! Events go to stderr; stdout carries the JSON-RPC protocol.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "skillforge=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Calling it again is harmless; the first subscriber stays installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
