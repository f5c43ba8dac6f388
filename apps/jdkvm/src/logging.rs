//! Diagnostic logging.
//!
//! Diagnostics go to stderr through `tracing`; user-facing output stays on
//! stdout. `RUST_LOG` overrides the default filter, which is `jdkvm=warn`, or
//! `jdkvm=debug` with `--verbose`.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "jdkvm=debug" } else { "jdkvm=warn" }
}

/// Installs the global subscriber. Call once, before any command runs.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
