//! Tracing subscriber setup for the CLI.
//!
//! Library code emits structured `tracing` events and never installs a
//! subscriber; the binary calls [`init`] once at startup. `RUST_LOG`
//! overrides the default filter.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber: env-driven filter, compact output on
/// stderr, colors only when stderr is a terminal.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,magplan=info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
