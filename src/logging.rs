//! Tracing subscriber setup for the command line tool

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{Error, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` (e.g. `info`)
/// applies. Logs go to stderr so `summary` output on stdout stays clean.
///
/// # Errors
///
/// Returns `Other` if a global subscriber is already installed.
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal());

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| Error::Other(format!("tracing already initialised: {err}")))
}
