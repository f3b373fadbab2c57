//! Diagnostic logging to stderr; stdout carries only command output.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `HOMELEDGER_LOG=debug`
/// or `HOMELEDGER_LOG=homeledger_core::schedule=debug`.
pub const LOG_ENV: &str = "HOMELEDGER_LOG";

/// Install the global subscriber. `--verbose` overrides the environment.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
