//! Diagnostic logging setup.
//!
//! Logs go to stderr so that JSON reports on stdout stay machine-readable.
//! `CANON_VALIDATOR_LOG` takes an `EnvFilter` directive; setting
//! `CANON_VALIDATOR_TRACE=1` forces debug output for every phase.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CANON_VALIDATOR_LOG";
pub const TRACE_ENV: &str = "CANON_VALIDATOR_TRACE";

fn default_directive(verbose: bool) -> &'static str {
    if std::env::var(TRACE_ENV).ok().as_deref() == Some("1") {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
