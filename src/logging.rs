//! Diagnostic logging for the `lockbox` binary.
//!
//! Library code only emits `tracing` events; this installs the
//! subscriber.  `LOCKBOX_LOG` takes an `EnvFilter` directive and wins
//! over `--verbose`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "LOCKBOX_LOG";

/// Filter used when `LOCKBOX_LOG` is unset or invalid.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "lockbox=debug,warn"
    } else {
        "lockbox=warn"
    }
}

/// Install a stderr `fmt` subscriber.  Safe to call more than once; later
/// calls are ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
