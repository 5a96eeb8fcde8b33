//! Tracing subscriber setup for the CLI.
//!
//! Library code only emits `tracing` events and spans; the binary decides
//! where they go. Logs are written to stderr so JSON output on stdout stays
//! machine-readable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when neither `--debug` nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "stepwise=info";

/// Build the log filter.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
pub fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("stepwise=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(debug: bool) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter(debug))
        .try_init();
}
