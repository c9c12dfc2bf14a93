// tracegrep - util/logging.rs
//
// Structured logging, separate from the tool's own stdout/stderr data
// streams (progress indicator, query dump, emitted entries).
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug (sets RUST_LOG=debug)
//
// Output: stderr. Never logs the tool's own output data.

use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// Priority: `RUST_LOG` env var > `--debug` CLI flag > module default.
pub fn init(debug_flag: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .init();

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "logging initialised"
    );
}
