// tracegrep - util/constants.rs
//
// Single source of truth for named defaults and limits, rather than magic
// numbers scattered across the pipeline and CLI layers.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "tracegrep";

/// Current application version (set from Cargo.toml at build time).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Pipeline defaults
// =============================================================================

/// Default `-B` look-back/correlation window size, in entries.
pub const DEFAULT_BUFFER_SIZE: usize = 300;

/// Default `-C` context window size, in entries (0 disables context mode).
pub const DEFAULT_CONTEXT: usize = 0;

/// Size of the Parser's internal read window, in bytes. Bounds how much is
/// requested from the OS per syscall, not the maximum line length.
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

// =============================================================================
// Progress indicator
// =============================================================================

/// Minimum wall-clock interval between progress indicator redraws.
pub const PROGRESS_UPDATE_INTERVAL_MS: u64 = 1_000;

// =============================================================================
// Logging
// =============================================================================

/// Module default log level, used when neither `RUST_LOG` nor `--debug` is
/// set.
pub const DEFAULT_LOG_LEVEL: &str = "warn";
