// tracegrep - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation across module boundaries.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type returned by `main`'s fallible inner function.
#[derive(Debug)]
pub enum AppError {
    /// Bad arguments, or an I/O failure while opening input/output at
    /// startup.
    Cli(CliError),

    /// Anything that went wrong once the pipeline was running.
    Grep(GrepError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli(e) => write!(f, "{e}"),
            Self::Grep(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cli(e) => Some(e),
            Self::Grep(e) => Some(e),
        }
    }
}

impl From<CliError> for AppError {
    fn from(e: CliError) -> Self {
        Self::Cli(e)
    }
}

impl From<GrepError> for AppError {
    fn from(e: GrepError) -> Self {
        Self::Grep(e)
    }
}

// ---------------------------------------------------------------------------
// CLI / argument errors
// ---------------------------------------------------------------------------

/// Errors that keep the pipeline from ever starting: bad arguments, or the
/// input/output files named by those arguments not being openable.
#[derive(Debug)]
pub enum CliError {
    /// The query positional wasn't a `key=value` pair.
    MalformedQuery { given: String },

    /// The input path doesn't exist or couldn't be opened for reading.
    InputNotOpenable { path: PathBuf, source: io::Error },

    /// The `-o` output path couldn't be opened for writing.
    OutputNotOpenable { path: PathBuf, source: io::Error },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedQuery { given } => {
                write!(f, "query must be of the form key=value, got '{given}'")
            }
            Self::InputNotOpenable { path, source } => {
                write!(f, "cannot open input '{}': {source}", path.display())
            }
            Self::OutputNotOpenable { path, source } => {
                write!(f, "cannot open output '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedQuery { .. } => None,
            Self::InputNotOpenable { source, .. } => Some(source),
            Self::OutputNotOpenable { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Errors surfaced once the Parser/Query/Writer pipeline is running.
/// Malformed input is never an error here -- it degrades to an Unknown
/// entry; this enum exists for the write side, where a short write cannot
/// be made whole by retrying.
#[derive(Debug)]
pub enum GrepError {
    /// The output sink failed mid-stream (e.g. a broken pipe downstream, or
    /// disk full while writing to `-o`).
    Write(io::Error),
}

impl fmt::Display for GrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(e) => write!(f, "error writing output: {e}"),
        }
    }
}

impl std::error::Error for GrepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write(e) => Some(e),
        }
    }
}

impl From<io::Error> for GrepError {
    fn from(e: io::Error) -> Self {
        Self::Write(e)
    }
}

/// Convenience alias for the binary's top-level result type.
pub type Result<T> = std::result::Result<T, AppError>;
