// tracegrep - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library, regex, tracing.
// Must NOT depend on the CLI or util::logging directly -- the driver takes
// a `ProgressSink` and an output `Write`, the rest is plumbed in by main.rs.

pub mod entry;
pub mod grep;
pub mod html;
pub mod logbuf;
pub mod parser;
pub mod query;
pub mod writer;

pub use entry::{Entry, EntryKind};
pub use parser::Parser;
