// tracegrep - core/writer.rs
//
// Emission side of the pipeline: decides, per Entry, whether to show it,
// fold it into a skip separator, or hold it in a context window waiting to
// see if a nearby match will pull it into view.

use std::io::{self, Write};

use crate::core::entry::Entry;
use crate::core::html::{escape_into, xhtml_wrap};
use crate::core::logbuf::LogBuf;

const SGR_BOLD: &str = "\u{1b}[1m";
const SGR_RESET: &str = "\u{1b}[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Plain,
    Xhtml,
}

pub struct Writer<W: Write> {
    out: W,
    mode: OutputMode,
    context: usize,
    /// Holds up to `context` most-recent unmatched entries as candidate
    /// before-context: flushed in full the moment a match arrives, or
    /// silently counted as skipped if no match ever claims them.
    pending: Option<LogBuf<Entry>>,
    showing: bool,
    tailcount: usize,
    skipped: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(out: W, mode: OutputMode, context: usize) -> Self {
        let pending = if context > 0 {
            Some(LogBuf::new(context))
        } else {
            None
        };
        Self {
            out,
            mode,
            context,
            pending,
            showing: false,
            tailcount: 0,
            skipped: 0,
        }
    }

    /// Consumes one Entry and decides whether to show it, fold it into a
    /// skip count, or hold it as candidate before-context.
    ///
    /// A marked entry always flushes whatever is held in `pending` first --
    /// those entries are exactly the `context` most recent ones, so they
    /// become the "before" half of the window. An unmarked entry either
    /// rides out the "after" half of a still-open window, or is pushed onto
    /// `pending`, where capacity eviction demotes the oldest held entry to a
    /// genuine skip.
    pub fn eat(&mut self, entry: Entry) -> io::Result<()> {
        if entry.marked() {
            if self.skipped > 0 {
                self.emit_skip_separator()?;
            }
            if let Some(buf) = self.pending.as_mut() {
                while let Some(held) = buf.pop() {
                    self.emit_entry(&held)?;
                }
            }
            self.emit_entry(&entry)?;
            self.skipped = 0;
            self.showing = true;
            self.tailcount = 0;
            return Ok(());
        }

        if self.context > 0 && self.showing {
            self.emit_entry(&entry)?;
            self.tailcount += 1;
            if self.tailcount >= self.context {
                self.showing = false;
            }
            return Ok(());
        }

        self.showing = false;
        match self.pending.as_mut() {
            Some(buf) => {
                if buf.pushpop(Some(entry)).is_some() {
                    self.skipped += 1;
                }
            }
            None => self.skipped += 1,
        }
        Ok(())
    }

    fn emit_entry(&mut self, entry: &Entry) -> io::Result<()> {
        match self.mode {
            OutputMode::Plain => {
                if entry.marked() && self.context > 0 {
                    write!(self.out, "{SGR_BOLD}")?;
                    self.out.write_all(entry.text().as_bytes())?;
                    write!(self.out, "{SGR_RESET}")?;
                } else {
                    self.out.write_all(entry.text().as_bytes())?;
                }
            }
            OutputMode::Xhtml => {
                let mut escaped = Vec::new();
                escape_into(entry.text().as_bytes(), &mut escaped);
                xhtml_wrap(&mut self.out, entry.kind(), entry.marked(), &escaped)?;
            }
        }
        Ok(())
    }

    fn emit_skip_separator(&mut self) -> io::Result<()> {
        writeln!(self.out, " ... skipped {} log entries ...", self.skipped)?;
        self.skipped = 0;
        Ok(())
    }

    /// Writes bytes straight to the underlying sink, bypassing entry
    /// framing. Used by the CLI layer for the XHTML document prelude and
    /// postlude, which aren't tied to any one Entry.
    pub fn raw_write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)
    }

    /// Drains whatever is left in `pending` -- it never became before-context
    /// because the stream ended before another match arrived, so it's
    /// counted as skipped -- then flushes the final skip counter.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(buf) = self.pending.as_mut() {
            while buf.pop().is_some() {
                self.skipped += 1;
            }
        }
        if self.skipped > 0 {
            self.emit_skip_separator()?;
        }
        self.out.flush()
    }
}
