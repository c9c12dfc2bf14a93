// tracegrep - core/grep.rs
//
// Orchestrates Parser -> Query -> LogBuf -> Writer: the deep-search driver
// that is the heart of the tool.

use std::io::{self, Write};

use crate::core::entry::{Entry, EntryKind};
use crate::core::logbuf::LogBuf;
use crate::core::query::Query;
use crate::core::writer::Writer;

/// Per-entry progress callback: total bytes consumed so far, entry's own
/// kind/marked state, current channel/address counts. The CLI layer uses
/// this to drive the stderr progress indicator without the driver knowing
/// anything about terminals or wall-clock time.
pub trait ProgressSink {
    fn report(&mut self, bytes_consumed: u64, marked_count: u64, query: &Query);
}

/// No-op sink for callers that don't want progress reporting (e.g. tests).
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _bytes_consumed: u64, _marked_count: u64, _query: &Query) {}
}

pub struct Grep {
    buf_size: usize,
}

impl Grep {
    pub fn new(buf_size: usize) -> Self {
        Self { buf_size }
    }

    /// Runs the pipeline to completion, consuming every entry from `entries`
    /// and feeding marked/unmarked entries to `writer` in order.
    pub fn run<I, W, P>(
        &self,
        entries: I,
        query: &mut Query,
        writer: &mut Writer<W>,
        progress: &mut P,
    ) -> io::Result<()>
    where
        I: Iterator<Item = Entry>,
        W: Write,
        P: ProgressSink,
    {
        let mut buf: LogBuf<Entry> = LogBuf::new(self.buf_size);
        let mut last_marked_message: Option<u64> = None;
        let mut marked_count: u64 = 0;
        let mut bytes_consumed: u64 = 0;

        for mut e in entries {
            bytes_consumed += e.text().len() as u64;

            if e.kind() == EntryKind::Startup {
                while let Some(x) = buf.pop() {
                    writer.eat(x)?;
                }
                query.flush();
                // A session boundary is always worth showing, independent of
                // the (now-flushed) query -- there is nothing meaningful to
                // match a Startup banner's empty params against anyway.
                e.mark();
                marked_count += 1;
            }

            if query.matches(&e, false) {
                e.mark();
                marked_count += 1;
                if e.kind() == EntryKind::Message {
                    last_marked_message = Some(e.id());
                }
                if query.update(&e, true) {
                    loop {
                        let mut modified = false;
                        for t in buf.iter_mut() {
                            if t.marked() {
                                continue;
                            }
                            if !query.matches(t, true) {
                                continue;
                            }
                            t.mark();
                            marked_count += 1;
                            // Tracks the outer `e`'s id here, not the
                            // just-marked `t`'s id -- intentional.
                            if e.kind() == EntryKind::Message {
                                last_marked_message = Some(e.id());
                            }
                            if query.update(t, false) {
                                modified = true;
                                break;
                            }
                        }
                        if !modified {
                            break;
                        }
                    }
                }
            }

            progress.report(bytes_consumed, marked_count, query);

            if let Some(evicted) = buf.pushpop(Some(e)) {
                let evicted_id = evicted.id();
                writer.eat(evicted)?;
                if Some(evicted_id) == last_marked_message {
                    last_marked_message = None;
                    query.flush();
                }
            }
        }

        while let Some(x) = buf.pop() {
            writer.eat(x)?;
        }
        writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::writer::OutputMode;
    use crate::core::Parser;
    use std::io::Cursor;

    fn run_over(input: &str, query_params: &[(&str, &str)], buf_size: usize) -> String {
        let parser = Parser::new(Cursor::new(input.as_bytes().to_vec()));
        let mut query = Query::new(
            query_params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            false,
            false,
        );
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out, OutputMode::Plain, 0);
        let grep = Grep::new(buf_size);
        grep.run(parser, &mut query, &mut writer, &mut NullProgress)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn full_match_only_reports_matching_message() {
        let input = "Sniffed x\n  param['billid'] = '42'\n  param['other'] = 'z'\n\
                     Sniffed y\n  param['billid'] = '99'\n";
        let out = run_over(input, &[("billid", "42")], 300);
        assert!(out.contains("Sniffed x"));
        assert!(!out.contains("Sniffed y"));
    }

    #[test]
    fn channel_correlation_reveals_later_matches() {
        let input = "Sniffed x\n  param['billid'] = '42'\nSniffed y\n  param['billid'] = '99'\n\
                     Sniffed z\n  param['id'] = 'chan/1'\n  param['billid'] = '42'\n\
                     Sniffed w\n  param['peerid'] = 'chan/1'\n  param['billid'] = '0'\n";
        let out = run_over(input, &[("billid", "42")], 300);
        assert!(out.contains("Sniffed x"));
        assert!(!out.contains("Sniffed y"));
        assert!(out.contains("Sniffed z"));
        assert!(out.contains("Sniffed w"));
    }

    #[test]
    fn startup_banner_flushes_correlation_state() {
        let input = "Sniffed a\n  param['billid'] = '42'\n  param['id'] = 'c1'\n\
                     Yate (123) is starting for real\n\
                     Sniffed b\n  param['id'] = 'c1'\n";
        let out = run_over(input, &[("billid", "42")], 300);
        assert!(out.contains("Sniffed a"));
        assert!(out.contains("Yate"));
        assert!(!out.contains("Sniffed b"));
    }

    #[test]
    fn eviction_with_small_buffer_still_emits_marked_entry() {
        let input = "Sniffed a\n  param['billid'] = '42'\nSniffed b\n\
                     Sniffed c\nSniffed d\n";
        let out = run_over(input, &[("billid", "42")], 3);
        assert!(out.contains("Sniffed a"));
        assert!(!out.contains("Sniffed b"));
    }

    #[test]
    fn no_matches_produces_empty_output() {
        let input = "Sniffed a\n  param['billid'] = '1'\n";
        let out = run_over(input, &[("billid", "42")], 300);
        assert!(out.is_empty() || out.trim().starts_with("..."));
    }

}
