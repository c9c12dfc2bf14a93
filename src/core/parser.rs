// tracegrep - core/parser.rs
//
// Stream-oriented parsing of telephony trace logs into structured Entries.
// Core layer: accepts any `Read`, never touches the filesystem directly.

use crate::core::entry::{Entry, EntryKind};
use crate::util::constants::READ_CHUNK_SIZE as READ_CHUNK;
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;

fn message_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:Sniffed|Returned) ").unwrap())
}

fn header_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\btime=(?P<ts>\S+)").unwrap())
}

fn header_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\baddress=(?P<address>\S+)").unwrap())
}

fn network_to_from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:[0-9.]+ )?<[a-zA-Z0-9]+:[a-zA-Z0-9]+> '.*' (?:sending|received) .* (?:to|from) (?P<address>[0-9.]+:[0-9]+)",
        )
        .unwrap()
    })
}

fn network_channel_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:[0-9.]+ )?<[a-zA-Z0-9]+:[a-zA-Z0-9]+> '[a-z]+:[0-9.]+:[0-9]+-(?P<address>[0-9.]+:[0-9]+)' (?:received [0-9]+ bytes|sending code [0-9]+)",
        )
        .unwrap()
    })
}

fn network_q931_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[0-9.]+ )?Q\.931 (?:Send|Receive).*?(?:to|from) (?P<address>[0-9.]+:[0-9]+)")
            .unwrap()
    })
}

fn startup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Yate \([0-9]+\) is starting ").unwrap())
}

fn param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^  param\['(?P<key>.*)'\] = '(?P<value>.*)'$").unwrap())
}

fn param_multiline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^  param\['(?P<key>.*)'\] = '(?P<value>.*)$").unwrap())
}

const RECORD_TERMINATOR: &str = "-----";

/// Buffers bytes from an arbitrary `Read` and hands back one delimited
/// "line" at a time, where the delimiter is chosen per call -- `\n` for
/// ordinary lines, `'` while reconstructing a multi-line parameter value.
/// The returned line includes its terminating delimiter; an empty return
/// means the stream is exhausted.
struct LineReader<R> {
    stream: R,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
    bytes_consumed: u64,
}

impl<R: Read> LineReader<R> {
    fn new(stream: R) -> Self {
        Self {
            stream,
            buf: Vec::with_capacity(READ_CHUNK),
            pos: 0,
            eof: false,
            bytes_consumed: 0,
        }
    }

    fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    fn fill(&mut self) -> bool {
        if self.eof {
            return false;
        }
        let start = self.buf.len();
        self.buf.resize(start + READ_CHUNK, 0);
        match self.stream.read(&mut self.buf[start..]) {
            Ok(0) => {
                self.buf.truncate(start);
                self.eof = true;
                false
            }
            Ok(n) => {
                self.buf.truncate(start + n);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "I/O error reading trace log; treating as end of stream");
                self.buf.truncate(start);
                self.eof = true;
                false
            }
        }
    }

    fn read_line(&mut self, delim: u8) -> String {
        loop {
            if let Some(rel) = self.buf[self.pos..].iter().position(|&b| b == delim) {
                let end = self.pos + rel + 1;
                let bytes = &self.buf[self.pos..end];
                let line = String::from_utf8_lossy(bytes).into_owned();
                self.bytes_consumed += line.len() as u64;
                self.pos = end;
                self.compact();
                return line;
            }
            if !self.fill() {
                // EOF: return whatever partial content remains, if any.
                if self.pos < self.buf.len() {
                    let bytes = &self.buf[self.pos..];
                    let line = String::from_utf8_lossy(bytes).into_owned();
                    self.bytes_consumed += line.len() as u64;
                    self.pos = self.buf.len();
                    self.compact();
                    return line;
                }
                return String::new();
            }
        }
    }

    fn compact(&mut self) {
        if self.pos > READ_CHUNK {
            self.buf.drain(0..self.pos);
            self.pos = 0;
        }
    }
}

/// What to do with a just-read line.
enum Action {
    /// Consumed without producing a new pending entry.
    Absorbed,
    /// Start a new entry; the parser hands back whatever was pending before.
    NewPending(Entry),
}

/// Lazily parses an input stream into a sequence of [`Entry`] values.
///
/// A plain, finite, non-restartable iterator: the stream is consumed
/// exactly once, in order.
pub struct Parser<R> {
    reader: LineReader<R>,
    pending: Option<Entry>,
    verbatim: bool,
    next_id: u64,
}

impl<R: Read> Parser<R> {
    pub fn new(stream: R) -> Self {
        Self {
            reader: LineReader::new(stream),
            pending: None,
            verbatim: false,
            next_id: 0,
        }
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.reader.bytes_consumed()
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn classify(&mut self, line: String) -> Action {
        // Classification patterns never care about the trailing newline;
        // matching against the trimmed form keeps every regex anchored at
        // the true end of content instead of juggling an optional `\n`.
        let trimmed = line.trim_end_matches(['\n', '\r']);

        if self.verbatim {
            if let Some(pending) = self.pending.as_mut() {
                pending.append_text(&line);
            }
            if trimmed.starts_with(RECORD_TERMINATOR) {
                self.verbatim = false;
            }
            return Action::Absorbed;
        }

        let is_message_pending = matches!(
            self.pending.as_ref().map(|e| e.kind()),
            Some(EntryKind::Message)
        );

        if is_message_pending {
            if let Some(caps) = param_re().captures(trimmed) {
                let key = caps["key"].to_string();
                let value = caps["value"].to_string();
                if let Some(pending) = self.pending.as_mut() {
                    pending.append_text(&line);
                    pending.set_param(key, value);
                }
                return Action::Absorbed;
            }
            if let Some(caps) = param_multiline_re().captures(trimmed) {
                let key = caps["key"].to_string();
                // The newline trimmed off for matching purposes is itself
                // part of the quoted value -- put it back before appending
                // the rest, read using `'` as the line delimiter.
                let mut value = caps["value"].to_string();
                value.push_str(&line[trimmed.len()..]);
                let tail = self.reader.read_line(b'\'');
                if let Some(pending) = self.pending.as_mut() {
                    pending.append_text(&line);
                    pending.append_text(&tail);
                }
                value.push_str(&tail);
                value.pop(); // drop the trailing quote consumed by read_line
                if let Some(pending) = self.pending.as_mut() {
                    pending.set_param(key, value);
                }
                return Action::Absorbed;
            }
        }

        if line.starts_with(' ') && self.pending.is_some() {
            if let Some(pending) = self.pending.as_mut() {
                pending.append_text(&line);
            }
            return Action::Absorbed;
        }

        if message_re().is_match(trimmed) {
            let mut entry = Entry::new(self.alloc_id(), EntryKind::Message, line.clone());
            if let Some(caps) = header_time_re().captures(trimmed) {
                entry.set_param("ts", &caps["ts"]);
            }
            if let Some(caps) = header_address_re().captures(trimmed) {
                entry.set_param("address", &caps["address"]);
            }
            return Action::NewPending(entry);
        }

        if let Some(caps) = network_to_from_re()
            .captures(trimmed)
            .or_else(|| network_channel_tag_re().captures(trimmed))
            .or_else(|| network_q931_re().captures(trimmed))
        {
            let mut entry = Entry::new(self.alloc_id(), EntryKind::Network, line.clone());
            entry.set_param("address", &caps["address"]);
            return Action::NewPending(entry);
        }

        if startup_re().is_match(trimmed) {
            return Action::NewPending(Entry::new(self.alloc_id(), EntryKind::Startup, line));
        }

        if trimmed.starts_with(RECORD_TERMINATOR) && self.pending.is_some() {
            if let Some(pending) = self.pending.as_mut() {
                pending.append_text(&line);
            }
            self.verbatim = true;
            return Action::Absorbed;
        }

        Action::NewPending(Entry::new(self.alloc_id(), EntryKind::Unknown, line))
    }
}

impl<R: Read> Iterator for Parser<R> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let line = self.reader.read_line(b'\n');
            if line.is_empty() {
                return self.pending.take();
            }
            match self.classify(line) {
                Action::Absorbed => continue,
                Action::NewPending(entry) => {
                    let previous = self.pending.replace(entry);
                    if previous.is_some() {
                        return previous;
                    }
                    // First entry ever seen: nothing to hand back yet, keep pulling.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_all(input: &str) -> Vec<Entry> {
        Parser::new(Cursor::new(input.as_bytes())).collect()
    }

    #[test]
    fn unknown_lines_roundtrip_text_and_kind() {
        let input = "hello world\nsecond line\n";
        let entries = parse_all(input);
        assert_eq!(entries.len(), 2);
        for e in &entries {
            assert_eq!(e.kind(), EntryKind::Unknown);
        }
        let joined: String = entries.iter().map(|e| e.text()).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn param_line_feeds_preceding_message() {
        let input = "Sniffed x\n  param['billid'] = '42'\n  param['other'] = 'z'\nSniffed y\n";
        let entries = parse_all(input);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind(), EntryKind::Message);
        assert_eq!(entries[0].param("billid"), Some("42"));
        assert_eq!(entries[0].param("other"), Some("z"));
        assert_eq!(
            entries[0].text(),
            "Sniffed x\n  param['billid'] = '42'\n  param['other'] = 'z'\n"
        );
    }

    #[test]
    fn multiline_value_reconstructed_minus_closing_quote() {
        let input = "Sniffed x\n  param['sdp'] = 'line one\nline two'\nSniffed y\n";
        let entries = parse_all(input);
        assert_eq!(entries[0].param("sdp"), Some("line one\nline two"));
    }

    #[test]
    fn verbatim_block_is_captured_as_text_without_new_entries() {
        let input = "Sniffed x\n-----\nraw dump line 1\nraw dump line 2\n-----\nSniffed y\n";
        let entries = parse_all(input);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].text().contains("raw dump line 1"));
        assert!(entries[0].text().contains("raw dump line 2"));
    }

    #[test]
    fn startup_banner_produces_startup_entry() {
        let input = "Sniffed a\nYate (123) is starting up\nSniffed b\n";
        let entries = parse_all(input);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].kind(), EntryKind::Startup);
    }

    #[test]
    fn eof_flushes_final_pending_entry() {
        let input = "Sniffed x\n  param['billid'] = '42'\n";
        let entries = parse_all(input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].param("billid"), Some("42"));
    }

    #[test]
    fn network_header_captures_address() {
        let input = "<sig:udp> 'rtp' sending 160 bytes to 10.0.0.1:5060\n";
        let entries = parse_all(input);
        assert_eq!(entries[0].kind(), EntryKind::Network);
        assert_eq!(entries[0].param("address"), Some("10.0.0.1:5060"));
    }
}
