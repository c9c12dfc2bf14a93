// tracegrep - core/html.rs
//
// Peripheral output encoding for -x/-X: HTML-escaping and XHTML framing.
// No state; plain functions over byte sinks.

use std::io::{self, Write};

use crate::core::entry::EntryKind;

pub const XHTML_PRELUDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8"/>
<title>tracegrep</title>
<style>
pre.message { color: #0a5; }
pre.network { color: #05a; }
pre.startup { color: #a50; }
pre.marked { font-weight: bold; background: #ffd; }
</style>
</head>
<body>
"#;

pub const XHTML_POSTLUDE: &str = "</body></html>\n";

/// Appends `src` to `out`, replacing `<`, `>`, `&`, `"` with their HTML
/// entities.
pub fn escape_into(src: &[u8], out: &mut Vec<u8>) {
    for &b in src {
        match b {
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'&' => out.extend_from_slice(b"&amp;"),
            b'"' => out.extend_from_slice(b"&quot;"),
            _ => out.push(b),
        }
    }
}

fn kind_class(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Unknown => "unknown",
        EntryKind::Message => "message",
        EntryKind::Network => "network",
        EntryKind::Startup => "startup",
    }
}

/// Wraps already-escaped `text` in an XHTML `<pre>` fragment.
pub fn xhtml_wrap<W: Write>(
    out: &mut W,
    kind: EntryKind,
    marked: bool,
    text: &[u8],
) -> io::Result<()> {
    let class = kind_class(kind);
    if marked {
        write!(out, "<pre class=\"{class} marked\">")?;
    } else {
        write!(out, "<pre class=\"{class}\">")?;
    }
    out.write_all(text)?;
    writeln!(out, "</pre>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_replaces_all_four_entities() {
        let mut out = Vec::new();
        escape_into(b"<a href=\"x\">&b</a>", &mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "&lt;a href=&quot;x&quot;&gt;&amp;b&lt;/a&gt;"
        );
    }

    #[test]
    fn xhtml_wrap_marks_class() {
        let mut out = Vec::new();
        xhtml_wrap(&mut out, EntryKind::Message, true, b"hello").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<pre class=\"message marked\">hello</pre>\n"
        );
    }

    #[test]
    fn xhtml_wrap_unmarked_omits_marked_class() {
        let mut out = Vec::new();
        xhtml_wrap(&mut out, EntryKind::Network, false, b"x").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<pre class=\"network\">x</pre>\n"
        );
    }
}
