// tracegrep - core/entry.rs
//
// The log record that flows through the whole pipeline: Parser -> Grep ->
// LogBuf -> Writer. Pure data, no I/O.
// Core layer: depends on std only.

/// The four kinds of record the parser is able to recognise.
///
/// Closed set -- the parser never needs a fifth kind, so this is a plain
/// enum rather than something extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Unknown,
    Message,
    Network,
    Startup,
}

/// One parsed log record.
///
/// `id` is assigned once at construction and never changes; it exists only
/// so the driver can recognise "the same entry" after it has been moved
/// through several owners (see [`crate::core::grep::Grep::run`], which needs
/// to tell whether the entry a `LogBuf` just evicted was the most recently
/// marked `Message`). It is never part of the emitted output.
#[derive(Debug, Clone)]
pub struct Entry {
    id: u64,
    kind: EntryKind,
    text: String,
    params: Vec<(String, String)>,
    marked: bool,
}

impl Entry {
    pub fn new(id: u64, kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
            params: Vec::new(),
            marked: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn append_text(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn marked(&self) -> bool {
        self.marked
    }

    pub fn mark(&mut self) {
        self.marked = true;
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Replace the first parameter named `name`, or append a new one.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.params.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.params.push((name, value));
        }
    }

    /// Value of the first parameter named `name`, if any.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_param_appends_new_and_replaces_existing() {
        let mut e = Entry::new(0, EntryKind::Message, "Sniffed x\n");
        e.set_param("billid", "1");
        e.set_param("other", "z");
        e.set_param("billid", "2");
        assert_eq!(e.param("billid"), Some("2"));
        assert_eq!(e.param("other"), Some("z"));
        assert_eq!(
            e.params(),
            &[
                ("billid".to_string(), "2".to_string()),
                ("other".to_string(), "z".to_string()),
            ]
        );
    }

    #[test]
    fn unmarked_by_default() {
        let e = Entry::new(0, EntryKind::Unknown, "x");
        assert!(!e.marked());
    }
}
