// tracegrep - core/query.rs
//
// The match predicate and its transitive term accumulation (channel/address
// correlation across a deep search). Core layer: depends on std only, but
// writes its dump-on-flush snapshot straight to stderr.

use crate::core::entry::{Entry, EntryKind};

/// Parameter names that identify a channel. Closed set -- the original trace
/// format never introduces a new one.
const CHANNEL_PARAM_NAMES: &[&str] = &[
    "id",
    "targetid",
    "peerid",
    "lastpeerid",
    "newid",
    "id.1",
    "newid.1",
    "peerid.1",
];

fn is_address_param(name: &str, value: &str) -> bool {
    name == "address" && value.contains(['.', '/', ':'])
}

/// Match predicate plus the correlation state a deep search accumulates.
#[derive(Debug, Clone)]
pub struct Query {
    params: Vec<(String, String)>,
    channels: Vec<String>,
    addrs: Vec<String>,
    new_channels: usize,
    new_addrs: usize,
    no_network: bool,
    dump_on_flush: bool,
}

impl Query {
    pub fn new(params: Vec<(String, String)>, no_network: bool, dump_on_flush: bool) -> Self {
        Self {
            params,
            channels: Vec::new(),
            addrs: Vec::new(),
            new_channels: 0,
            new_addrs: 0,
            no_network,
            dump_on_flush,
        }
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn addrs(&self) -> &[String] {
        &self.addrs
    }

    fn full_match(&self, entry: &Entry) -> bool {
        self.params
            .iter()
            .all(|(k, v)| entry.param(k) == Some(v.as_str()))
    }

    /// Returns true iff `entry` should be reported as a hit.
    ///
    /// `partial` restricts the channel/address scan to terms discovered
    /// since the last reset (the watermarks), which is what makes the
    /// driver's deep-search re-scan cheap instead of quadratic.
    pub fn matches(&self, entry: &Entry, partial: bool) -> bool {
        if !partial && entry.kind() == EntryKind::Message && self.full_match(entry) {
            return true;
        }

        let channel_start = if partial { self.new_channels } else { 0 };
        for chan in &self.channels[channel_start.min(self.channels.len())..] {
            let hit = entry
                .params()
                .iter()
                .any(|(n, v)| CHANNEL_PARAM_NAMES.contains(&n.as_str()) && v == chan);
            if hit {
                return true;
            }
        }

        if entry.kind() != EntryKind::Network || self.no_network {
            return false;
        }

        let addr_start = if partial { self.new_addrs } else { 0 };
        for addr in &self.addrs[addr_start.min(self.addrs.len())..] {
            let hit = entry
                .params()
                .iter()
                .any(|(n, v)| is_address_param(n, v) && v == addr);
            if hit {
                return true;
            }
        }

        false
    }

    /// Accumulates new correlation terms from a hit. No-op for non-Message
    /// entries. Returns true iff at least one new term was appended.
    pub fn update(&mut self, entry: &Entry, reset: bool) -> bool {
        if entry.kind() != EntryKind::Message {
            return false;
        }

        if reset {
            self.new_channels = self.channels.len();
            self.new_addrs = self.addrs.len();
        }

        let mut grew = false;
        for (name, value) in entry.params() {
            if CHANNEL_PARAM_NAMES.contains(&name.as_str()) {
                if !self.channels.iter().any(|c| c == value) {
                    self.channels.push(value.clone());
                    grew = true;
                }
            } else if is_address_param(name, value) && !self.addrs.iter().any(|a| a == value) {
                self.addrs.push(value.clone());
                grew = true;
            }
        }
        grew
    }

    /// Clears accumulated correlation state, preserving `params`. If
    /// `dump_on_flush` is set, writes a snapshot to stderr first.
    pub fn flush(&mut self) {
        if self.dump_on_flush && (!self.channels.is_empty() || !self.addrs.is_empty()) {
            eprintln!(
                "query flush: channels={:?} addrs={:?}",
                self.channels, self.addrs
            );
        }
        self.channels.clear();
        self.addrs.clear();
        self.new_channels = 0;
        self.new_addrs = 0;
    }
}
