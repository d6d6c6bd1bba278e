//! Per-member trailing window of period labels.
//!
//! Two maps are kept apart until [`HistoryStore::merge`]: what was persisted
//! by earlier runs, and what the current period contributed. Labels within a
//! member are a sorted set; retention evicts from the front, so with
//! date-prefixed labels the oldest strike goes first.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::error::ReconError;
use crate::model::{Member, MemberId};

#[derive(Debug, Clone)]
struct Entry {
    member: Member,
    labels: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    name: String,
    retention: usize,
    previous: HashMap<MemberId, Entry>,
    previous_order: Vec<MemberId>,
    current: HashMap<MemberId, Entry>,
    current_order: Vec<MemberId>,
}

impl HistoryStore {
    /// An empty store. `name` labels log lines and error messages.
    pub fn new(name: impl Into<String>, retention: usize) -> Self {
        Self {
            name: name.into(),
            retention,
            previous: HashMap::new(),
            previous_order: Vec::new(),
            current: HashMap::new(),
            current_order: Vec::new(),
        }
    }

    /// Read a persisted store. A missing file is an empty history.
    pub fn load(path: &Path, retention: usize) -> Result<Self, ReconError> {
        let name = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(name, &text, retention),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(file = %name, "no prior history");
                Ok(Self::new(name, retention))
            }
            Err(e) => Err(ReconError::Io(format!("cannot read {name}: {e}"))),
        }
    }

    /// Parse `id\tname\tgender\tgroup\tlabel1,label2,label3` lines.
    pub fn parse(name: impl Into<String>, text: &str, retention: usize) -> Result<Self, ReconError> {
        let mut store = Self::new(name, retention);
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 5 {
                return Err(ReconError::input(
                    &store.name,
                    line_no,
                    format!("expected 5 tab-separated fields, found {}", fields.len()),
                ));
            }
            let member = Member::from_columns(&fields, &store.name, line_no)?;
            if store.previous.contains_key(&member.id) {
                return Err(ReconError::DuplicateIdentity {
                    file: store.name.clone(),
                    id: member.id.0,
                });
            }
            let labels: BTreeSet<String> = fields[4]
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            let mut entry = Entry { member, labels };
            let evicted = trim_labels(&mut entry.labels, retention);
            if evicted > 0 {
                debug!(file = %store.name, member = %entry.member, evicted, "trimmed on load");
            }
            store.previous_order.push(entry.member.id);
            store.previous.insert(entry.member.id, entry);
        }
        debug!(file = %store.name, members = store.previous.len(), "history loaded");
        Ok(store)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record `label` against `member` for the current period. Idempotent.
    pub fn add_current_violation(&mut self, member: &Member, label: &str) {
        match self.current.get_mut(&member.id) {
            Some(entry) => {
                entry.member = member.clone();
                entry.labels.insert(label.to_string());
            }
            None => {
                self.current_order.push(member.id);
                self.current.insert(
                    member.id,
                    Entry {
                        member: member.clone(),
                        labels: BTreeSet::from([label.to_string()]),
                    },
                );
            }
        }
    }

    /// Union each current member's persisted labels into their current set,
    /// then trim. Running it again changes nothing.
    pub fn merge(&mut self) {
        for id in self.current_order.clone() {
            if let Some(prev) = self.previous.get(&id) {
                if let Some(entry) = self.current.get_mut(&id) {
                    entry.labels.extend(prev.labels.iter().cloned());
                }
            }
            self.trim(id);
        }
    }

    /// Evict the smallest labels until the member is within retention.
    /// Returns how many were evicted.
    pub fn trim(&mut self, id: MemberId) -> usize {
        let retention = self.retention;
        let entry = match self.current.get_mut(&id) {
            Some(entry) => entry,
            None => match self.previous.get_mut(&id) {
                Some(entry) => entry,
                None => return 0,
            },
        };
        trim_labels(&mut entry.labels, retention)
    }

    /// Drop persisted members with no entry this period unless `keep` says
    /// otherwise. Returns the dropped members.
    pub fn release_untouched(&mut self, keep: impl Fn(MemberId) -> bool) -> Vec<Member> {
        let mut released = Vec::new();
        let current = &self.current;
        let previous = &mut self.previous;
        self.previous_order.retain(|id| {
            if current.contains_key(id) || keep(*id) {
                return true;
            }
            if let Some(entry) = previous.remove(id) {
                released.push(entry.member);
            }
            false
        });
        released
    }

    /// Labels held for a member: the current entry if touched this period,
    /// else the persisted one.
    pub fn labels(&self, id: MemberId) -> Option<&BTreeSet<String>> {
        self.current
            .get(&id)
            .or_else(|| self.previous.get(&id))
            .map(|e| &e.labels)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.current.contains_key(&id) || self.previous.contains_key(&id)
    }

    /// Every member with their labels, in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (&Member, &BTreeSet<String>)> {
        let touched = self.current_order.iter().map(move |id| &self.current[id]);
        let untouched = self
            .previous_order
            .iter()
            .filter(move |id| !self.current.contains_key(*id))
            .map(move |id| &self.previous[id]);
        touched.chain(untouched).map(|e| (&e.member, &e.labels))
    }

    /// Members holding at least `n` labels, in serialization order.
    pub fn members_at_or_above(&self, n: usize) -> Vec<(&Member, &BTreeSet<String>)> {
        self.iter().filter(|(_, labels)| labels.len() >= n).collect()
    }

    pub fn len(&self) -> usize {
        let untouched = self
            .previous_order
            .iter()
            .filter(|id| !self.current.contains_key(*id))
            .count();
        self.current_order.len() + untouched
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Members touched this period first, in insertion order, then untouched
    /// persisted members in file order.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (member, labels) in self.iter() {
            out.push_str(&member.to_columns());
            out.push('\t');
            out.push_str(&labels.iter().map(String::as_str).collect::<Vec<_>>().join(","));
            out.push('\n');
        }
        out
    }

    /// Member ids mapped to labels, for comparing stores.
    pub fn snapshot(&self) -> HashMap<MemberId, BTreeSet<String>> {
        self.iter().map(|(m, l)| (m.id, l.clone())).collect()
    }
}

fn trim_labels(labels: &mut BTreeSet<String>, retention: usize) -> usize {
    let mut evicted = 0;
    while labels.len() > retention {
        labels.pop_first();
        evicted += 1;
    }
    evicted
}
