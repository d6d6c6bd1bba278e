//! Every member ever observed, with the period they were first seen in.
//!
//! A member is "new this period" iff they were first observed in the current
//! period, whether in this process or in an earlier save of the same period.
//! Members are never removed.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::ReconError;
use crate::model::{Member, MemberId};

#[derive(Debug, Clone)]
struct RegistryEntry {
    member: Member,
    first_seen: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<MemberId, RegistryEntry>,
    order: Vec<MemberId>,
    new_this_period: HashSet<MemberId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse persisted lines: `id\tname\tgender\tgroup[\tfirst_seen]`.
    ///
    /// `file` only labels error messages.
    pub fn load(file: &str, text: &str) -> Result<Self, ReconError> {
        let mut registry = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() > 5 {
                return Err(ReconError::input(
                    file,
                    line_no,
                    format!("expected 4 or 5 tab-separated fields, found {}", fields.len()),
                ));
            }
            let member = Member::from_columns(&fields, file, line_no)?;
            if registry.entries.contains_key(&member.id) {
                return Err(ReconError::DuplicateIdentity {
                    file: file.into(),
                    id: member.id.0,
                });
            }
            let first_seen = fields
                .get(4)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            registry.order.push(member.id);
            registry
                .entries
                .insert(member.id, RegistryEntry { member, first_seen });
        }
        debug!(file, members = registry.len(), "registry loaded");
        Ok(registry)
    }

    /// Register a member seen in the current period. Idempotent; a known
    /// member's display fields are refreshed. A member first seen in this
    /// same period (a saved pass being re-run) still counts as new.
    pub fn observe(&mut self, member: &Member, period_label: &str) {
        match self.entries.get_mut(&member.id) {
            Some(entry) => {
                entry.member = member.clone();
                if entry.first_seen.as_deref() == Some(period_label) {
                    self.new_this_period.insert(member.id);
                }
            }
            None => {
                self.order.push(member.id);
                self.new_this_period.insert(member.id);
                self.entries.insert(
                    member.id,
                    RegistryEntry {
                        member: member.clone(),
                        first_seen: Some(period_label.to_string()),
                    },
                );
            }
        }
    }

    pub fn is_new_this_period(&self, id: MemberId) -> bool {
        self.new_this_period.contains(&id)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.entries.get(&id).map(|e| &e.member)
    }

    pub fn first_seen(&self, id: MemberId) -> Option<&str> {
        self.entries.get(&id).and_then(|e| e.first_seen.as_deref())
    }

    /// Members new this period, in observation order.
    pub fn new_members(&self) -> impl Iterator<Item = &Member> {
        self.order
            .iter()
            .filter(move |id| self.new_this_period.contains(*id))
            .filter_map(move |id| self.get(*id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loaded members first, in file order, then new members in observation order.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for id in &self.order {
            let entry = &self.entries[id];
            out.push_str(&entry.member.to_columns());
            out.push('\t');
            out.push_str(entry.first_seen.as_deref().unwrap_or(""));
            out.push('\n');
        }
        out
    }
}
