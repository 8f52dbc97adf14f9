// src/aggregate/merge.rs
use std::collections::HashMap;

use crate::aggregate::types::CanonicalEvent;

/// Identity of a canonical event. Exact string match, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    pub title: String,
    pub time: String,
    pub source: String,
}

impl MergeKey {
    pub fn of(ev: &CanonicalEvent) -> Self {
        Self {
            title: ev.title.clone(),
            time: ev.time.clone(),
            source: ev.source.clone(),
        }
    }
}

/// Append-only list of events plus a key → position lookup.
///
/// Emission order is the order in which keys were first seen; it never depends on
/// the map's iteration order.
#[derive(Debug, Default)]
pub struct MergeIndex {
    entries: Vec<CanonicalEvent>,
    positions: HashMap<MergeKey, usize>,
}

/// What `MergeIndex::absorb` did with an incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorbed {
    /// First record for its key.
    Seeded,
    /// Merged into an existing entry; carries the number of links appended.
    Merged(usize),
}

impl MergeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &MergeKey) -> Option<&CanonicalEvent> {
        self.positions.get(key).map(|&i| &self.entries[i])
    }

    /// Seed a new entry or fold the event's links into the existing one.
    ///
    /// Links are appended only when their URL is not listed yet; nothing already
    /// present is removed, replaced or reordered, and scalar fields keep the values
    /// of the first record.
    pub fn absorb(&mut self, incoming: CanonicalEvent) -> Absorbed {
        let key = MergeKey::of(&incoming);
        if let Some(&i) = self.positions.get(&key) {
            let entry = &mut self.entries[i];
            let added = incoming
                .links()
                .filter(|(url, label)| entry.push_link(url, label))
                .count();
            return Absorbed::Merged(added);
        }

        // Seed through push_link too, so a record repeating a URL stays duplicate-free.
        let mut seed = CanonicalEvent {
            options: Vec::with_capacity(incoming.options.len()),
            buttons: Vec::with_capacity(incoming.buttons.len()),
            ..incoming.clone()
        };
        for (url, label) in incoming.links() {
            seed.push_link(url, label);
        }
        self.positions.insert(key, self.entries.len());
        self.entries.push(seed);
        Absorbed::Seeded
    }

    pub fn into_events(self) -> Vec<CanonicalEvent> {
        self.entries
    }
}
