//! Forwarding Information Base

use std::collections::HashMap;

use kite_core::{FaceId, Name};
use tracing::trace;

/// A next hop with its routing cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u64,
}

/// Next hops registered for one prefix, cheapest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibEntry {
    prefix: Name,
    next_hops: Vec<NextHop>,
}

impl FibEntry {
    fn new(prefix: Name) -> Self {
        Self {
            prefix,
            next_hops: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn next_hops(&self) -> &[NextHop] {
        &self.next_hops
    }

    pub fn has_next_hops(&self) -> bool {
        !self.next_hops.is_empty()
    }

    pub fn has_next_hop(&self, face: FaceId) -> bool {
        self.next_hops.iter().any(|nh| nh.face == face)
    }

    fn add_or_update(&mut self, face: FaceId, cost: u64) {
        self.next_hops.retain(|nh| nh.face != face);
        let at = self.next_hops.partition_point(|nh| nh.cost <= cost);
        self.next_hops.insert(at, NextHop { face, cost });
    }

    fn remove(&mut self, face: FaceId) -> bool {
        let before = self.next_hops.len();
        self.next_hops.retain(|nh| nh.face != face);
        self.next_hops.len() != before
    }
}

/// Name prefix to next hop mapping with longest-prefix match
#[derive(Debug, Default)]
pub struct Fib {
    entries: HashMap<Name, FibEntry>,
}

impl Fib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a next hop, or update its cost if already present
    pub fn insert(&mut self, prefix: Name, face: FaceId, cost: u64) {
        trace!(prefix = %prefix, face = %face, cost, "FIB next hop added");
        self.entries
            .entry(prefix.clone())
            .or_insert_with(|| FibEntry::new(prefix))
            .add_or_update(face, cost);
    }

    /// Remove one next hop. Drops the entry once it has none left.
    pub fn remove_next_hop(&mut self, prefix: &Name, face: FaceId) -> bool {
        let Some(entry) = self.entries.get_mut(prefix) else {
            return false;
        };
        let removed = entry.remove(face);
        if !entry.has_next_hops() {
            self.entries.remove(prefix);
        }
        removed
    }

    /// Remove `face` from every entry
    pub fn remove_face(&mut self, face: FaceId) {
        for entry in self.entries.values_mut() {
            entry.remove(face);
        }
        self.entries.retain(|_, entry| entry.has_next_hops());
    }

    pub fn find_exact(&self, prefix: &Name) -> Option<&FibEntry> {
        self.entries.get(prefix)
    }

    /// Longest registered prefix of `name`; an empty root entry if none
    pub fn find_longest_prefix_match(&self, name: &Name) -> FibEntry {
        (0..=name.len())
            .rev()
            .find_map(|len| self.entries.get(&name.prefix(len)))
            .cloned()
            .unwrap_or_else(|| FibEntry::new(Name::root()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
