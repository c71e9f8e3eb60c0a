// Insertion-ordered identity set
//
// Backs the pending and leaving sets: ordered iteration by registration
// sequence, O(log n) removal.

use std::collections::{BTreeMap, HashMap};

use crate::types::Identity;

#[derive(Debug, Default, Clone)]
pub struct MemberQueue {
    by_seq: BTreeMap<u64, Identity>,
    seq_of: HashMap<Identity, u64>,
}

impl MemberQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `identity` is already queued
    pub fn insert(&mut self, identity: Identity, seq: u64) -> bool {
        if self.seq_of.contains_key(&identity) {
            return false;
        }
        self.by_seq.insert(seq, identity);
        self.seq_of.insert(identity, seq);
        true
    }

    pub fn remove(&mut self, identity: &Identity) -> bool {
        match self.seq_of.remove(identity) {
            Some(seq) => {
                self.by_seq.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.seq_of.contains_key(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.by_seq.values()
    }

    pub fn to_vec(&self) -> Vec<Identity> {
        self.by_seq.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.seq_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq_of.is_empty()
    }
}
