// Round manager
//
// Owns the append-only round sequence. A round's member snapshot is fixed
// when it starts; expiry is lazy and only observed when something reads it.
//
//   Open --(quorum of keys | timeout)--> Closing --(next round starts)--> Closed

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crypto::MemberKey;
use crate::error::{CommitteeError, Result};
use crate::types::{Identity, RoundIndex};

/// Majority rule shared by admission, removal and key closure:
/// `2 * approvals >= members`
pub fn has_quorum(approvals: usize, members: usize) -> bool {
    approvals.saturating_mul(2) >= members
}

/// Observable round state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Accepting key submissions
    Open,
    /// Threshold or timeout reached; the next operation rolls it over
    Closing,
    /// Superseded by a later round; read-only
    Closed,
}

/// One round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub index: RoundIndex,
    pub start_sequence: u64,
    pub started_at: u64,
    pub timeout_at: u64,
    /// Member snapshot taken at round start
    pub active_nodes: Vec<Identity>,
    pub public_keys: HashMap<Identity, MemberKey>,
    /// Submitters in arrival order
    pub submission_order: Vec<Identity>,
    pub is_finalized: bool,
}

impl Round {
    fn new(
        index: RoundIndex,
        active_nodes: Vec<Identity>,
        now: u64,
        sequence: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            index,
            start_sequence: sequence,
            started_at: now,
            timeout_at: now.saturating_add(timeout.as_secs()),
            active_nodes,
            public_keys: HashMap::new(),
            submission_order: Vec::new(),
            is_finalized: false,
        }
    }

    pub fn public_key_count(&self) -> usize {
        self.public_keys.len()
    }

    pub fn includes(&self, identity: &Identity) -> bool {
        self.active_nodes.contains(identity)
    }

    pub fn has_submitted(&self, identity: &Identity) -> bool {
        self.public_keys.contains_key(identity)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.timeout_at
    }

    /// Whether enough keys are in to close the round
    pub fn keys_reached_quorum(&self) -> bool {
        has_quorum(self.public_key_count(), self.active_nodes.len())
    }

    /// Store a key; returns false if `identity` already has one this round
    pub fn record_key(&mut self, identity: Identity, key: MemberKey) -> bool {
        if self.public_keys.contains_key(&identity) {
            return false;
        }
        self.public_keys.insert(identity, key);
        self.submission_order.push(identity);
        true
    }
}

pub struct RoundManager {
    rounds: Vec<Round>,
}

impl RoundManager {
    /// Create the manager with the bootstrap round (index 0, no members)
    pub fn new(now: u64, sequence: u64, timeout: Duration) -> Self {
        Self {
            rounds: vec![Round::new(0, Vec::new(), now, sequence, timeout)],
        }
    }

    pub fn current_index(&self) -> RoundIndex {
        (self.rounds.len() - 1) as RoundIndex
    }

    pub fn current(&self) -> &Round {
        &self.rounds[self.rounds.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut Round {
        let last = self.rounds.len() - 1;
        &mut self.rounds[last]
    }

    pub fn get(&self, index: RoundIndex) -> Result<&Round> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.rounds.get(i))
            .ok_or(CommitteeError::RoundNotFound(index))
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn is_expired(&self, index: RoundIndex, now: u64) -> Result<bool> {
        Ok(self.get(index)?.is_expired(now))
    }

    pub fn phase(&self, index: RoundIndex, now: u64) -> Result<RoundPhase> {
        let round = self.get(index)?;
        if index < self.current_index() {
            return Ok(RoundPhase::Closed);
        }
        if round.is_finalized || round.is_expired(now) {
            return Ok(RoundPhase::Closing);
        }
        Ok(RoundPhase::Open)
    }

    /// Seed the bootstrap member into the current, still empty snapshot
    pub fn seed_current(&mut self, identity: Identity) {
        let round = self.current_mut();
        if round.active_nodes.is_empty() {
            round.active_nodes.push(identity);
        }
    }

    /// A forced advance needs an expired round, or the bootstrap round
    pub fn check_force_advance(&self, now: u64) -> Result<()> {
        let current = self.current();
        if current.index == 0 || current.is_expired(now) {
            Ok(())
        } else {
            Err(CommitteeError::RoundNotExpired(current.index))
        }
    }

    /// Append a new round with the given snapshot. Always creates exactly one round.
    pub fn start_new_round(
        &mut self,
        active_nodes: Vec<Identity>,
        now: u64,
        sequence: u64,
        timeout: Duration,
    ) -> RoundIndex {
        let index = self.rounds.len() as RoundIndex;
        let round = Round::new(index, active_nodes, now, sequence, timeout);
        info!(
            round = index,
            members = round.active_nodes.len(),
            timeout_at = round.timeout_at,
            "round started"
        );
        self.rounds.push(round);
        index
    }
}
