// Join/leave vote ledger
//
// One approval per (voter, target, direction) per round. Counts are exact
// cardinalities of the recorded voter lists; the whole ledger is cleared at
// round rollover.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CommitteeError, Result};
use crate::types::Identity;

pub use crate::rounds::has_quorum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Join,
    Leave,
}

#[derive(Debug, Default)]
pub struct VoteLedger {
    approvals: HashMap<(Direction, Identity), Vec<Identity>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, direction: Direction, voter: &Identity, target: &Identity) -> bool {
        self.approvals
            .get(&(direction, *target))
            .is_some_and(|voters| voters.contains(voter))
    }

    /// Reject a second approval from the same voter
    pub fn check_vote(&self, direction: Direction, voter: &Identity, target: &Identity) -> Result<()> {
        if self.has_voted(direction, voter, target) {
            return Err(CommitteeError::DuplicateVote {
                voter: *voter,
                target: *target,
            });
        }
        Ok(())
    }

    /// Record an approval and return the new count for `target`
    pub fn record(&mut self, direction: Direction, voter: Identity, target: Identity) -> Result<usize> {
        self.check_vote(direction, &voter, &target)?;
        let voters = self.approvals.entry((direction, target)).or_default();
        voters.push(voter);
        debug!(voter = %voter, target = %target, ?direction, approvals = voters.len(), "vote recorded");
        Ok(voters.len())
    }

    pub fn approvals(&self, direction: Direction, target: &Identity) -> usize {
        self.approvals.get(&(direction, *target)).map_or(0, Vec::len)
    }

    /// Voters for `target` in the order they approved
    pub fn voters(&self, direction: Direction, target: &Identity) -> &[Identity] {
        self.approvals
            .get(&(direction, *target))
            .map_or(&[], Vec::as_slice)
    }

    /// Drop every vote referencing `target`, in both directions
    pub fn clear_target(&mut self, target: &Identity) {
        self.approvals.remove(&(Direction::Join, *target));
        self.approvals.remove(&(Direction::Leave, *target));
    }

    pub fn clear_all(&mut self) {
        self.approvals.clear();
    }

    /// Number of targets with at least one approval
    pub fn len(&self) -> usize {
        self.approvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty()
    }
}
