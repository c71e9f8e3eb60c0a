/// Stake-weighted validator election
///
/// Pure top-K selection over incumbents and pending candidates. The pool is
/// ordered by registration sequence and then stable-sorted by total stake,
/// so equal stakes resolve to whoever proposed first.

pub mod delegation;

pub use delegation::{Delegation, DelegationBook};

use serde::{Deserialize, Serialize};

use crate::types::{Amount, Identity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub identity: Identity,
    pub total_stake: Amount,
    /// Registration sequence, the tie-breaker
    pub seq: u64,
    /// Already in the live validator set
    pub incumbent: bool,
}

/// Result of one election pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElectionOutcome {
    /// New validator set, highest stake first
    pub elected: Vec<Identity>,
    /// Incumbents that fell out of the top K
    pub demoted: Vec<Identity>,
    /// Pending candidates that made it in
    pub promoted: Vec<Identity>,
    /// Pending candidates left for the next round
    pub remaining: Vec<Identity>,
}

pub fn run_election(mut pool: Vec<Candidate>, max_validators: usize) -> ElectionOutcome {
    pool.sort_by_key(|c| c.seq);
    // stable: equal stakes keep registration order
    pool.sort_by(|a, b| b.total_stake.cmp(&a.total_stake));

    let mut outcome = ElectionOutcome::default();
    for (rank, candidate) in pool.into_iter().enumerate() {
        let selected = rank < max_validators;
        match (selected, candidate.incumbent) {
            (true, true) => {}
            (true, false) => outcome.promoted.push(candidate.identity),
            (false, true) => outcome.demoted.push(candidate.identity),
            (false, false) => outcome.remaining.push(candidate.identity),
        }
        if selected {
            outcome.elected.push(candidate.identity);
        }
    }
    outcome
}
