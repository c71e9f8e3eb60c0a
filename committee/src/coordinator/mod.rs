/// Committee coordinator
///
/// Single-writer state machine composing the registry, round manager, vote
/// ledger, delegation book and key aggregation. Every public mutating call
/// is one transition: it validates, performs at most the transfers it needs,
/// commits, and only then publishes its events. A rejected call leaves no
/// trace.
///
/// Round rollover (`start_new_round`) is internal. It runs when a round's
/// key collection closes, or through the owner-gated `force_advance`.

mod keys;
mod membership;
mod staking;


use std::time::Duration;

use tracing::{info, warn};

use crate::aggregation::AggregateResult;
use crate::config::{CommitteeConfig, ConfigError};
use crate::crypto::Secp256k1Verifier;
use crate::election::{Delegation, DelegationBook};
use crate::error::{CommitteeError, Result};
use crate::events::{Event, EventLog};
use crate::ledger::{Clock, InMemoryLedger, ManualClock, ProofVerifier, ValueTransfer};
use crate::registry::MembershipRegistry;
use crate::rounds::{Round, RoundManager, RoundPhase};
use crate::types::{AdmissionMode, Amount, Identity, Node, NodeStatus, RoundIndex};
use crate::voting::{Direction, VoteLedger};

/// Committee wired to the in-memory collaborators
pub type InMemoryCommittee = Committee<ManualClock, InMemoryLedger, Secp256k1Verifier>;

pub struct Committee<C, T, V> {
    owner: Identity,
    config: CommitteeConfig,
    registry: MembershipRegistry,
    rounds: RoundManager,
    votes: VoteLedger,
    delegations: DelegationBook,
    clock: C,
    ledger: T,
    verifier: V,
    events: EventLog,
}

impl<C, T, V> Committee<C, T, V>
where
    C: Clock,
    T: ValueTransfer,
    V: ProofVerifier,
{
    /// Create a committee with an empty bootstrap round
    pub fn new(
        owner: Identity,
        config: CommitteeConfig,
        clock: C,
        ledger: T,
        verifier: V,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let rounds = RoundManager::new(clock.now(), clock.sequence(), config.round_timeout);
        let mut events = EventLog::new();
        events.push(Event::RoundStarted {
            round: 0,
            active_members: 0,
            timeout_at: rounds.current().timeout_at,
        });

        info!(owner = %owner, admission = ?config.admission, "committee created");
        Ok(Self {
            owner,
            config,
            registry: MembershipRegistry::new(),
            rounds,
            votes: VoteLedger::new(),
            delegations: DelegationBook::new(),
            clock,
            ledger,
            verifier,
            events,
        })
    }

    // ===== Queries =====

    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn config(&self) -> &CommitteeConfig {
        &self.config
    }

    pub fn node(&self, identity: &Identity) -> Option<&Node> {
        self.registry.node(identity)
    }

    pub fn status(&self, identity: &Identity) -> NodeStatus {
        self.registry.status(identity)
    }

    pub fn pending_candidates(&self) -> Vec<Identity> {
        self.registry.pending_candidates()
    }

    pub fn leaving_members(&self) -> Vec<Identity> {
        self.registry.leaving_members()
    }

    /// Live membership; becomes the next round's snapshot
    pub fn active_members(&self) -> &[Identity] {
        self.registry.active_members()
    }

    pub fn current_round_index(&self) -> RoundIndex {
        self.rounds.current_index()
    }

    pub fn current_round(&self) -> &Round {
        self.rounds.current()
    }

    pub fn round(&self, index: RoundIndex) -> Result<&Round> {
        self.rounds.get(index)
    }

    pub fn is_expired(&self, index: RoundIndex) -> Result<bool> {
        self.rounds.is_expired(index, self.clock.now())
    }

    pub fn round_phase(&self, index: RoundIndex) -> Result<RoundPhase> {
        self.rounds.phase(index, self.clock.now())
    }

    pub fn join_approvals(&self, candidate: &Identity) -> usize {
        self.votes.approvals(Direction::Join, candidate)
    }

    pub fn leave_approvals(&self, target: &Identity) -> usize {
        self.votes.approvals(Direction::Leave, target)
    }

    pub fn delegations(&self, validator: &Identity) -> &[Delegation] {
        self.delegations.delegations_to(validator)
    }

    /// Collected keys for `index` in snapshot order; open rounds give partial results
    pub fn get_aggregate(&self, caller: &Identity, index: RoundIndex) -> Result<AggregateResult> {
        if !self.registry.is_permissioned(caller) {
            return Err(CommitteeError::NotPermissioned(*caller));
        }
        Ok(AggregateResult::in_snapshot_order(self.rounds.get(index)?))
    }

    /// Take every event committed since the last drain
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // ===== Owner administration =====

    pub fn set_round_timeout(&mut self, caller: &Identity, timeout: Duration) -> Result<()> {
        self.ensure_owner(caller)?;
        let mut updated = self.config.clone();
        updated.round_timeout = timeout;
        self.apply_config(updated, "round_timeout", format!("{}s", timeout.as_secs()))
    }

    pub fn set_min_deposit(&mut self, caller: &Identity, min_deposit: Amount) -> Result<()> {
        self.ensure_owner(caller)?;
        let mut updated = self.config.clone();
        updated.min_deposit = min_deposit;
        self.apply_config(updated, "min_deposit", min_deposit.to_string())
    }

    pub fn set_max_validators(&mut self, caller: &Identity, max_validators: usize) -> Result<()> {
        self.ensure_owner(caller)?;
        let mut updated = self.config.clone();
        updated.max_validators = max_validators;
        self.apply_config(updated, "max_validators", max_validators.to_string())
    }

    pub fn transfer_ownership(&mut self, caller: &Identity, new_owner: Identity) -> Result<()> {
        self.ensure_owner(caller)?;
        let previous = std::mem::replace(&mut self.owner, new_owner);
        info!(previous = %previous, owner = %new_owner, "ownership transferred");
        self.events.push(Event::OwnershipTransferred {
            previous,
            owner: new_owner,
        });
        Ok(())
    }

    /// Close the current round and open the next one.
    ///
    /// Only the owner may do this, and only once the round has expired or
    /// while the committee is still in its bootstrap round.
    pub fn force_advance(&mut self, caller: &Identity) -> Result<RoundIndex> {
        self.ensure_owner(caller)?;
        self.rounds.check_force_advance(self.clock.now())?;

        let mut staged = Vec::new();
        self.finalize_current(&mut staged);
        let index = self.start_new_round(&mut staged);
        self.events.extend(staged);
        Ok(index)
    }

    // ===== Internals =====

    fn ensure_owner(&self, caller: &Identity) -> Result<()> {
        if *caller != self.owner {
            return Err(CommitteeError::NotOwner(*caller));
        }
        Ok(())
    }

    fn ensure_mode(&self, mode: AdmissionMode, operation: &'static str) -> Result<()> {
        if self.config.admission != mode {
            return Err(CommitteeError::WrongAdmissionMode(operation));
        }
        Ok(())
    }

    fn is_election(&self) -> bool {
        self.config.admission == AdmissionMode::Election
    }

    fn apply_config(&mut self, updated: CommitteeConfig, parameter: &str, value: String) -> Result<()> {
        updated
            .validate()
            .map_err(|e| CommitteeError::InvalidConfig(e.to_string()))?;
        self.config = updated;

        info!(parameter, value = %value, "config updated");
        self.events.push(Event::ConfigUpdated {
            parameter: parameter.to_string(),
            value,
        });
        Ok(())
    }

    /// Voters must be active and part of the current round's snapshot
    fn authorize_member(&self, voter: &Identity) -> Result<()> {
        if self.registry.is_active(voter) && self.rounds.current().includes(voter) {
            Ok(())
        } else {
            Err(CommitteeError::NotPermissioned(*voter))
        }
    }

    fn validator_set_changed(&self, identity: Identity, added: bool, staged: &mut Vec<Event>) {
        if self.is_election() {
            staged.push(Event::ValidatorSetChanged { identity, added });
        }
    }

    /// Mark the current round finalized and announce what it collected
    fn finalize_current(&mut self, staged: &mut Vec<Event>) {
        let round = self.rounds.current_mut();
        if round.is_finalized {
            return;
        }
        round.is_finalized = true;

        let result = AggregateResult::in_submission_order(round);
        info!(round = result.round, keys = result.len(), "round finalized");
        if !result.is_empty() {
            staged.push(Event::KeyAggregated {
                round: result.round,
                keys: result.keys,
                identities: result.identities,
            });
        }
    }

    /// Roll over to a new round. Always appends exactly one round.
    ///
    /// Clears every outstanding vote, then in election mode settles leavers
    /// and re-runs the election before snapshotting the live membership.
    fn start_new_round(&mut self, staged: &mut Vec<Event>) -> RoundIndex {
        let next = self.rounds.current_index() + 1;
        self.votes.clear_all();

        if self.is_election() {
            self.process_leavers(next, staged);
            self.run_election(next, staged);
        }

        let snapshot = self.registry.active_members().to_vec();
        let members = snapshot.len();
        let index = self.rounds.start_new_round(
            snapshot,
            self.clock.now(),
            self.clock.sequence(),
            self.config.round_timeout,
        );
        staged.push(Event::RoundStarted {
            round: index,
            active_members: members,
            timeout_at: self.rounds.current().timeout_at,
        });
        index
    }

    /// Record a failed bulk step without aborting the rest of the pass
    fn report_demotion_failure(&self, identity: Identity, err: &CommitteeError, staged: &mut Vec<Event>) {
        warn!(identity = %identity, error = %err, "demotion failed, retrying next round");
        staged.push(Event::DemotionFailed {
            identity,
            reason: err.to_string(),
        });
    }
}
