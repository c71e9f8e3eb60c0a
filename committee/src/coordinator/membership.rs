// Admission and removal
//
// Joins and leaves are voted on in quorum mode. In election mode only the
// proposals are accepted here; leavers and newcomers are settled at the next
// round start.

use tracing::{debug, info};

use super::Committee;
use crate::error::{CommitteeError, Result};
use crate::events::Event;
use crate::ledger::{Clock, ProofVerifier, ValueTransfer};
use crate::types::{AdmissionMode, Amount, Identity, NodeStatus, RoundIndex};
use crate::voting::{has_quorum, Direction};

impl<C, T, V> Committee<C, T, V>
where
    C: Clock,
    T: ValueTransfer,
    V: ProofVerifier,
{
    /// Register `identity` as a pending candidate with `deposit` in escrow.
    ///
    /// With nobody to vote, the proposer is admitted on the spot: into the
    /// current snapshot during the bootstrap round, or into a fresh round
    /// if every member has since left.
    pub fn propose_join(&mut self, identity: Identity, deposit: Amount) -> Result<()> {
        let round = self.rounds.current_index();
        let mut staged = vec![self
            .registry
            .register_pending(identity, deposit, self.config.min_deposit, round)?];

        if self.rounds.current().active_nodes.is_empty() {
            staged.push(self.registry.promote(identity, round)?);
            self.rounds.seed_current(identity);
            self.validator_set_changed(identity, true, &mut staged);
            info!(identity = %identity, round, "bootstrap member admitted");
        } else if self.registry.active_members().is_empty() {
            staged.push(self.registry.promote(identity, round)?);
            self.validator_set_changed(identity, true, &mut staged);
            self.finalize_current(&mut staged);
            self.start_new_round(&mut staged);
            info!(identity = %identity, "committee re-seeded");
        }

        self.events.extend(staged);
        Ok(())
    }

    /// Approve a pending candidate. Returns true on the approval that admits it.
    pub fn approve_join(&mut self, voter: Identity, candidate: Identity) -> Result<bool> {
        self.ensure_mode(AdmissionMode::Quorum, "approve_join")?;
        self.authorize_member(&voter)?;
        if self.registry.status(&candidate) != NodeStatus::Pending {
            return Err(CommitteeError::NotCandidate(candidate));
        }

        let round = self.rounds.current_index();
        let members = self.rounds.current().active_nodes.len();
        let approvals = self.votes.record(Direction::Join, voter, candidate)?;
        if !has_quorum(approvals, members) {
            return Ok(false);
        }

        let event = self.registry.promote(candidate, round)?;
        self.votes.clear_target(&candidate);
        debug!(candidate = %candidate, approvals, members, "join quorum reached");
        self.events.push(event);
        Ok(true)
    }

    /// Give up membership. Voting and key rights end immediately.
    ///
    /// The last remaining member is removed and refunded at once.
    pub fn propose_leave(&mut self, identity: Identity) -> Result<()> {
        if !self.registry.is_active(&identity) {
            return Err(CommitteeError::NotActive(identity));
        }

        let round = self.rounds.current_index();
        let mut staged = Vec::new();
        if self.registry.active_members() == [identity] {
            staged.push(Event::LeaveProposed { identity, round });
            self.settle_exit(identity, round, &mut staged)?;
        } else {
            staged.push(self.registry.begin_leave(identity, round)?);
        }

        self.events.extend(staged);
        Ok(())
    }

    /// Approve a pending leave. Returns true on the approval that removes the member.
    ///
    /// The finalizing approval refunds the leaver before anything is
    /// recorded; a failed refund rejects the approval itself.
    pub fn approve_leave(&mut self, voter: Identity, target: Identity) -> Result<bool> {
        self.ensure_mode(AdmissionMode::Quorum, "approve_leave")?;
        self.authorize_member(&voter)?;
        if self.registry.status(&target) != NodeStatus::Leaving {
            return Err(CommitteeError::NotLeaving(target));
        }
        self.votes.check_vote(Direction::Leave, &voter, &target)?;

        let round = self.rounds.current_index();
        let members = self.rounds.current().active_nodes.len();
        let approvals = self.votes.approvals(Direction::Leave, &target) + 1;
        if !has_quorum(approvals, members) {
            self.votes.record(Direction::Leave, voter, target)?;
            return Ok(false);
        }

        let mut staged = Vec::new();
        self.settle_exit(target, round, &mut staged)?;
        debug!(target = %target, approvals, members, "leave quorum reached");
        self.events.extend(staged);
        Ok(true)
    }

    /// Refund and remove one member as a single unit.
    ///
    /// The member's own refund must succeed or nothing changes. Delegators
    /// are then paid back one by one; a refused delegator refund keeps that
    /// delegation on record.
    pub(super) fn settle_exit(
        &mut self,
        identity: Identity,
        round: RoundIndex,
        staged: &mut Vec<Event>,
    ) -> Result<()> {
        let refund = self.registry.refund_for(&identity)?;
        if !refund.is_zero() {
            self.ledger.transfer(identity, refund)?;
        }

        self.votes.clear_target(&identity);
        staged.push(self.registry.demote(identity, round)?);
        self.validator_set_changed(identity, false, staged);
        self.refund_delegators(identity, staged);

        info!(identity = %identity, round, refund = %refund, "member removed");
        Ok(())
    }
}
