// Stake, delegation and the round-start election pass

use tracing::{debug, info, warn};

use super::Committee;
use crate::election::{run_election, Candidate, Delegation};
use crate::error::{CommitteeError, Result};
use crate::events::Event;
use crate::ledger::{Clock, ProofVerifier, ValueTransfer};
use crate::types::{AdmissionMode, Amount, Identity, RoundIndex};

impl<C, T, V> Committee<C, T, V>
where
    C: Clock,
    T: ValueTransfer,
    V: ProofVerifier,
{
    /// Add self stake to a pending or active node
    pub fn stake(&mut self, identity: Identity, amount: Amount) -> Result<()> {
        self.ensure_mode(AdmissionMode::Election, "stake")?;
        if amount.is_zero() {
            return Err(CommitteeError::ZeroAmount);
        }

        self.registry.add_self_stake(identity, amount)?;
        self.events.push(Event::Staked { identity, amount });
        Ok(())
    }

    pub fn delegate(&mut self, delegator: Identity, validator: Identity, amount: Amount) -> Result<()> {
        self.ensure_mode(AdmissionMode::Election, "delegate")?;
        if amount.is_zero() {
            return Err(CommitteeError::ZeroAmount);
        }

        self.delegations.check_add(&delegator, &validator, amount)?;
        self.registry.add_delegated(validator, amount)?;
        let total = self.delegations.add(delegator, validator, amount)?;

        debug!(delegator = %delegator, validator = %validator, amount = %amount, total = %total, "delegated");
        self.events.push(Event::Delegated {
            delegator,
            validator,
            amount,
        });
        Ok(())
    }

    /// Pay `amount` of a delegation back to its delegator.
    ///
    /// Works whatever the validator's status, so stake parked on a removed
    /// node can always be recovered.
    pub fn revoke_delegation(&mut self, delegator: Identity, validator: Identity, amount: Amount) -> Result<()> {
        self.ensure_mode(AdmissionMode::Election, "revoke_delegation")?;
        if amount.is_zero() {
            return Err(CommitteeError::ZeroAmount);
        }
        self.delegations.check_remove(&delegator, &validator, amount)?;

        self.settle_delegation(delegator, validator, amount)?;
        self.events.push(Event::DelegationRevoked {
            delegator,
            validator,
            amount,
        });
        Ok(())
    }

    fn settle_delegation(&mut self, delegator: Identity, validator: Identity, amount: Amount) -> Result<()> {
        let delegated = self
            .registry
            .node(&validator)
            .map(|n| n.delegated())
            .unwrap_or_default();
        if amount > delegated {
            return Err(CommitteeError::StakeUnderflow {
                identity: validator,
                requested: amount,
                available: delegated,
            });
        }

        self.ledger.transfer(delegator, amount)?;
        self.delegations.remove_amount(&delegator, &validator, amount)?;
        self.registry.sub_delegated(validator, amount)?;
        Ok(())
    }

    /// Return every delegation to `validator`. Best effort per delegator.
    pub(super) fn refund_delegators(&mut self, validator: Identity, staged: &mut Vec<Event>) {
        let entries: Vec<Delegation> = self.delegations.delegations_to(&validator).to_vec();
        for Delegation { delegator, amount } in entries {
            match self.settle_delegation(delegator, validator, amount) {
                Ok(()) => staged.push(Event::DelegationRevoked {
                    delegator,
                    validator,
                    amount,
                }),
                Err(err) => {
                    warn!(delegator = %delegator, validator = %validator, error = %err, "delegation refund failed");
                    staged.push(Event::RefundFailed {
                        recipient: delegator,
                        amount,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    /// Settle every voluntary leaver; each one succeeds or fails on its own
    pub(super) fn process_leavers(&mut self, round: RoundIndex, staged: &mut Vec<Event>) {
        for identity in self.registry.leaving_members() {
            if let Err(err) = self.settle_exit(identity, round, staged) {
                self.report_demotion_failure(identity, &err, staged);
            }
        }
    }

    /// Re-rank incumbents and pending candidates and apply the top-K result
    pub(super) fn run_election(&mut self, round: RoundIndex, staged: &mut Vec<Event>) {
        let min_deposit = self.config.min_deposit;
        let incumbents = self.registry.active_members().iter().map(|id| (*id, true));
        let pending = self
            .registry
            .pending_candidates()
            .into_iter()
            .map(|id| (id, false));

        let pool: Vec<Candidate> = incumbents
            .chain(pending)
            .filter_map(|(identity, incumbent)| {
                let node = self.registry.node(&identity)?;
                (incumbent || node.deposit >= min_deposit).then(|| Candidate {
                    identity,
                    total_stake: node.total_stake,
                    seq: node.proposal_seq,
                    incumbent,
                })
            })
            .collect();

        let outcome = run_election(pool, self.config.max_validators);

        for identity in &outcome.demoted {
            if let Err(err) = self.settle_exit(*identity, round, staged) {
                self.report_demotion_failure(*identity, &err, staged);
                self.registry.deactivate_to_leaving(*identity);
            }
        }

        for identity in &outcome.promoted {
            match self.registry.promote(*identity, round) {
                Ok(event) => {
                    staged.push(event);
                    self.validator_set_changed(*identity, true, staged);
                }
                Err(err) => warn!(identity = %identity, error = %err, "elected candidate not promoted"),
            }
        }

        let elected: Vec<Identity> = outcome
            .elected
            .into_iter()
            .filter(|id| self.registry.is_active(id))
            .collect();
        info!(
            round,
            elected = elected.len(),
            demoted = outcome.demoted.len(),
            waiting = outcome.remaining.len(),
            "election complete"
        );
        self.registry.set_active_order(elected);
    }
}
