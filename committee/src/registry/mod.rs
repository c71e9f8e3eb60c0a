// Membership registry
//
// Authoritative record of every node's flags, deposit and stake, plus the
// pending, leaving and live-active sets. The registry never moves funds:
// callers compute refunds with `refund_for`, transfer, and only then call
// `demote`, so a failed transfer leaves the registry untouched.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::crypto::MemberKey;
use crate::error::{CommitteeError, Result};
use crate::events::Event;
use crate::types::{Amount, Identity, Node, NodeStatus, RoundIndex};

pub mod queue;

pub use queue::MemberQueue;

#[derive(Debug, Default)]
pub struct MembershipRegistry {
    nodes: HashMap<Identity, Node>,
    pending: MemberQueue,
    leaving: MemberQueue,
    /// Live membership in admission (or election rank) order
    active: Vec<Identity>,
    next_seq: u64,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, identity: &Identity) -> Option<&Node> {
        self.nodes.get(identity)
    }

    pub fn status(&self, identity: &Identity) -> NodeStatus {
        if self.pending.contains(identity) {
            NodeStatus::Pending
        } else if self.leaving.contains(identity) {
            NodeStatus::Leaving
        } else if self.nodes.get(identity).is_some_and(|n| n.active) {
            NodeStatus::Active
        } else {
            NodeStatus::Unknown
        }
    }

    pub fn is_active(&self, identity: &Identity) -> bool {
        self.nodes.get(identity).is_some_and(|n| n.active)
    }

    pub fn is_permissioned(&self, identity: &Identity) -> bool {
        self.nodes.get(identity).is_some_and(|n| n.is_permissioned)
    }

    pub fn active_members(&self) -> &[Identity] {
        &self.active
    }

    pub fn pending_candidates(&self) -> Vec<Identity> {
        self.pending.to_vec()
    }

    pub fn leaving_members(&self) -> Vec<Identity> {
        self.leaving.to_vec()
    }

    /// Check a join proposal without recording it
    pub fn check_register(&self, identity: &Identity, deposit: Amount, min_deposit: Amount) -> Result<()> {
        if deposit < min_deposit {
            return Err(CommitteeError::InsufficientDeposit {
                required: min_deposit,
                provided: deposit,
            });
        }
        if self.is_permissioned(identity) {
            return Err(CommitteeError::AlreadyPermissioned(*identity));
        }
        if self.pending.contains(identity) {
            return Err(CommitteeError::AlreadyPending(*identity));
        }
        Ok(())
    }

    /// Record a pending node; overwrites any zeroed record left by an earlier exit
    pub fn register_pending(
        &mut self,
        identity: Identity,
        deposit: Amount,
        min_deposit: Amount,
        round: RoundIndex,
    ) -> Result<Event> {
        self.check_register(&identity, deposit, min_deposit)?;

        let seq = self.next_seq;
        self.next_seq += 1;
        // Delegations still outstanding from an earlier membership carry over
        let carried = self.nodes.get(&identity).map(Node::delegated).unwrap_or_default();
        let mut node = Node::pending(deposit, seq);
        node.total_stake = carried;
        self.nodes.insert(identity, node);
        self.pending.insert(identity, seq);

        info!(identity = %identity, round, deposit = %deposit, "join proposed");
        Ok(Event::JoinProposed { identity, round })
    }

    /// Move a pending candidate into the live active set
    pub fn promote(&mut self, identity: Identity, round: RoundIndex) -> Result<Event> {
        if !self.pending.remove(&identity) {
            return Err(CommitteeError::NotCandidate(identity));
        }
        let node = self
            .nodes
            .get_mut(&identity)
            .ok_or(CommitteeError::UnknownNode(identity))?;
        node.is_permissioned = true;
        node.active = true;
        self.active.push(identity);

        info!(identity = %identity, round, "member joined");
        Ok(Event::Joined { identity, round })
    }

    /// Revoke voting and key-submission rights and queue the member for removal
    pub fn begin_leave(&mut self, identity: Identity, round: RoundIndex) -> Result<Event> {
        let node = self
            .nodes
            .get_mut(&identity)
            .filter(|n| n.active)
            .ok_or(CommitteeError::NotActive(identity))?;
        node.active = false;

        self.active.retain(|id| *id != identity);
        self.leaving.insert(identity, node.proposal_seq);

        info!(identity = %identity, round, "leave proposed");
        Ok(Event::LeaveProposed { identity, round })
    }

    /// Take an active member out of the live set without touching its funds.
    /// Used when a refund is owed but could not be paid yet.
    pub fn deactivate_to_leaving(&mut self, identity: Identity) {
        if let Some(node) = self.nodes.get_mut(&identity) {
            node.active = false;
            self.active.retain(|id| *id != identity);
            self.leaving.insert(identity, node.proposal_seq);
        }
    }

    /// Deposit plus self stake owed to `identity` on exit
    pub fn refund_for(&self, identity: &Identity) -> Result<Amount> {
        let node = self
            .nodes
            .get(identity)
            .ok_or(CommitteeError::UnknownNode(*identity))?;
        node.refundable().ok_or(CommitteeError::Overflow)
    }

    /// Zero the node's own funds and flags and drop it from every set.
    ///
    /// Delegated stake stays on the record until each delegation is settled,
    /// so `total_stake` keeps matching the delegation book.
    pub fn demote(&mut self, identity: Identity, round: RoundIndex) -> Result<Event> {
        let node = self
            .nodes
            .get_mut(&identity)
            .ok_or(CommitteeError::UnknownNode(identity))?;

        let delegated = node.delegated();
        node.is_permissioned = false;
        node.active = false;
        node.deposit = Amount::ZERO;
        node.self_stake = Amount::ZERO;
        node.total_stake = delegated;
        node.public_key = None;

        self.active.retain(|id| *id != identity);
        self.pending.remove(&identity);
        self.leaving.remove(&identity);

        info!(identity = %identity, round, "member left");
        Ok(Event::Left { identity, round })
    }

    /// Replace the live active order with an election result.
    /// Every identity must already be permissioned and active.
    pub fn set_active_order(&mut self, elected: Vec<Identity>) {
        self.active = elected;
    }

    /// Checked stake increase for a pending or active node
    pub fn add_self_stake(&mut self, identity: Identity, amount: Amount) -> Result<()> {
        let node = self.stakeable_mut(identity)?;
        let self_stake = node.self_stake.checked_add(amount).ok_or(CommitteeError::Overflow)?;
        let total = node.total_stake.checked_add(amount).ok_or(CommitteeError::Overflow)?;
        node.self_stake = self_stake;
        node.total_stake = total;
        debug!(identity = %identity, amount = %amount, total = %total, "stake added");
        Ok(())
    }

    pub fn add_delegated(&mut self, identity: Identity, amount: Amount) -> Result<()> {
        let node = self.stakeable_mut(identity)?;
        node.total_stake = node.total_stake.checked_add(amount).ok_or(CommitteeError::Overflow)?;
        Ok(())
    }

    pub fn sub_delegated(&mut self, identity: Identity, amount: Amount) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&identity)
            .ok_or(CommitteeError::UnknownNode(identity))?;
        let available = node.delegated();
        if amount > available {
            return Err(CommitteeError::StakeUnderflow {
                identity,
                requested: amount,
                available,
            });
        }
        node.total_stake -= amount;
        Ok(())
    }

    /// Validate that stake can be credited to `identity`
    pub fn check_stakeable(&self, identity: &Identity) -> Result<()> {
        match self.status(identity) {
            NodeStatus::Pending | NodeStatus::Active => Ok(()),
            NodeStatus::Leaving => Err(CommitteeError::NotActive(*identity)),
            NodeStatus::Unknown => Err(CommitteeError::UnknownNode(*identity)),
        }
    }

    pub fn set_public_key(&mut self, identity: &Identity, key: MemberKey) {
        if let Some(node) = self.nodes.get_mut(identity) {
            node.public_key = Some(key);
        }
    }

    fn stakeable_mut(&mut self, identity: Identity) -> Result<&mut Node> {
        self.check_stakeable(&identity)?;
        self.nodes
            .get_mut(&identity)
            .ok_or(CommitteeError::UnknownNode(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    const MIN: u64 = 100;

    fn addr(seed: u8) -> Address {
        Address::repeat_byte(seed)
    }

    fn registry_with_pending(ids: &[Address]) -> MembershipRegistry {
        let mut registry = MembershipRegistry::new();
        for id in ids {
            registry
                .register_pending(*id, U256::from(MIN), U256::from(MIN), 0)
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_register_pending() {
        let mut registry = MembershipRegistry::new();
        let event = registry
            .register_pending(addr(1), U256::from(150), U256::from(MIN), 4)
            .unwrap();

        assert_eq!(event, Event::JoinProposed { identity: addr(1), round: 4 });
        assert_eq!(registry.status(&addr(1)), NodeStatus::Pending);
        let node = registry.node(&addr(1)).unwrap();
        assert!(!node.is_permissioned);
        assert!(!node.active);
        assert_eq!(node.deposit, U256::from(150));
    }

    #[test]
    fn test_insufficient_deposit() {
        let mut registry = MembershipRegistry::new();
        let result = registry.register_pending(addr(1), U256::from(99), U256::from(MIN), 0);
        assert!(matches!(result, Err(CommitteeError::InsufficientDeposit { .. })));
        assert!(registry.node(&addr(1)).is_none());
    }

    #[test]
    fn test_already_permissioned_and_pending() {
        let mut registry = registry_with_pending(&[addr(1), addr(2)]);
        registry.promote(addr(1), 0).unwrap();

        assert_eq!(
            registry.register_pending(addr(1), U256::from(MIN), U256::from(MIN), 0),
            Err(CommitteeError::AlreadyPermissioned(addr(1)))
        );
        assert_eq!(
            registry.register_pending(addr(2), U256::from(MIN), U256::from(MIN), 0),
            Err(CommitteeError::AlreadyPending(addr(2)))
        );
    }

    #[test]
    fn test_promote() {
        let mut registry = registry_with_pending(&[addr(1)]);
        let event = registry.promote(addr(1), 2).unwrap();

        assert_eq!(event, Event::Joined { identity: addr(1), round: 2 });
        assert_eq!(registry.status(&addr(1)), NodeStatus::Active);
        assert_eq!(registry.active_members(), &[addr(1)]);
        assert!(registry.pending_candidates().is_empty());
        assert!(registry.is_permissioned(&addr(1)));
    }

    #[test]
    fn test_promote_requires_pending() {
        let mut registry = MembershipRegistry::new();
        assert_eq!(registry.promote(addr(9), 0), Err(CommitteeError::NotCandidate(addr(9))));
    }

    #[test]
    fn test_leave_then_demote() {
        let mut registry = registry_with_pending(&[addr(1), addr(2)]);
        registry.promote(addr(1), 0).unwrap();
        registry.promote(addr(2), 0).unwrap();

        registry.begin_leave(addr(1), 0).unwrap();
        assert_eq!(registry.status(&addr(1)), NodeStatus::Leaving);
        assert!(!registry.is_active(&addr(1)));
        assert!(registry.is_permissioned(&addr(1)));
        assert_eq!(registry.active_members(), &[addr(2)]);

        assert_eq!(registry.refund_for(&addr(1)).unwrap(), U256::from(MIN));
        registry.demote(addr(1), 1).unwrap();

        let node = registry.node(&addr(1)).unwrap();
        assert!(!node.is_permissioned);
        assert_eq!(node.deposit, U256::ZERO);
        assert_eq!(registry.status(&addr(1)), NodeStatus::Unknown);
        assert!(registry.leaving_members().is_empty());
    }

    #[test]
    fn test_begin_leave_requires_active() {
        let mut registry = registry_with_pending(&[addr(1)]);
        assert_eq!(registry.begin_leave(addr(1), 0), Err(CommitteeError::NotActive(addr(1))));
    }

    #[test]
    fn test_reregistration_after_exit() {
        let mut registry = registry_with_pending(&[addr(1)]);
        registry.promote(addr(1), 0).unwrap();
        registry.demote(addr(1), 0).unwrap();

        registry
            .register_pending(addr(1), U256::from(500), U256::from(MIN), 3)
            .unwrap();
        assert_eq!(registry.node(&addr(1)).unwrap().deposit, U256::from(500));
        assert_eq!(registry.status(&addr(1)), NodeStatus::Pending);
    }

    #[test]
    fn test_stake_accounting() {
        let mut registry = registry_with_pending(&[addr(1)]);
        registry.add_self_stake(addr(1), U256::from(30)).unwrap();
        registry.add_delegated(addr(1), U256::from(20)).unwrap();

        let node = registry.node(&addr(1)).unwrap();
        assert_eq!(node.self_stake, U256::from(30));
        assert_eq!(node.total_stake, U256::from(50));
        assert_eq!(registry.refund_for(&addr(1)).unwrap(), U256::from(MIN + 30));

        registry.sub_delegated(addr(1), U256::from(20)).unwrap();
        assert_eq!(registry.node(&addr(1)).unwrap().total_stake, U256::from(30));
        assert_eq!(
            registry.sub_delegated(addr(1), U256::from(1)),
            Err(CommitteeError::StakeUnderflow {
                identity: addr(1),
                requested: U256::from(1),
                available: U256::ZERO,
            })
        );
    }

    #[test]
    fn test_stake_overflow() {
        let mut registry = registry_with_pending(&[addr(1)]);
        registry.add_self_stake(addr(1), U256::MAX).unwrap();
        assert_eq!(
            registry.add_self_stake(addr(1), U256::from(1)),
            Err(CommitteeError::Overflow)
        );
        assert_eq!(registry.node(&addr(1)).unwrap().self_stake, U256::MAX);
    }

    #[test]
    fn test_stake_unknown_node() {
        let mut registry = MembershipRegistry::new();
        assert_eq!(
            registry.add_self_stake(addr(4), U256::from(1)),
            Err(CommitteeError::UnknownNode(addr(4)))
        );
    }

    #[test]
    fn test_demote_keeps_delegated_stake() {
        let mut registry = registry_with_pending(&[addr(1)]);
        registry.promote(addr(1), 0).unwrap();
        registry.add_self_stake(addr(1), U256::from(10)).unwrap();
        registry.add_delegated(addr(1), U256::from(7)).unwrap();

        registry.demote(addr(1), 0).unwrap();
        let node = registry.node(&addr(1)).unwrap();
        assert_eq!(node.self_stake, U256::ZERO);
        assert_eq!(node.total_stake, U256::from(7));
    }
}
