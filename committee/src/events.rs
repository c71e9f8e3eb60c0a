// Committee notifications
//
// Emitted by state transitions and buffered until the caller drains them.
// Events from an aborted transition are never recorded.

use serde::{Deserialize, Serialize};

use crate::crypto::MemberKey;
use crate::types::{Amount, Identity, RoundIndex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    JoinProposed {
        identity: Identity,
        round: RoundIndex,
    },
    Joined {
        identity: Identity,
        round: RoundIndex,
    },
    LeaveProposed {
        identity: Identity,
        round: RoundIndex,
    },
    Left {
        identity: Identity,
        round: RoundIndex,
    },
    /// Keys in submission order, paired index-wise with `identities`
    KeyAggregated {
        round: RoundIndex,
        keys: Vec<MemberKey>,
        identities: Vec<Identity>,
    },
    Staked {
        identity: Identity,
        amount: Amount,
    },
    Delegated {
        delegator: Identity,
        validator: Identity,
        amount: Amount,
    },
    DelegationRevoked {
        delegator: Identity,
        validator: Identity,
        amount: Amount,
    },
    ValidatorSetChanged {
        identity: Identity,
        added: bool,
    },
    RoundStarted {
        round: RoundIndex,
        active_members: usize,
        timeout_at: u64,
    },
    /// A round-start demotion that could not be completed
    DemotionFailed {
        identity: Identity,
        reason: String,
    },
    /// A delegator refund that failed; the delegation stays on record
    RefundFailed {
        recipient: Identity,
        amount: Amount,
        reason: String,
    },
    ConfigUpdated {
        parameter: String,
        value: String,
    },
    OwnershipTransferred {
        previous: Identity,
        owner: Identity,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::JoinProposed { .. } => "JoinProposed",
            Event::Joined { .. } => "Joined",
            Event::LeaveProposed { .. } => "LeaveProposed",
            Event::Left { .. } => "Left",
            Event::KeyAggregated { .. } => "KeyAggregated",
            Event::Staked { .. } => "Staked",
            Event::Delegated { .. } => "Delegated",
            Event::DelegationRevoked { .. } => "DelegationRevoked",
            Event::ValidatorSetChanged { .. } => "ValidatorSetChanged",
            Event::RoundStarted { .. } => "RoundStarted",
            Event::DemotionFailed { .. } => "DemotionFailed",
            Event::RefundFailed { .. } => "RefundFailed",
            Event::ConfigUpdated { .. } => "ConfigUpdated",
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}

/// Buffer of committed events
#[derive(Debug, Default)]
pub struct EventLog {
    committed: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, events: Vec<Event>) {
        self.committed.extend(events);
    }

    pub fn push(&mut self, event: Event) {
        self.committed.push(event);
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.committed)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn test_event_log_drain() {
        let mut log = EventLog::new();
        let who = Address::repeat_byte(3);

        log.push(Event::JoinProposed { identity: who, round: 0 });
        log.extend(vec![Event::Joined { identity: who, round: 0 }]);
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained[0].name(), "JoinProposed");
        assert_eq!(drained[1].name(), "Joined");
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_json() {
        let event = Event::ValidatorSetChanged {
            identity: Address::repeat_byte(9),
            added: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
