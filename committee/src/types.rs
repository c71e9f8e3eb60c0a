/// Core committee data types
///
/// Identities are 20-byte addresses and amounts are 256-bit integers,
/// matching the ledger the committee runs on.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::crypto::MemberKey;

/// Participant identity
pub type Identity = Address;

/// Deposit / stake amount (smallest ledger unit)
pub type Amount = U256;

/// Dense, zero-based round index
pub type RoundIndex = u64;

/// How pending candidates become members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    /// Members approve joins and leaves by majority vote
    #[default]
    Quorum,
    /// Stake-weighted top-K selection at every round start
    Election,
}

/// Membership record for one identity
///
/// Records are zeroed rather than deleted on removal so historical round
/// snapshots keep resolving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub is_permissioned: bool,
    pub active: bool,
    pub deposit: Amount,
    pub self_stake: Amount,
    /// Self stake plus everything delegated to this node
    pub total_stake: Amount,
    /// Most recent round key this node submitted
    pub public_key: Option<MemberKey>,
    /// Registration order, used to break stake ties
    pub proposal_seq: u64,
}

impl Node {
    pub fn pending(deposit: Amount, proposal_seq: u64) -> Self {
        Self {
            deposit,
            proposal_seq,
            ..Self::default()
        }
    }

    /// Amount returned to the node itself when it leaves
    pub fn refundable(&self) -> Option<Amount> {
        self.deposit.checked_add(self.self_stake)
    }

    pub fn delegated(&self) -> Amount {
        self.total_stake.saturating_sub(self.self_stake)
    }
}

/// Lifecycle position of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Unknown,
    Pending,
    Active,
    Leaving,
}
