// Committee error taxonomy
//
// Every rejected transition surfaces one specific variant. `kind()` groups
// them into the four families callers usually branch on.

use thiserror::Error;

use crate::ledger::TransferError;
use crate::types::{Amount, Identity, RoundIndex};

/// Error family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks the owner or active-member capability
    Authorization,
    /// Operation does not fit the current committee state
    State,
    /// Amount or balance constraint violated
    Resource,
    /// Stake or refund arithmetic overflowed or went out of balance
    Arithmetic,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitteeError {
    #[error("Caller {0} is not the owner")]
    NotOwner(Identity),

    #[error("{0} is not an active member")]
    NotPermissioned(Identity),

    #[error("Proof does not authenticate {0}")]
    InvalidProof(Identity),

    #[error("{voter} already voted for {target} this round")]
    DuplicateVote { voter: Identity, target: Identity },

    #[error("{0} already submitted a key this round")]
    DuplicateSubmission(Identity),

    #[error("Round mismatch: current round is {expected}, got {got}")]
    RoundMismatch { expected: RoundIndex, got: RoundIndex },

    #[error("Round {0} has expired")]
    RoundExpired(RoundIndex),

    #[error("Round {0} has not expired")]
    RoundNotExpired(RoundIndex),

    #[error("Round {0} does not exist")]
    RoundNotFound(RoundIndex),

    #[error("{0} is not a pending candidate")]
    NotCandidate(Identity),

    #[error("{0} has not proposed to leave")]
    NotLeaving(Identity),

    #[error("{0} is not active")]
    NotActive(Identity),

    #[error("{0} is already a permissioned member")]
    AlreadyPermissioned(Identity),

    #[error("{0} already has a pending join proposal")]
    AlreadyPending(Identity),

    #[error("No node record for {0}")]
    UnknownNode(Identity),

    #[error("{delegator} has no delegation to {validator}")]
    NoDelegationRecord { delegator: Identity, validator: Identity },

    #[error("Operation not available in {0} admission mode")]
    WrongAdmissionMode(&'static str),

    #[error("Invalid member key: {0}")]
    InvalidKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient deposit: need {required}, got {provided}")]
    InsufficientDeposit { required: Amount, provided: Amount },

    #[error("Revocation of {requested} exceeds delegated {delegated}")]
    ExceedsDelegated { requested: Amount, delegated: Amount },

    #[error("Amount must be non-zero")]
    ZeroAmount,

    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Stake accounting for {identity}: cannot release {requested}, only {available} delegated")]
    StakeUnderflow {
        identity: Identity,
        requested: Amount,
        available: Amount,
    },
}

impl CommitteeError {
    pub fn kind(&self) -> ErrorKind {
        use CommitteeError::*;
        match self {
            NotOwner(_) | NotPermissioned(_) | InvalidProof(_) => ErrorKind::Authorization,
            DuplicateVote { .. }
            | DuplicateSubmission(_)
            | RoundMismatch { .. }
            | RoundExpired(_)
            | RoundNotExpired(_)
            | RoundNotFound(_)
            | NotCandidate(_)
            | NotLeaving(_)
            | NotActive(_)
            | AlreadyPermissioned(_)
            | AlreadyPending(_)
            | UnknownNode(_)
            | NoDelegationRecord { .. }
            | WrongAdmissionMode(_)
            | InvalidKey(_)
            | InvalidConfig(_) => ErrorKind::State,
            InsufficientDeposit { .. } | ExceedsDelegated { .. } | ZeroAmount | TransferFailed(_) => {
                ErrorKind::Resource
            }
            Overflow | StakeUnderflow { .. } => ErrorKind::Arithmetic,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommitteeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn test_error_kinds() {
        let who = Address::repeat_byte(1);
        assert_eq!(CommitteeError::NotOwner(who).kind(), ErrorKind::Authorization);
        assert_eq!(
            CommitteeError::DuplicateVote { voter: who, target: who }.kind(),
            ErrorKind::State
        );
        assert_eq!(
            CommitteeError::InsufficientDeposit {
                required: U256::from(2),
                provided: U256::from(1),
            }
            .kind(),
            ErrorKind::Resource
        );
        assert_eq!(CommitteeError::Overflow.kind(), ErrorKind::Arithmetic);
    }

    #[test]
    fn test_stake_underflow_message() {
        let who = Address::repeat_byte(1);
        let err = CommitteeError::StakeUnderflow {
            identity: who,
            requested: U256::from(5),
            available: U256::from(3),
        };
        assert_eq!(err.kind(), ErrorKind::Arithmetic);
        assert!(err.to_string().contains("cannot release 5, only 3 delegated"));
        assert!(!err.to_string().contains("overflow"));
    }

    #[test]
    fn test_transfer_error_converts() {
        let err: CommitteeError = TransferError::Rejected("escrow empty".into()).into();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(err.to_string().contains("escrow empty"));
    }

    #[test]
    fn test_round_mismatch_message() {
        let err = CommitteeError::RoundMismatch { expected: 3, got: 2 };
        assert_eq!(err.to_string(), "Round mismatch: current round is 3, got 2");
    }
}
