// External collaborators
//
// The committee core consumes exactly three capabilities from the ledger it
// runs on: a non-decreasing clock, an all-or-nothing value transfer, and a
// proof oracle that maps (message, proof) to the signing identity.

use thiserror::Error;

use crate::types::{Amount, Identity};

pub mod memory;

pub use memory::{InMemoryLedger, ManualClock};

/// Transfer failure reported by the ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Transfer rejected: {0}")]
    Rejected(String),
    #[error("Recipient {0} cannot receive funds")]
    RecipientRefused(Identity),
}

/// Monotonic time and sequence source
pub trait Clock {
    /// Current time in seconds; never decreases
    fn now(&self) -> u64;

    /// Current ledger sequence number; never decreases
    fn sequence(&self) -> u64;
}

/// Atomic value transfer
///
/// Either the full amount reaches `to` or nothing moves.
pub trait ValueTransfer {
    fn transfer(&mut self, to: Identity, amount: Amount) -> Result<(), TransferError>;
}

/// Signature-verification oracle
pub trait ProofVerifier {
    /// Identity that produced `proof` over `message`, if the proof is valid
    fn recover(&self, message: &[u8], proof: &[u8]) -> Option<Identity>;
}
