/// Permissioned committee coordination
///
/// Tracks who may participate, admits and removes members by quorum vote or
/// stake-weighted election, and collects one BLS key per member per round:
/// - Quorum voting with a `2 * approvals >= members` rule
/// - Append-only rounds with lazy timeout
/// - Deterministic top-K validator election with delegation
/// - Per-round key collection with pluggable combination

pub mod aggregation;
pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod election;
pub mod error;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod rounds;
pub mod service;
pub mod types;
pub mod voting;

pub use aggregation::{AggregateResult, KeySubmission};
pub use config::{CommitteeConfig, ConfigError};
pub use coordinator::{Committee, InMemoryCommittee};
pub use crypto::{BlsKeyCombiner, KeyCombiner, MemberKey, MemberKeyPair, ProofSigner, Secp256k1Verifier};
pub use error::{CommitteeError, ErrorKind, Result};
pub use events::Event;
pub use ledger::{Clock, InMemoryLedger, ManualClock, ProofVerifier, TransferError, ValueTransfer};
pub use rounds::{Round, RoundPhase};
pub use types::{AdmissionMode, Amount, Identity, Node, NodeStatus, RoundIndex};
