// Key aggregation
//
// Members submit one BLS round key each, authenticated by a secp256k1 proof
// over `DOMAIN || round (u64 LE) || key`. A round's result is the list of
// (identity, key) pairs; combining them into one key is left to a
// `KeyCombiner`.

use serde::{Deserialize, Serialize};

use crate::crypto::{
    digest_with, Digest, HashFunction, KeyCombiner, KeyError, MemberKey, ProofError, ProofSigner,
};
use crate::rounds::Round;
use crate::types::{Identity, RoundIndex};

/// Domain separator for submission proofs
pub const SUBMISSION_DOMAIN: &[u8] = b"committee-key";

/// Message a member signs to submit `key` for `round`
pub fn submission_message(round: RoundIndex, key: &MemberKey) -> Vec<u8> {
    let mut message = Vec::with_capacity(SUBMISSION_DOMAIN.len() + 8 + key.as_bytes().len());
    message.extend_from_slice(SUBMISSION_DOMAIN);
    message.extend_from_slice(&round.to_le_bytes());
    message.extend_from_slice(key.as_bytes());
    message
}

/// A signed key submission, ready for `Committee::submit_key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySubmission {
    pub voter: Identity,
    pub round: RoundIndex,
    pub key: Vec<u8>,
    pub proof: Vec<u8>,
}

impl KeySubmission {
    pub fn sign(signer: &ProofSigner, round: RoundIndex, key: &MemberKey) -> Result<Self, ProofError> {
        let proof = signer.sign(&submission_message(round, key))?;
        Ok(Self {
            voter: signer.identity(),
            round,
            key: key.to_vec(),
            proof,
        })
    }
}

/// Keys collected in one round, paired index-wise with their submitters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub round: RoundIndex,
    pub keys: Vec<MemberKey>,
    pub identities: Vec<Identity>,
    pub finalized: bool,
}

impl AggregateResult {
    /// Result in snapshot order; members that never submitted are skipped
    pub fn in_snapshot_order(round: &Round) -> Self {
        let (identities, keys) = round
            .active_nodes
            .iter()
            .filter_map(|id| round.public_keys.get(id).map(|key| (*id, *key)))
            .unzip();
        Self {
            round: round.index,
            keys,
            identities,
            finalized: round.is_finalized,
        }
    }

    /// Result in arrival order, as announced when the round closes
    pub fn in_submission_order(round: &Round) -> Self {
        let (identities, keys) = round
            .submission_order
            .iter()
            .filter_map(|id| round.public_keys.get(id).map(|key| (*id, *key)))
            .unzip();
        Self {
            round: round.index,
            keys,
            identities,
            finalized: round.is_finalized,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&Identity, &MemberKey)> {
        self.identities.iter().zip(self.keys.iter())
    }

    pub fn fingerprint(&self) -> Digest {
        self.fingerprint_with(HashFunction::default())
    }

    /// Digest over the round index and the ordered (identity, key) pairs
    pub fn fingerprint_with(&self, function: HashFunction) -> Digest {
        let mut data = Vec::with_capacity(8 + self.len() * (20 + 48));
        data.extend_from_slice(&self.round.to_le_bytes());
        for (identity, key) in self.pairs() {
            data.extend_from_slice(identity.as_slice());
            data.extend_from_slice(key.as_bytes());
        }
        digest_with(&data, function)
    }

    pub fn combine<K: KeyCombiner>(&self, combiner: &K) -> Result<K::Output, KeyError> {
        combiner.combine(&self.keys)
    }
}
