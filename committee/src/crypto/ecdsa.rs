/// secp256k1 proofs of identity
///
/// Key submissions carry a 65-byte recoverable signature (`r || s || v`).
/// The verifier recovers the signer's public key and derives the 20-byte
/// identity the same way the ledger derives account addresses.

use alloy_primitives::{keccak256, Address};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use thiserror::Error;

use crate::ledger::ProofVerifier;

pub const PROOF_SIZE: usize = 65;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("Invalid key")]
    InvalidKey,
    #[error("Signing failed")]
    SigningFailed,
}

/// Identity key held by a member
#[derive(Clone)]
pub struct ProofSigner {
    inner: SigningKey,
}

impl ProofSigner {
    /// Generate a new random signing key
    pub fn generate() -> Self {
        Self {
            inner: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        let inner = SigningKey::from_slice(bytes).map_err(|_| ProofError::InvalidKey)?;
        Ok(Self { inner })
    }

    /// Identity controlled by this key
    pub fn identity(&self) -> Address {
        identity_of(self.inner.verifying_key())
    }

    /// Sign `message`, producing a recoverable proof
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ProofError> {
        let (signature, recovery_id) = self
            .inner
            .sign_recoverable(message)
            .map_err(|_| ProofError::SigningFailed)?;

        let mut proof = Vec::with_capacity(PROOF_SIZE);
        proof.extend_from_slice(&signature.to_bytes());
        proof.push(recovery_id.to_byte());
        Ok(proof)
    }
}

/// Derive the ledger identity of a public key
pub fn identity_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Default proof oracle
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Verifier;

impl ProofVerifier for Secp256k1Verifier {
    fn recover(&self, message: &[u8], proof: &[u8]) -> Option<Address> {
        if proof.len() != PROOF_SIZE {
            return None;
        }

        let signature = K256Signature::from_slice(&proof[..64]).ok()?;
        let recovery_id = RecoveryId::from_byte(proof[64])?;
        let key = VerifyingKey::recover_from_msg(message, &signature, recovery_id).ok()?;
        Some(identity_of(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_recover() {
        let signer = ProofSigner::generate();
        let proof = signer.sign(b"round 1").unwrap();

        assert_eq!(proof.len(), PROOF_SIZE);
        assert_eq!(Secp256k1Verifier.recover(b"round 1", &proof), Some(signer.identity()));
    }

    #[test]
    fn test_wrong_message_recovers_other_identity() {
        let signer = ProofSigner::generate();
        let proof = signer.sign(b"original").unwrap();

        let recovered = Secp256k1Verifier.recover(b"tampered", &proof);
        assert_ne!(recovered, Some(signer.identity()));
    }

    #[test]
    fn test_malformed_proof() {
        assert!(Secp256k1Verifier.recover(b"m", &[0u8; 10]).is_none());
        assert!(Secp256k1Verifier.recover(b"m", &[0u8; PROOF_SIZE]).is_none());
    }

    #[test]
    fn test_known_identity_derivation() {
        // Private key 1 maps to a well-known address
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let signer = ProofSigner::from_bytes(&secret).unwrap();
        let expected: Address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(signer.identity(), expected);
    }
}
