/// Cryptography for the committee
///
/// Implements:
/// - BLS12-381 member round keys and a pluggable key combiner
/// - secp256k1 recoverable proofs (the default proof oracle)
/// - Digests for fingerprinting aggregated results

pub mod bls;
pub mod ecdsa;
pub mod hash;

pub use bls::{
    verify_aggregate, BlsKeyCombiner, KeyCombiner, KeyError, MemberKey, MemberKeyPair,
    MemberSecretKey, MemberSignature,
};
pub use ecdsa::{identity_of, ProofError, ProofSigner, Secp256k1Verifier};
pub use hash::{digest, digest_with, Digest, HashFunction};
