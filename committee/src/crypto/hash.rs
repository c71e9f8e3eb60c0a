/// Digest helpers
///
/// Used to fingerprint aggregated round results. BLAKE3 by default,
/// SHA-256 where a consumer needs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DIGEST_SIZE: usize = 32;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Invalid digest size")]
    InvalidSize,
}

/// 32-byte digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    pub fn new(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, DigestError> {
        let bytes: [u8; DIGEST_SIZE] = slice.try_into().map_err(|_| DigestError::InvalidSize)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

/// Hash function selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashFunction {
    Sha256,
    #[default]
    Blake3,
}

pub fn digest(data: &[u8]) -> Digest {
    digest_with(data, HashFunction::default())
}

pub fn digest_with(data: &[u8], function: HashFunction) -> Digest {
    match function {
        HashFunction::Sha256 => {
            use sha2::{Digest as _, Sha256};
            let mut hasher = Sha256::new();
            hasher.update(data);
            Digest::new(hasher.finalize().into())
        }
        HashFunction::Blake3 => Digest::new(*blake3::hash(data).as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_consistency() {
        assert_eq!(digest(b"round"), digest(b"round"));
        assert_ne!(digest(b"round 1"), digest(b"round 2"));
    }

    #[test]
    fn test_functions_differ() {
        let data = b"committee";
        assert_ne!(
            digest_with(data, HashFunction::Sha256),
            digest_with(data, HashFunction::Blake3)
        );
    }

    #[test]
    fn test_sha256_known_vector() {
        let d = digest_with(b"abc", HashFunction::Sha256);
        assert_eq!(
            hex::encode(d.as_bytes()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_display() {
        let d = digest(b"test");
        assert_eq!(format!("{}", d).len(), 16);
    }

    #[test]
    fn test_from_slice_size() {
        assert!(Digest::from_slice(&[0u8; 31]).is_err());
        assert!(Digest::from_slice(&[0u8; 32]).is_ok());
    }
}
