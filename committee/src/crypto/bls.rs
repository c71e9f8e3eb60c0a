/// BLS12-381 member round keys
///
/// Each active member contributes one `min_pk` public key per round. The
/// committee only collects them; combining is left to a `KeyCombiner`.
/// `BlsKeyCombiner` sums the keys into a single aggregate public key, which
/// verifies signatures aggregated from the same members.

use blst::min_pk::{
    AggregatePublicKey, PublicKey as BlstPublicKey, SecretKey as BlstSecretKey,
    Signature as BlstSignature,
};
use std::fmt;
use thiserror::Error;

pub const MEMBER_KEY_SIZE: usize = 48;
pub const MEMBER_SECRET_KEY_SIZE: usize = 32;

const SIGNING_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid key encoding")]
    InvalidKey,
    #[error("No keys to combine")]
    Empty,
    #[error("Key aggregation failed")]
    AggregationFailed,
}

/// Compressed, validated member public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKey([u8; MEMBER_KEY_SIZE]);

impl MemberKey {
    /// Decode and subgroup-check a public key (compressed or uncompressed)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let pk = BlstPublicKey::key_validate(bytes).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self(pk.to_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; MEMBER_KEY_SIZE] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn to_blst(self) -> Result<BlstPublicKey, KeyError> {
        BlstPublicKey::from_bytes(&self.0).map_err(|_| KeyError::InvalidKey)
    }
}

impl fmt::Debug for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberKey({})", hex::encode(&self.0[..8]))
    }
}

/// Member secret key
#[derive(Clone)]
pub struct MemberSecretKey {
    inner: BlstSecretKey,
}

impl MemberSecretKey {
    /// Generate a new random secret key
    pub fn generate() -> Result<Self, KeyError> {
        let mut ikm = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut ikm);
        let inner = BlstSecretKey::key_gen(&ikm, &[]).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self { inner })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let inner = BlstSecretKey::from_bytes(bytes).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self { inner })
    }

    pub fn public_key(&self) -> MemberKey {
        MemberKey(self.inner.sk_to_pk().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> MemberSignature {
        MemberSignature {
            inner: self.inner.sign(message, SIGNING_DST, &[]),
        }
    }
}

/// Signature under a member key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSignature {
    inner: BlstSignature,
}

impl MemberSignature {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }
}

/// Secret/public key pair
#[derive(Clone)]
pub struct MemberKeyPair {
    pub secret_key: MemberSecretKey,
    pub public_key: MemberKey,
}

impl MemberKeyPair {
    pub fn generate() -> Result<Self, KeyError> {
        let secret_key = MemberSecretKey::generate()?;
        let public_key = secret_key.public_key();
        Ok(Self { secret_key, public_key })
    }
}

/// Combines the keys collected in a round into one collective key
pub trait KeyCombiner {
    type Output;

    fn combine(&self, keys: &[MemberKey]) -> Result<Self::Output, KeyError>;
}

/// Aggregates member keys by point addition
#[derive(Clone, Copy, Debug, Default)]
pub struct BlsKeyCombiner;

impl KeyCombiner for BlsKeyCombiner {
    type Output = MemberKey;

    fn combine(&self, keys: &[MemberKey]) -> Result<MemberKey, KeyError> {
        if keys.is_empty() {
            return Err(KeyError::Empty);
        }

        let decoded = keys
            .iter()
            .map(|k| k.to_blst())
            .collect::<Result<Vec<_>, _>>()?;
        let refs: Vec<&BlstPublicKey> = decoded.iter().collect();

        // Keys were subgroup-checked when they were accepted.
        let aggregate = AggregatePublicKey::aggregate(&refs, false)
            .map_err(|_| KeyError::AggregationFailed)?
            .to_public_key();
        Ok(MemberKey(aggregate.to_bytes()))
    }
}

/// Verify a signature aggregated from the holders of `keys`
pub fn verify_aggregate(
    message: &[u8],
    signatures: &[MemberSignature],
    keys: &[MemberKey],
) -> Result<bool, KeyError> {
    if signatures.is_empty() {
        return Err(KeyError::Empty);
    }

    let sig_refs: Vec<&BlstSignature> = signatures.iter().map(|s| &s.inner).collect();
    let aggregate_sig = blst::min_pk::AggregateSignature::aggregate(&sig_refs, false)
        .map_err(|_| KeyError::AggregationFailed)?
        .to_signature();
    let aggregate_key = BlsKeyCombiner.combine(keys)?.to_blst()?;

    let result = aggregate_sig.verify(true, message, SIGNING_DST, &[], &aggregate_key, true);
    Ok(result == blst::BLST_ERROR::BLST_SUCCESS)
}

impl serde::Serialize for MemberKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for MemberKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct MemberKeyVisitor;

        impl<'de> Visitor<'de> for MemberKeyVisitor {
            type Value = MemberKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a hex string or byte array holding a BLS public key")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let bytes = hex::decode(v).map_err(de::Error::custom)?;
                MemberKey::from_bytes(&bytes).map_err(de::Error::custom)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                MemberKey::from_bytes(v).map_err(de::Error::custom)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut bytes = Vec::new();
                while let Some(byte) = seq.next_element()? {
                    bytes.push(byte);
                }
                MemberKey::from_bytes(&bytes).map_err(de::Error::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(MemberKeyVisitor)
        } else {
            deserializer.deserialize_bytes(MemberKeyVisitor)
        }
    }
}
