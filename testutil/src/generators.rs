/// Test data generators

use alloy_primitives::{Address, U256};
use proptest::prelude::*;
use rand::Rng;

/// Generate random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

/// Random 20-byte identity
pub fn random_identity() -> Address {
    let bytes: [u8; 20] = rand::thread_rng().gen();
    Address::from(bytes)
}

/// `n` distinct random identities
pub fn random_identities(n: usize) -> Vec<Address> {
    let mut ids = Vec::with_capacity(n);
    while ids.len() < n {
        let id = random_identity();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

pub fn identity_strategy() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}

/// Amounts small enough that sums of a few hundred never overflow
pub fn amount_strategy() -> impl Strategy<Value = U256> {
    (1u64..=u64::MAX >> 8).prop_map(U256::from)
}
