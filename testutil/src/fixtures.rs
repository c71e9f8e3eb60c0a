/// Fixed identities and amounts

use alloy_primitives::{Address, U256};

pub const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// `n` ether in wei
pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(WEI_PER_ETHER)
}

/// `n` hundredths of an ether; `centi_ether(1)` is the default minimum deposit
pub fn centi_ether(n: u64) -> U256 {
    U256::from(n) * U256::from(WEI_PER_ETHER / 100)
}

/// Deterministic identities `0x0101..`, `0x0202..`, ...
pub fn identities(n: u8) -> Vec<Address> {
    (1..=n).map(Address::repeat_byte).collect()
}

pub fn owner() -> Address {
    Address::repeat_byte(0xaa)
}
