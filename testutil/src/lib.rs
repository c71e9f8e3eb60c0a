/// Testing utilities for the committee
///
/// Provides:
/// - Random identities and amounts
/// - proptest strategies
/// - Amount fixtures in ledger units

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
