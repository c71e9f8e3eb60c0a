// In-memory collaborators
//
// Deterministic stand-ins for the ledger: a clock that only moves when told
// to, and a balance map with injectable transfer failures. Both are cheap
// handles over shared state so a test can keep one clone while the
// committee owns the other.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::U256;

use super::{Clock, TransferError, ValueTransfer};
use crate::types::{Amount, Identity};

/// Manually advanced clock
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    sequence: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(initial_secs)),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance time by `secs` and the sequence by one
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
        self.sequence.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_sequence(&self, sequence: u64) {
        self.sequence.fetch_max(sequence, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Identity, Amount>,
    refusing: HashSet<Identity>,
    transfers: Vec<(Identity, Amount)>,
}

/// Balance map that records every committee payout
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, who: &Identity) -> Amount {
        self.lock().balances.get(who).copied().unwrap_or(U256::ZERO)
    }

    /// Make every transfer to `who` fail until `accept` is called
    pub fn refuse(&self, who: Identity) {
        self.lock().refusing.insert(who);
    }

    pub fn accept(&self, who: &Identity) {
        self.lock().refusing.remove(who);
    }

    /// All successful transfers, oldest first
    pub fn transfers(&self) -> Vec<(Identity, Amount)> {
        self.lock().transfers.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // A poisoned lock only means a test thread panicked mid-transfer;
        // the balance map itself is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ValueTransfer for InMemoryLedger {
    fn transfer(&mut self, to: Identity, amount: Amount) -> Result<(), TransferError> {
        let mut state = self.lock();
        if state.refusing.contains(&to) {
            return Err(TransferError::RecipientRefused(to));
        }

        let balance = state.balances.get(&to).copied().unwrap_or(U256::ZERO);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;
        state.balances.insert(to, updated);
        state.transfers.push((to, amount));
        Ok(())
    }
}
