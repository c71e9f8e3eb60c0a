// Delegation book
//
// Per validator, the list of (delegator, amount) entries. Entry order is not
// meaningful; zeroed entries are swap-removed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CommitteeError, Result};
use crate::types::{Amount, Identity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: Identity,
    pub amount: Amount,
}

#[derive(Debug, Default)]
pub struct DelegationBook {
    by_validator: HashMap<Identity, Vec<Delegation>>,
}

impl DelegationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delegations_to(&self, validator: &Identity) -> &[Delegation] {
        self.by_validator.get(validator).map_or(&[], Vec::as_slice)
    }

    pub fn delegated_by(&self, delegator: &Identity, validator: &Identity) -> Option<Amount> {
        self.delegations_to(validator)
            .iter()
            .find(|d| d.delegator == *delegator)
            .map(|d| d.amount)
    }

    /// Sum of all delegations to `validator`
    pub fn total(&self, validator: &Identity) -> Result<Amount> {
        self.delegations_to(validator)
            .iter()
            .try_fold(Amount::ZERO, |acc, d| acc.checked_add(d.amount))
            .ok_or(CommitteeError::Overflow)
    }

    /// Amount the entry would hold after adding; does not modify the book
    pub fn check_add(&self, delegator: &Identity, validator: &Identity, amount: Amount) -> Result<Amount> {
        self.delegated_by(delegator, validator)
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or(CommitteeError::Overflow)
    }

    /// Find or create the entry for `delegator` and add `amount`
    pub fn add(&mut self, delegator: Identity, validator: Identity, amount: Amount) -> Result<Amount> {
        let updated = self.check_add(&delegator, &validator, amount)?;
        let entries = self.by_validator.entry(validator).or_default();
        match entries.iter_mut().find(|d| d.delegator == delegator) {
            Some(entry) => entry.amount = updated,
            None => entries.push(Delegation {
                delegator,
                amount: updated,
            }),
        }
        Ok(updated)
    }

    /// Validate a revocation without applying it
    pub fn check_remove(&self, delegator: &Identity, validator: &Identity, amount: Amount) -> Result<()> {
        let delegated = self
            .delegated_by(delegator, validator)
            .ok_or(CommitteeError::NoDelegationRecord {
                delegator: *delegator,
                validator: *validator,
            })?;
        if amount > delegated {
            return Err(CommitteeError::ExceedsDelegated {
                requested: amount,
                delegated,
            });
        }
        Ok(())
    }

    /// Subtract `amount`, dropping the entry once it reaches zero.
    /// Returns what remains delegated.
    pub fn remove_amount(&mut self, delegator: &Identity, validator: &Identity, amount: Amount) -> Result<Amount> {
        self.check_remove(delegator, validator, amount)?;
        let entries = self
            .by_validator
            .get_mut(validator)
            .ok_or(CommitteeError::NoDelegationRecord {
                delegator: *delegator,
                validator: *validator,
            })?;
        let position = entries
            .iter()
            .position(|d| d.delegator == *delegator)
            .ok_or(CommitteeError::NoDelegationRecord {
                delegator: *delegator,
                validator: *validator,
            })?;

        let remaining = entries[position].amount - amount;
        if remaining.is_zero() {
            entries.swap_remove(position);
        } else {
            entries[position].amount = remaining;
        }
        if entries.is_empty() {
            self.by_validator.remove(validator);
        }
        Ok(remaining)
    }
}
