// Committee configuration
//
// Owner-settable parameters. Changes apply to rounds opened and
// registrations made after the change.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::types::{AdmissionMode, Amount};

/// 0.01 of a 18-decimal unit
pub const DEFAULT_MIN_DEPOSIT_WEI: u64 = 10_000_000_000_000_000;
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_VALIDATORS: usize = 21;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Round timeout must be at least one second")]
    ZeroTimeout,
    #[error("max_validators must be at least 1")]
    ZeroValidators,
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Committee configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitteeConfig {
    /// How long a round accepts key submissions
    pub round_timeout: Duration,

    /// Minimum deposit for a join proposal
    pub min_deposit: Amount,

    /// Validator set size in election mode
    pub max_validators: usize,

    /// Quorum voting or stake-weighted election
    pub admission: AdmissionMode,
}

impl Default for CommitteeConfig {
    fn default() -> Self {
        Self {
            round_timeout: DEFAULT_ROUND_TIMEOUT,
            min_deposit: Amount::from(DEFAULT_MIN_DEPOSIT_WEI),
            max_validators: DEFAULT_MAX_VALIDATORS,
            admission: AdmissionMode::Quorum,
        }
    }
}

impl CommitteeConfig {
    /// Election-mode config with the given validator cap
    pub fn election(max_validators: usize) -> Self {
        Self {
            max_validators,
            admission: AdmissionMode::Election,
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Rounds are timed in whole seconds
        if self.round_timeout.as_secs() == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_validators == 0 {
            return Err(ConfigError::ZeroValidators);
        }
        Ok(())
    }
}
