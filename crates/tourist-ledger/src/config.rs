//! Ledger configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tourist_ledger_core::Difficulty;

use crate::error::{LedgerError, Result};

/// Highest difficulty accepted by [`LedgerConfig::validate`].
///
/// Each extra nibble multiplies the expected mining work by 16; past this
/// point a single mint takes minutes on commodity hardware.
pub const MAX_DIFFICULTY: u8 = 8;

/// Configuration for a [`Ledger`](crate::Ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading zero hex digits every block hash must carry.
    pub difficulty: Difficulty,
    /// Nonce budget per mint. `None` searches until sealed.
    pub max_mining_attempts: Option<u64>,
    /// Wall-clock budget per mint.
    pub mining_timeout: Option<Duration>,
    /// Reject records whose name normalizes to empty.
    pub require_name: bool,
    /// Reject records with neither passport nor national id number.
    pub require_id_number: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::new(2),
            max_mining_attempts: None,
            mining_timeout: None,
            require_name: true,
            require_id_number: true,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Difficulty::new(difficulty);
        self
    }

    pub fn with_max_mining_attempts(mut self, attempts: u64) -> Self {
        self.max_mining_attempts = Some(attempts);
        self
    }

    pub fn with_mining_timeout(mut self, timeout: Duration) -> Self {
        self.mining_timeout = Some(timeout);
        self
    }

    /// Check the configuration for operational mistakes.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty.get() > MAX_DIFFICULTY {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty {} exceeds maximum {}",
                self.difficulty, MAX_DIFFICULTY
            )));
        }
        if self.mining_timeout == Some(Duration::ZERO) {
            return Err(LedgerError::InvalidConfig(
                "mining timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty.get(), 2);
        assert!(config.max_mining_attempts.is_none());
        assert!(config.require_name && config.require_id_number);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_excessive_difficulty() {
        let err = LedgerConfig::default().with_difficulty(9).validate().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfig(_)));
        LedgerConfig::default().with_difficulty(8).validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = LedgerConfig::default().with_mining_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"difficulty": 3, "require_name": false}"#).unwrap();
        assert_eq!(config.difficulty.get(), 3);
        assert!(!config.require_name);
        assert!(config.require_id_number);
        assert_eq!(config.mining_timeout, None);
    }
}
