//! Error types for the ledger facade.

use thiserror::Error;
use tourist_ledger_core::{ChainFault, CoreError, IdentityField, MiningError};

/// Errors that can occur during ledger operations.
///
/// A verification miss is not an error; it is reported as
/// [`VerificationResult::NotFound`](tourist_ledger_core::VerificationResult::NotFound).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The record lacks mandatory identity fields. Not retryable without
    /// changing the input.
    #[error("invalid record: missing {}", join_fields(.missing))]
    InvalidRecord { missing: Vec<IdentityField> },

    /// The chain failed its audit. Never repaired automatically.
    #[error("ledger integrity compromised: {0}")]
    ChainTampered(ChainFault),

    /// Bounded mining ran out of attempts or time.
    #[error("mining exhausted after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    /// Mining was cancelled through the ledger's cancel flag.
    #[error("mining cancelled")]
    MiningCancelled,

    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Core error (malformed keys, nonces).
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A blocking worker panicked or was aborted.
    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<MiningError> for LedgerError {
    fn from(e: MiningError) -> Self {
        match e {
            MiningError::Exhausted { attempts } | MiningError::TimedOut { attempts } => {
                LedgerError::MiningExhausted { attempts }
            }
            MiningError::Cancelled { .. } => LedgerError::MiningCancelled,
        }
    }
}

fn join_fields(fields: &[IdentityField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_record_message() {
        let e = LedgerError::InvalidRecord {
            missing: vec![IdentityField::Name, IdentityField::IdNumber],
        };
        assert_eq!(e.to_string(), "invalid record: missing name, id_number");
    }

    #[test]
    fn test_mining_error_mapping() {
        assert!(matches!(
            LedgerError::from(MiningError::TimedOut { attempts: 9 }),
            LedgerError::MiningExhausted { attempts: 9 }
        ));
        assert!(matches!(
            LedgerError::from(MiningError::Cancelled { attempts: 0 }),
            LedgerError::MiningCancelled
        ));
    }
}
