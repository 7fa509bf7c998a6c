//! Error types for the tourist ledger core.

use serde::Serialize;
use thiserror::Error;

use crate::miner::Difficulty;

/// Core errors raised while parsing digests and nonces.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// Reasons a bounded proof-of-work search gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    #[error("no qualifying nonce within {attempts} attempts")]
    Exhausted { attempts: u64 },

    #[error("deadline passed after {attempts} attempts")]
    TimedOut { attempts: u64 },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
}

impl MiningError {
    /// Number of nonces tried before the search stopped.
    pub fn attempts(&self) -> u64 {
        match self {
            MiningError::Exhausted { attempts }
            | MiningError::TimedOut { attempts }
            | MiningError::Cancelled { attempts } => *attempts,
        }
    }
}

/// The first structural fault found while auditing a chain.
///
/// Any fault means the ledger can no longer be trusted; it is reported,
/// never repaired.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum ChainFault {
    #[error("genesis block does not match the well-known genesis")]
    GenesisMismatch,

    #[error("block at position {index} claims index {found}")]
    IndexMismatch { index: u64, found: u64 },

    #[error("stored hash of block {index} does not match its contents")]
    HashMismatch { index: u64 },

    #[error("block {index} does not link to the hash of its predecessor")]
    BrokenLink { index: u64 },

    #[error("block {index} hash does not meet difficulty {difficulty}")]
    InsufficientWork { index: u64, difficulty: Difficulty },
}

impl ChainFault {
    /// Position in the chain where the fault was detected.
    pub fn index(&self) -> u64 {
        match self {
            ChainFault::GenesisMismatch => 0,
            ChainFault::IndexMismatch { index, .. }
            | ChainFault::HashMismatch { index }
            | ChainFault::BrokenLink { index }
            | ChainFault::InsufficientWork { index, .. } => *index,
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
