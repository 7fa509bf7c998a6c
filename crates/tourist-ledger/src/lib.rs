//! # Tourist Ledger
//!
//! Tamper-evident issuance and verification of Smart Tourist Cards.
//!
//! ## Overview
//!
//! A tourist record is normalized and hashed into an identity hash, the
//! public reference printed on the card. Each card is sealed into a
//! proof-of-work block and appended to a hash-linked chain. Verification
//! re-audits the whole chain before trusting any card on it.
//!
//! - **Mint**: issue a new card. Never idempotent; every mint draws a fresh nonce.
//! - **Reissue**: issue an updated card with a preserved nonce.
//! - **Verify**: `Verified`, `NotFound` or `Tampered`.
//! - **Stats**: chain length, card count and validity for dashboards.
//!
//! This is a single-writer ledger. There are no peers, no consensus and
//! no persistence.
//!
//! ## Usage
//!
//! ```rust
//! use tourist_ledger::{Ledger, LedgerConfig, RawRecord};
//!
//! let mut ledger = Ledger::new(LedgerConfig::default()).unwrap();
//!
//! let record = RawRecord::new()
//!     .with_name("Asha Rao")
//!     .with_country("IN")
//!     .with_passport_number("X1234");
//! let receipt = ledger.mint(&record).unwrap();
//!
//! let result = ledger.verify(&receipt.identity_hash.to_hex());
//! assert!(result.is_trusted());
//! ```
//!
//! ## Re-exports
//!
//! - `tourist_ledger::core` - Core primitives (Block, Chain, canonicalization, mining)

pub mod config;
pub mod error;
pub mod ledger;
pub mod shared;

pub use tourist_ledger_core as core;

pub use config::{LedgerConfig, MAX_DIFFICULTY};
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, MintReceipt};
pub use shared::SharedLedger;

// Re-export commonly used core types
pub use tourist_ledger_core::{
    Block, BlockData, CardPayload, ChainFault, ChainStats, Difficulty, IdentityField,
    IdentityHash, RawRecord, RecordNonce, VerificationResult,
};
