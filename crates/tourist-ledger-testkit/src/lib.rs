//! # Tourist Ledger Testkit
//!
//! Testing utilities for the tourist ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed records and nonces with their expected preimages and identities,
//!   plus the pinned genesis block
//! - **Generators**: Proptest strategies for raw records, including hostile input
//! - **Fixtures**: Sample tourists and pre-populated ledgers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use tourist_ledger_testkit::vectors::{verify_all_vectors, verify_genesis};
//!
//! for (name, matches, identity) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, identity);
//! }
//! assert!(verify_genesis());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use tourist_ledger_testkit::generators::raw_record;
//!
//! proptest! {
//!     #[test]
//!     fn supplied_nonce_is_idempotent(raw in raw_record(), nonce in record_nonce()) {
//!         let (_, a) = canonicalize(&raw, Some(&nonce));
//!         let (_, b) = canonicalize(&raw, Some(&nonce));
//!         prop_assert_eq!(a, b);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use tourist_ledger_testkit::fixtures::LedgerFixture;
//!
//! let fixture = LedgerFixture::with_records(3);
//! assert_eq!(fixture.ledger.stats().record_count, 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{asha_rao, random_tourist, sample_tourists, tamper_block, LedgerFixture};
pub use generators::{raw_record, record_nonce};
pub use vectors::{
    all_vectors, vectors_json, verify_all_vectors, verify_genesis, CanonicalVector, GENESIS_HASH,
};
