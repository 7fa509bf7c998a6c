//! # Tourist Ledger Core
//!
//! Pure primitives for the tamper-evident tourist record ledger: identity
//! hashing, sealed blocks, proof-of-work, and chain audit.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over hash-linked data.
//!
//! ## Key Types
//!
//! - [`RawRecord`] / [`CanonicalRecord`] - a tourist record before and after normalization
//! - [`IdentityHash`] - the public, non-reversible reference to a tourist
//! - [`Block`] - one sealed entry carrying a [`BlockData`] payload
//! - [`Chain`] - the append-only sequence anchored at genesis
//! - [`VerificationResult`] - outcome of checking a credential
//!
//! ## Flow
//!
//! ```text
//! RawRecord --canonicalize--> (CanonicalRecord, IdentityHash)
//!           --CardPayload--> Block::new --mine--> Chain::append
//!                                                 Chain::audit <-- verify
//! ```
//!
//! ## Canonicalization
//!
//! Block hashes cover a deterministic CBOR encoding of the block fields.
//! See [`encoding`].

pub mod block;
pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod miner;
pub mod verify;

pub use block::{Block, BlockData, CardPayload, PrevLink, GENESIS_MESSAGE, GENESIS_TIMESTAMP};
pub use canonical::{canonicalize, CanonicalRecord, IdentityField, RawRecord, RecordNonce};
pub use chain::{Chain, ChainStats};
pub use crypto::{Blake3Hash, BlockHash, IdentityHash};
pub use error::{ChainFault, CoreError, MiningError, Result};
pub use miner::{mine, mine_bounded, CancelFlag, Difficulty, MiningLimits};
pub use verify::{verify, verify_key, VerificationResult};
