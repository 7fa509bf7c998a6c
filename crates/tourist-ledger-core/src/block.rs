//! Block: one sealed ledger entry.
//!
//! A block wraps a typed payload with its position, creation time, a link
//! to its predecessor, and a proof-of-work seal. Once appended to a
//! [`Chain`](crate::chain::Chain) it is never legitimately modified; the
//! fields are public so that damaged copies can be inspected and audited.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::{BlockHash, IdentityHash};
use crate::encoding::{block_preimage_prefix, hash_with_nonce};
use crate::miner::Difficulty;

/// Creation time of the genesis block (2024-01-01T00:00:00Z, Unix ms).
pub const GENESIS_TIMESTAMP: i64 = 1_704_067_200_000;

/// Well-known payload of the genesis block.
pub const GENESIS_MESSAGE: &str = "Smart Tourist Card ledger genesis";

/// Card data sealed into a block when a tourist is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPayload {
    /// Digest of the canonical record; the card's public reference.
    pub identity_hash: IdentityHash,
    pub name: String,
    pub tourist_type: String,
    pub country: String,
    /// Issue time (Unix ms).
    pub issued_at: i64,
    /// Identity this card replaces after a profile update.
    pub supersedes: Option<IdentityHash>,
}

/// What a block carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockData {
    /// The fixed first entry of every chain.
    Genesis { message: String },
    /// A minted tourist card.
    TouristCard(CardPayload),
}

impl BlockData {
    /// The card payload, if this is a card block.
    pub fn card(&self) -> Option<&CardPayload> {
        match self {
            BlockData::TouristCard(card) => Some(card),
            BlockData::Genesis { .. } => None,
        }
    }
}

/// Backward reference from a block to its predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrevLink {
    /// Genesis has no predecessor; rendered as `"0"`.
    Genesis,
    /// Hash of the preceding block.
    Block(BlockHash),
}

impl PrevLink {
    /// Text used for the genesis link.
    pub const GENESIS_TEXT: &'static str = "0";

    /// Parse the textual form (`"0"` or a 64-char hex hash).
    pub fn parse(s: &str) -> Result<Self, crate::error::CoreError> {
        if s == Self::GENESIS_TEXT {
            Ok(PrevLink::Genesis)
        } else {
            BlockHash::from_hex(s).map(PrevLink::Block)
        }
    }
}

impl fmt::Display for PrevLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrevLink::Genesis => f.write_str(Self::GENESIS_TEXT),
            PrevLink::Block(hash) => write!(f, "{}", hash),
        }
    }
}

impl fmt::Debug for PrevLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrevLink::Genesis => f.write_str("PrevLink(0)"),
            PrevLink::Block(hash) => write!(f, "PrevLink({:?})", hash),
        }
    }
}

impl Serialize for PrevLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrevLink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A ledger entry.
///
/// Invariant after sealing: `hash == compute_hash()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub index: u64,
    /// Creation time (Unix ms).
    pub timestamp: i64,
    pub data: BlockData,
    pub previous_hash: PrevLink,
    pub hash: BlockHash,
    /// Proof-of-work counter.
    pub nonce: u64,
}

impl Block {
    /// Build an unsealed block: nonce 0, hash computed for that nonce.
    pub fn new(index: u64, timestamp: i64, data: BlockData, previous_hash: PrevLink) -> Self {
        let mut block = Self {
            index,
            timestamp,
            data,
            previous_hash,
            hash: BlockHash::ZERO,
            nonce: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    /// The fixed genesis block shared by every chain.
    pub fn genesis() -> Self {
        Self::new(
            0,
            GENESIS_TIMESTAMP,
            BlockData::Genesis {
                message: GENESIS_MESSAGE.to_string(),
            },
            PrevLink::Genesis,
        )
    }

    /// Canonical bytes of every hashed field except the nonce.
    pub fn preimage_prefix(&self) -> Vec<u8> {
        block_preimage_prefix(self.index, &self.previous_hash, self.timestamp, &self.data)
    }

    /// Recompute the hash from the stored fields.
    pub fn compute_hash(&self) -> BlockHash {
        hash_with_nonce(&self.preimage_prefix(), self.nonce)
    }

    /// Whether the stored hash matches the stored fields.
    pub fn is_self_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Whether the stored hash satisfies a proof-of-work target.
    pub fn meets_difficulty(&self, difficulty: Difficulty) -> bool {
        difficulty.is_met_by(&self.hash)
    }

    /// The card payload, if any.
    pub fn card(&self) -> Option<&CardPayload> {
        self.data.card()
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self.previous_hash, PrevLink::Genesis)
    }
}
