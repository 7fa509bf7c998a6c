//! Chain: an ordered, append-only sequence of sealed blocks.
//!
//! Every chain starts with the fixed genesis block. Appends link to the
//! current tail and are mined at the chain's difficulty. Nothing is ever
//! removed or reordered.
//!
//! Validity is recomputed from scratch on every [`Chain::audit`] call; there
//! is no cached checkpoint, so an audit is O(n) in the chain length.

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockData, CardPayload, PrevLink};
use crate::crypto::IdentityHash;
use crate::error::{ChainFault, MiningError};
use crate::miner::{mine, mine_bounded, Difficulty, MiningLimits};

/// Snapshot of chain health for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    /// Number of blocks, genesis included.
    pub length: usize,
    pub difficulty: Difficulty,
    pub is_valid: bool,
    /// Number of non-genesis blocks.
    pub record_count: usize,
    pub tail: Block,
}

/// The ledger chain.
///
/// Not synchronized: callers sharing a chain across threads must serialize
/// appends themselves.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: Difficulty,
}

impl Chain {
    /// Create a chain holding only the genesis block.
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            blocks: vec![Block::genesis()],
            difficulty,
        }
    }

    /// Rebuild a chain from blocks held elsewhere.
    ///
    /// The blocks are not trusted: call [`Chain::audit`] to find out whether
    /// they are intact. An empty sequence yields a fresh chain.
    pub fn restore(blocks: Vec<Block>, difficulty: Difficulty) -> Self {
        if blocks.is_empty() {
            return Self::new(difficulty);
        }
        Self { blocks, difficulty }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: genesis is always present.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of appended records (excludes genesis).
    pub fn record_count(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// The most recently appended block (genesis on a fresh chain).
    pub fn tail(&self) -> &Block {
        // Both constructors guarantee at least the genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    fn next_block(&self, data: BlockData, timestamp: i64) -> Block {
        let tail = self.tail();
        Block::new(
            tail.index + 1,
            timestamp,
            data,
            PrevLink::Block(tail.hash),
        )
    }

    fn push(&mut self, block: Block) -> &Block {
        tracing::debug!(index = block.index, hash = %block.hash, "appended block");
        self.blocks.push(block);
        self.tail()
    }

    /// Append a payload stamped with the current time.
    pub fn append(&mut self, data: BlockData) -> &Block {
        self.append_at(data, now_millis())
    }

    /// Append a payload with an explicit timestamp.
    ///
    /// There is no rollback: once this returns, the block is permanent.
    pub fn append_at(&mut self, data: BlockData, timestamp: i64) -> &Block {
        let block = mine(self.next_block(data, timestamp), self.difficulty);
        self.push(block)
    }

    /// Append within mining limits. On error the chain is unchanged.
    pub fn append_bounded(
        &mut self,
        data: BlockData,
        timestamp: i64,
        limits: &MiningLimits,
    ) -> Result<&Block, MiningError> {
        let block = mine_bounded(self.next_block(data, timestamp), self.difficulty, limits)?;
        Ok(self.push(block))
    }

    /// Recheck the whole chain and report the first fault.
    ///
    /// Genesis must equal the well-known genesis block. Every later block
    /// must sit at its own index, carry a hash that matches its contents and
    /// meets the difficulty, and link to its predecessor's stored hash.
    pub fn audit(&self) -> Result<(), ChainFault> {
        match self.blocks.first() {
            Some(genesis) if *genesis == Block::genesis() => {}
            _ => return Err(ChainFault::GenesisMismatch),
        }

        for (position, pair) in self.blocks.windows(2).enumerate() {
            let (prev, block) = (&pair[0], &pair[1]);
            let index = position as u64 + 1;

            if block.index != index {
                return Err(ChainFault::IndexMismatch {
                    index,
                    found: block.index,
                });
            }
            if !block.is_self_consistent() {
                return Err(ChainFault::HashMismatch { index });
            }
            if block.previous_hash != PrevLink::Block(prev.hash) {
                return Err(ChainFault::BrokenLink { index });
            }
            if !block.meets_difficulty(self.difficulty) {
                return Err(ChainFault::InsufficientWork {
                    index,
                    difficulty: self.difficulty,
                });
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.audit().is_ok()
    }

    /// Find the most recent card whose payload satisfies `matcher`.
    ///
    /// Scans from the tail backward, so when several cards share a natural
    /// key the latest registration wins.
    pub fn find_latest<F>(&self, matcher: F) -> Option<&Block>
    where
        F: Fn(&CardPayload) -> bool,
    {
        self.blocks
            .iter()
            .rev()
            .find(|block| block.card().is_some_and(&matcher))
    }

    /// Find the most recent card carrying `identity`.
    pub fn find_by_identity(&self, identity: &IdentityHash) -> Option<&Block> {
        self.find_latest(|card| card.identity_hash == *identity)
    }

    /// Current statistics. Runs a full audit.
    pub fn stats(&self) -> ChainStats {
        ChainStats {
            length: self.len(),
            difficulty: self.difficulty,
            is_valid: self.is_valid(),
            record_count: self.record_count(),
            tail: self.tail().clone(),
        }
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::BlockHash;

    fn card(seed: u8, name: &str, country: &str) -> BlockData {
        BlockData::TouristCard(CardPayload {
            identity_hash: IdentityHash::from_bytes([seed; 32]),
            name: name.to_string(),
            tourist_type: "international".to_string(),
            country: country.to_string(),
            issued_at: 1_736_870_400_000 + i64::from(seed),
            supersedes: None,
        })
    }

    fn chain_with(n: u8) -> Chain {
        let mut chain = Chain::new(Difficulty::new(2));
        for i in 1..=n {
            chain.append_at(card(i, "Tourist", "IN"), 1_736_870_400_000 + i64::from(i));
        }
        chain
    }

    #[test]
    fn test_fresh_chain_is_genesis_only() {
        let chain = Chain::new(Difficulty::new(2));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.record_count(), 0);
        assert_eq!(chain.tail(), &Block::genesis());
        assert!(chain.is_valid());
    }

    #[test]
    fn test_append_links_and_seals() {
        let chain = chain_with(4);
        assert_eq!(chain.len(), 5);

        for pair in chain.blocks().windows(2) {
            assert_eq!(pair[1].previous_hash, PrevLink::Block(pair[0].hash));
            assert_eq!(pair[1].index, pair[0].index + 1);
            assert!(pair[1].is_self_consistent());
            assert!(pair[1].hash.to_hex().starts_with("00"));
        }
        assert!(chain.is_valid());
    }

    #[test]
    fn test_append_returns_tail() {
        let mut chain = chain_with(1);
        let appended = chain.append(card(9, "Nina", "DE")).clone();
        assert_eq!(&appended, chain.tail());
        assert_eq!(appended.index, 2);
    }

    #[test]
    fn test_tampered_data_detected() {
        let mut chain = chain_with(4);
        if let BlockData::TouristCard(card) = &mut chain.blocks[3].data {
            card.country = "IM".to_string();
        }
        assert_eq!(chain.audit(), Err(ChainFault::HashMismatch { index: 3 }));
        assert!(!chain.is_valid());
    }

    #[test]
    fn test_every_field_mutation_detected() {
        let mutations: Vec<(&str, Box<dyn Fn(&mut Block)>)> = vec![
            ("index", Box::new(|b: &mut Block| b.index += 10)),
            ("timestamp", Box::new(|b: &mut Block| b.timestamp -= 1)),
            ("nonce", Box::new(|b: &mut Block| b.nonce = b.nonce.wrapping_add(1))),
            (
                "previous_hash",
                Box::new(|b: &mut Block| b.previous_hash = PrevLink::Block(BlockHash::from_bytes([0xee; 32]))),
            ),
            ("hash", Box::new(|b: &mut Block| b.hash = BlockHash::from_bytes([0x00; 32]))),
            ("data", Box::new(|b: &mut Block| b.data = card(0xfe, "Mallory", "ZZ"))),
        ];

        for (field, mutate) in &mutations {
            for target in 1..=3usize {
                let mut chain = chain_with(3);
                mutate(&mut chain.blocks[target]);
                assert!(
                    !chain.is_valid(),
                    "mutating {} of block {} went unnoticed",
                    field,
                    target
                );
            }
        }
    }

    #[test]
    fn test_resealed_block_breaks_next_link() {
        let mut chain = chain_with(3);
        // Rewrite block 2 and redo its proof of work; block 3 still points
        // at the old hash.
        let forged = Block::new(
            2,
            chain.blocks[2].timestamp,
            card(0x42, "Forged", "XX"),
            chain.blocks[2].previous_hash,
        );
        chain.blocks[2] = mine(forged, chain.difficulty());

        assert_eq!(chain.audit(), Err(ChainFault::BrokenLink { index: 3 }));
    }

    #[test]
    fn test_genesis_tamper_detected() {
        let mut chain = chain_with(1);
        chain.blocks[0].data = BlockData::Genesis {
            message: "rewritten".into(),
        };
        assert_eq!(chain.audit(), Err(ChainFault::GenesisMismatch));
    }

    #[test]
    fn test_unmined_block_lacks_work() {
        let mut chain = chain_with(1);
        let tail = chain.tail().clone();
        let mut lazy = Block::new(2, 0, card(5, "Lazy", "FR"), PrevLink::Block(tail.hash));
        // Find a nonce whose hash does NOT meet the target.
        while lazy.meets_difficulty(chain.difficulty()) {
            lazy.nonce += 1;
            lazy.hash = lazy.compute_hash();
        }
        chain.blocks.push(lazy);

        assert_eq!(
            chain.audit(),
            Err(ChainFault::InsufficientWork {
                index: 2,
                difficulty: Difficulty::new(2)
            })
        );
    }

    #[test]
    fn test_find_latest_prefers_most_recent() {
        let mut chain = Chain::new(Difficulty::new(1));
        chain.append_at(card(1, "Asha Rao", "IN"), 10);
        chain.append_at(card(2, "Someone Else", "FR"), 20);
        chain.append_at(card(3, "Asha Rao", "IN"), 30);

        let found = chain.find_latest(|c| c.name == "Asha Rao").unwrap();
        assert_eq!(found.index, 3);
        assert_eq!(
            found.card().unwrap().identity_hash,
            IdentityHash::from_bytes([3; 32])
        );
    }

    #[test]
    fn test_find_by_identity() {
        let chain = chain_with(3);
        let target = IdentityHash::from_bytes([2; 32]);
        assert_eq!(chain.find_by_identity(&target).unwrap().index, 2);
        assert!(chain
            .find_by_identity(&IdentityHash::from_bytes([0x99; 32]))
            .is_none());
    }

    #[test]
    fn test_bounded_append_failure_leaves_chain_unchanged() {
        let mut chain = Chain::new(Difficulty::new(16));
        let cancel = crate::miner::CancelFlag::new();
        cancel.cancel();

        let result = chain.append_bounded(
            card(1, "Asha Rao", "IN"),
            0,
            &MiningLimits::unbounded().with_cancel(cancel),
        );
        assert!(matches!(result, Err(MiningError::Cancelled { .. })));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_stats() {
        let chain = chain_with(5);
        let stats = chain.stats();
        assert_eq!(stats.length, 6);
        assert_eq!(stats.record_count, 5);
        assert!(stats.is_valid);
        assert_eq!(stats.difficulty, Difficulty::new(2));
        assert_eq!(&stats.tail, chain.tail());
    }

    #[test]
    fn test_restore_roundtrip() {
        let chain = chain_with(3);
        let restored = Chain::restore(chain.blocks().to_vec(), chain.difficulty());
        assert!(restored.is_valid());
        assert_eq!(restored.len(), 4);

        let empty = Chain::restore(Vec::new(), Difficulty::new(2));
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn test_difficulty_zero_chain() {
        let mut chain = Chain::new(Difficulty::ZERO);
        let block = chain.append_at(card(1, "Zero", "NZ"), 1).clone();
        assert_eq!(block.nonce, 0);
        assert!(chain.is_valid());
    }
}
