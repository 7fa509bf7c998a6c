//! Proof-of-work sealing.
//!
//! The miner increments a block's nonce until the block hash starts with
//! `d` hex zeros. Expected work is about `16^d` hashes; difficulty 2 is
//! near-instant and serves as a demonstration of the mechanism rather than
//! sybil resistance.
//!
//! [`mine`] is the plain unbounded loop. [`mine_bounded`] adds an attempt
//! budget, a deadline and cooperative cancellation for callers that run
//! under load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::block::Block;
use crate::crypto::BlockHash;
use crate::encoding::hash_with_nonce;
use crate::error::MiningError;

/// How often (in attempts) the clock and cancel flag are polled.
const POLL_INTERVAL: u64 = 1024;

/// Number of leading hex zeros a block hash must carry.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    /// No work required.
    pub const ZERO: Self = Self(0);

    /// A 32-byte hash has 64 hex characters.
    pub const MAX: u8 = 64;

    /// Create a difficulty, capped at [`Difficulty::MAX`].
    pub const fn new(leading_zeros: u8) -> Self {
        if leading_zeros > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(leading_zeros)
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether `hash` satisfies this target.
    pub fn is_met_by(self, hash: &BlockHash) -> bool {
        hash.leading_zero_nibbles() >= u32::from(self.0)
    }

    /// Expected number of hashes to find a qualifying nonce.
    pub fn expected_attempts(self) -> u128 {
        16u128.saturating_pow(u32::from(self.0))
    }
}

impl fmt::Debug for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Difficulty({})", self.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Difficulty {
    fn from(d: u8) -> Self {
        Self::new(d)
    }
}

/// Shared flag for stopping an in-flight search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Stays set.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a proof-of-work search. The default is unbounded.
#[derive(Debug, Clone, Default)]
pub struct MiningLimits {
    /// Maximum nonces to try after the initial one.
    pub max_attempts: Option<u64>,
    /// Wall-clock instant after which the search gives up.
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelFlag>,
}

impl MiningLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Give up `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.deadline.is_none() && self.cancel.is_none()
    }

    fn check(&self, attempts: u64) -> Result<(), MiningError> {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return Err(MiningError::Exhausted { attempts });
            }
        }

        if attempts % POLL_INTERVAL == 0 {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                return Err(MiningError::Cancelled { attempts });
            }
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(MiningError::TimedOut { attempts });
            }
        }

        Ok(())
    }
}

/// Seal a block, searching without limit.
///
/// At difficulty 0 the unsealed hash already qualifies and the block is
/// returned unchanged.
pub fn mine(mut block: Block, difficulty: Difficulty) -> Block {
    let prefix = block.preimage_prefix();
    block.hash = hash_with_nonce(&prefix, block.nonce);

    while !difficulty.is_met_by(&block.hash) {
        block.nonce = block.nonce.wrapping_add(1);
        block.hash = hash_with_nonce(&prefix, block.nonce);
    }

    tracing::debug!(
        index = block.index,
        nonce = block.nonce,
        hash = %block.hash,
        "sealed block"
    );
    block
}

/// Seal a block within the given limits.
pub fn mine_bounded(
    mut block: Block,
    difficulty: Difficulty,
    limits: &MiningLimits,
) -> Result<Block, MiningError> {
    if limits.is_unbounded() {
        return Ok(mine(block, difficulty));
    }

    let prefix = block.preimage_prefix();
    block.hash = hash_with_nonce(&prefix, block.nonce);

    let mut attempts: u64 = 0;
    while !difficulty.is_met_by(&block.hash) {
        if let Err(e) = limits.check(attempts) {
            tracing::warn!(
                index = block.index,
                %difficulty,
                attempts = e.attempts(),
                "mining stopped: {}",
                e
            );
            return Err(e);
        }
        block.nonce = block.nonce.wrapping_add(1);
        block.hash = hash_with_nonce(&prefix, block.nonce);
        attempts += 1;
    }

    tracing::debug!(
        index = block.index,
        nonce = block.nonce,
        attempts,
        hash = %block.hash,
        "sealed block"
    );
    Ok(block)
}
