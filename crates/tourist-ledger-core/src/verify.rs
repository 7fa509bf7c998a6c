//! Credential verification against the chain.
//!
//! Verification checks global chain validity, not just the matched block:
//! a corrupted block anywhere invalidates every link after it, so a local
//! check would under-report tampering. The audit runs before the lookup,
//! which means a damaged chain reports [`VerificationResult::Tampered`] for
//! every key, including keys whose own block was rewritten beyond
//! recognition.

use serde::Serialize;

use crate::block::Block;
use crate::chain::Chain;
use crate::crypto::IdentityHash;
use crate::error::ChainFault;

/// Outcome of verifying a tourist identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    /// No card carries this identity.
    NotFound,
    /// The chain failed its audit; nothing on it can be trusted.
    Tampered { fault: ChainFault },
    /// A card was found and the whole chain is intact.
    Verified {
        block: Block,
        index: u64,
        timestamp: i64,
    },
}

impl VerificationResult {
    /// Only a verified card may back a trusted action.
    pub fn is_trusted(&self) -> bool {
        matches!(self, VerificationResult::Verified { .. })
    }

    pub fn is_tampered(&self) -> bool {
        matches!(self, VerificationResult::Tampered { .. })
    }

    /// The verified block, if any.
    pub fn block(&self) -> Option<&Block> {
        match self {
            VerificationResult::Verified { block, .. } => Some(block),
            _ => None,
        }
    }
}

/// Verify an identity against the chain.
pub fn verify(chain: &Chain, identity: &IdentityHash) -> VerificationResult {
    if let Err(fault) = chain.audit() {
        return VerificationResult::Tampered { fault };
    }

    match chain.find_by_identity(identity) {
        Some(block) => VerificationResult::Verified {
            block: block.clone(),
            index: block.index,
            timestamp: block.timestamp,
        },
        None => VerificationResult::NotFound,
    }
}

/// Verify a textual identity key.
///
/// A key that is not a well-formed identity hash cannot match any card.
pub fn verify_key(chain: &Chain, key: &str) -> VerificationResult {
    match IdentityHash::from_hex(key.trim()) {
        Ok(identity) => verify(chain, &identity),
        Err(_) => match chain.audit() {
            Err(fault) => VerificationResult::Tampered { fault },
            Ok(()) => VerificationResult::NotFound,
        },
    }
}
