//! The Ledger: mint, verify and report on tourist cards.
//!
//! A `Ledger` owns exactly one [`Chain`]. It is the only writer of that
//! chain; wrap it in a [`SharedLedger`](crate::SharedLedger) to share it
//! between tasks.

use serde::Serialize;
use tourist_ledger_core::{
    canonicalize, Block, BlockData, CancelFlag, CanonicalRecord, CardPayload, Chain, ChainStats,
    IdentityField, IdentityHash, MiningLimits, RawRecord, RecordNonce, VerificationResult,
};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};

/// What a successful mint hands back to the caller.
///
/// The nonce is not recorded on the chain. Callers that want to reissue
/// the card later must keep it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintReceipt {
    pub identity_hash: IdentityHash,
    pub nonce: RecordNonce,
    pub block: Block,
}

/// The main Ledger struct.
pub struct Ledger {
    chain: Chain,
    config: LedgerConfig,
    /// Shared with every mining run; cancelling is permanent.
    cancel: CancelFlag,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        let chain = Chain::new(config.difficulty);
        Ok(Self::assemble(chain, config))
    }

    /// Wrap an existing chain.
    ///
    /// The chain is not audited here; a damaged chain surfaces on the next
    /// verification.
    pub fn from_chain(chain: Chain, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        if chain.difficulty() != config.difficulty {
            return Err(LedgerError::InvalidConfig(format!(
                "chain difficulty {} does not match configured {}",
                chain.difficulty(),
                config.difficulty
            )));
        }
        Ok(Self::assemble(chain, config))
    }

    fn assemble(chain: Chain, config: LedgerConfig) -> Self {
        tracing::info!(
            difficulty = %config.difficulty,
            length = chain.len(),
            "ledger opened"
        );
        Self {
            chain,
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Handle for aborting mining from another thread.
    ///
    /// Once cancelled, the in-flight mint and every later one fail with
    /// [`LedgerError::MiningCancelled`]. Meant for shutdown.
    pub fn cancel_handle(&self) -> CancelFlag {
        self.cancel.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Minting
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a new card for `raw`.
    ///
    /// A fresh nonce is drawn every time, so minting the same record twice
    /// yields two cards with different identity hashes.
    pub fn mint(&mut self, raw: &RawRecord) -> Result<MintReceipt> {
        let (record, identity_hash) = canonicalize(raw, None);
        self.append_card(record, identity_hash, None)
    }

    /// Issue an updated card for a tourist who already holds one.
    ///
    /// Reusing the stored nonce makes the new identity hash a pure function
    /// of the updated record. The new card names `previous` as the card it
    /// supersedes.
    pub fn reissue(
        &mut self,
        raw: &RawRecord,
        nonce: &RecordNonce,
        previous: Option<IdentityHash>,
    ) -> Result<MintReceipt> {
        let (record, identity_hash) = canonicalize(raw, Some(nonce));
        self.append_card(record, identity_hash, previous)
    }

    fn append_card(
        &mut self,
        record: CanonicalRecord,
        identity_hash: IdentityHash,
        supersedes: Option<IdentityHash>,
    ) -> Result<MintReceipt> {
        let missing = self.missing_fields(&record);
        if !missing.is_empty() {
            tracing::warn!(?missing, "rejected tourist record");
            return Err(LedgerError::InvalidRecord { missing });
        }

        let issued_at = now_millis();
        let data = BlockData::TouristCard(CardPayload {
            identity_hash,
            name: record.name,
            tourist_type: record.tourist_type,
            country: record.country,
            issued_at,
            supersedes,
        });

        let limits = self.mining_limits();
        let block = self.chain.append_bounded(data, issued_at, &limits)?.clone();

        tracing::info!(
            index = block.index,
            identity = %identity_hash,
            superseded = supersedes.is_some(),
            "minted tourist card"
        );

        Ok(MintReceipt {
            identity_hash,
            nonce: record.nonce,
            block,
        })
    }

    fn missing_fields(&self, record: &CanonicalRecord) -> Vec<IdentityField> {
        record
            .missing_identity_fields()
            .into_iter()
            .filter(|field| match field {
                IdentityField::Name => self.config.require_name,
                IdentityField::IdNumber => self.config.require_id_number,
            })
            .collect()
    }

    fn mining_limits(&self) -> MiningLimits {
        let mut limits = MiningLimits::unbounded().with_cancel(self.cancel.clone());
        if let Some(attempts) = self.config.max_mining_attempts {
            limits = limits.with_max_attempts(attempts);
        }
        if let Some(timeout) = self.config.mining_timeout {
            limits = limits.with_timeout(timeout);
        }
        limits
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify a card by its identity key (hex identity hash).
    pub fn verify(&self, key: &str) -> VerificationResult {
        let result = tourist_ledger_core::verify_key(&self.chain, key);
        log_tampering(&result);
        result
    }

    /// Verify a card by its identity hash.
    pub fn verify_identity(&self, identity: &IdentityHash) -> VerificationResult {
        let result = tourist_ledger_core::verify(&self.chain, identity);
        log_tampering(&result);
        result
    }

    /// Verify for callers that gate a trusted action.
    ///
    /// Tampering becomes [`LedgerError::ChainTampered`]; a miss is `Ok(None)`.
    pub fn verify_strict(&self, key: &str) -> Result<Option<Block>> {
        match self.verify(key) {
            VerificationResult::Verified { block, .. } => Ok(Some(block)),
            VerificationResult::NotFound => Ok(None),
            VerificationResult::Tampered { fault } => Err(LedgerError::ChainTampered(fault)),
        }
    }

    /// Chain statistics. Runs a full audit.
    pub fn stats(&self) -> ChainStats {
        let stats = self.chain.stats();
        if !stats.is_valid {
            tracing::error!(length = stats.length, "chain failed audit while collecting stats");
        }
        stats
    }
}

fn log_tampering(result: &VerificationResult) {
    if let VerificationResult::Tampered { fault } = result {
        tracing::error!(index = fault.index(), %fault, "ledger integrity compromised");
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
