//! A cloneable handle for sharing one ledger between tasks.

use std::sync::Arc;

use tokio::sync::RwLock;
use tourist_ledger_core::{
    Block, CancelFlag, ChainStats, IdentityHash, RawRecord, RecordNonce, VerificationResult,
};

use crate::error::Result;
use crate::ledger::{Ledger, MintReceipt};

/// Shared access to a [`Ledger`].
///
/// Appends take the write lock, so there is exactly one writer at a time.
/// Mining is CPU-bound and runs on the blocking pool, never on the async
/// executor. Verification and stats take the read lock and see a
/// consistent snapshot of the chain.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
    cancel: CancelFlag,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        let cancel = ledger.cancel_handle();
        Self {
            inner: Arc::new(RwLock::new(ledger)),
            cancel,
        }
    }

    /// See [`Ledger::mint`].
    pub async fn mint(&self, raw: RawRecord) -> Result<MintReceipt> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.blocking_write().mint(&raw)).await?
    }

    /// See [`Ledger::reissue`].
    pub async fn reissue(
        &self,
        raw: RawRecord,
        nonce: RecordNonce,
        previous: Option<IdentityHash>,
    ) -> Result<MintReceipt> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.blocking_write().reissue(&raw, &nonce, previous))
            .await?
    }

    /// See [`Ledger::verify`].
    pub async fn verify(&self, key: &str) -> VerificationResult {
        self.inner.read().await.verify(key)
    }

    /// See [`Ledger::verify_strict`].
    pub async fn verify_strict(&self, key: &str) -> Result<Option<Block>> {
        self.inner.read().await.verify_strict(key)
    }

    /// See [`Ledger::stats`].
    pub async fn stats(&self) -> ChainStats {
        self.inner.read().await.stats()
    }

    /// Abort the in-flight mint and refuse all later ones.
    ///
    /// Does not wait for the write lock.
    pub fn cancel_mining(&self) {
        tracing::warn!("mining cancelled for shared ledger");
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::error::LedgerError;

    fn shared(difficulty: u8) -> SharedLedger {
        SharedLedger::new(Ledger::new(LedgerConfig::default().with_difficulty(difficulty)).unwrap())
    }

    fn record(name: &str, id: &str) -> RawRecord {
        RawRecord::new().with_name(name).with_national_id_number(id)
    }

    #[tokio::test]
    async fn test_mint_and_verify() {
        let ledger = shared(1);
        let receipt = ledger.mint(record("Asha Rao", "X1234")).await.unwrap();

        let result = ledger.verify(&receipt.identity_hash.to_hex()).await;
        assert!(result.is_trusted());
        assert_eq!(ledger.stats().await.record_count, 1);
    }

    #[tokio::test]
    async fn test_invalid_record_through_handle() {
        let ledger = shared(1);
        let err = ledger.mint(RawRecord::new()).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn test_cancel_mining() {
        let ledger = shared(6);
        ledger.cancel_mining();
        let err = ledger.mint(record("Asha Rao", "X1234")).await.unwrap_err();
        assert!(matches!(err, LedgerError::MiningCancelled));
        assert_eq!(ledger.stats().await.length, 1);
    }
}
