//! Test fixtures and helpers.
//!
//! Common setup code for integration tests and benchmarks.

use rand::Rng;
use tourist_ledger::{Ledger, LedgerConfig, MintReceipt, RawRecord};
use tourist_ledger_core::{Block, Chain};

/// The canonical example tourist.
pub fn asha_rao() -> RawRecord {
    RawRecord::new()
        .with_name("Asha Rao")
        .with_country("IN")
        .with_passport_number("X1234")
}

/// A handful of distinct, valid tourists.
pub fn sample_tourists() -> Vec<RawRecord> {
    vec![
        asha_rao(),
        RawRecord::new()
            .with_name("Bikram Thapa")
            .with_tourist_type("domestic")
            .with_country("NP")
            .with_national_id_number("NP-778899"),
        RawRecord::new()
            .with_name("Claire Dubois")
            .with_email("claire.dubois@example.fr")
            .with_phone("+33 6 12 34 56 78")
            .with_tourist_type("international")
            .with_country("FR")
            .with_passport_number("19FR55231")
            .with_date_of_birth("1987-11-23"),
        RawRecord::new()
            .with_name("Dawa Sherpa")
            .with_country("IN")
            .with_national_id_number("SK-2231-09")
            .with_date_of_birth("1979-02-14T00:00:00.000Z"),
        RawRecord::new()
            .with_name("Emeka Obi")
            .with_email("emeka@example.ng")
            .with_tourist_type("International")
            .with_country("ng")
            .with_passport_number("A0099123"),
    ]
}

/// A random valid tourist.
pub fn random_tourist<R: Rng>(rng: &mut R) -> RawRecord {
    const COUNTRIES: [&str; 5] = ["IN", "NP", "BT", "FR", "US"];
    let serial: u32 = rng.gen_range(0..1_000_000);
    RawRecord::new()
        .with_name(format!("Tourist {:06}", serial))
        .with_country(COUNTRIES[rng.gen_range(0..COUNTRIES.len())])
        .with_tourist_type(if rng.gen_bool(0.5) { "domestic" } else { "international" })
        .with_passport_number(format!("P{:08}", rng.gen::<u32>()))
}

/// A ledger together with the receipts of everything minted into it.
pub struct LedgerFixture {
    pub ledger: Ledger,
    pub receipts: Vec<MintReceipt>,
}

impl LedgerFixture {
    /// An empty ledger at difficulty 1.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default().with_difficulty(1))
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let ledger = Ledger::new(config).unwrap_or_else(|e| panic!("fixture config: {}", e));
        Self {
            ledger,
            receipts: Vec::new(),
        }
    }

    /// A difficulty-1 ledger holding `count` minted tourists.
    pub fn with_records(count: usize) -> Self {
        let mut fixture = Self::new();
        let samples = sample_tourists();
        for i in 0..count {
            let raw = match samples.get(i) {
                Some(raw) => raw.clone(),
                None => RawRecord::new()
                    .with_name(format!("Tourist {}", i))
                    .with_passport_number(format!("P{:06}", i)),
            };
            fixture.mint(&raw);
        }
        fixture
    }

    /// Mint a record, panicking on failure.
    pub fn mint(&mut self, raw: &RawRecord) -> &MintReceipt {
        let receipt = self
            .ledger
            .mint(raw)
            .unwrap_or_else(|e| panic!("fixture mint: {}", e));
        self.receipts.push(receipt);
        &self.receipts[self.receipts.len() - 1]
    }

    /// A copy of this ledger with block `index` altered by `tamper`.
    pub fn tampered(&self, index: usize, tamper: impl FnOnce(&mut Block)) -> Ledger {
        tamper_block(&self.ledger, index, tamper)
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild `ledger` with block `index` altered by `tamper`.
///
/// Simulates storage corruption without touching the original ledger.
pub fn tamper_block(ledger: &Ledger, index: usize, tamper: impl FnOnce(&mut Block)) -> Ledger {
    let mut blocks = ledger.chain().blocks().to_vec();
    tamper(&mut blocks[index]);
    let chain = Chain::restore(blocks, ledger.chain().difficulty());
    Ledger::from_chain(chain, ledger.config().clone())
        .unwrap_or_else(|e| panic!("fixture restore: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourist_ledger::VerificationResult;

    #[test]
    fn test_samples_are_valid_and_distinct() {
        let fixture = LedgerFixture::with_records(sample_tourists().len());
        let stats = fixture.ledger.stats();
        assert_eq!(stats.record_count, 5);
        assert!(stats.is_valid);

        let mut identities: Vec<_> = fixture.receipts.iter().map(|r| r.identity_hash).collect();
        identities.sort();
        identities.dedup();
        assert_eq!(identities.len(), 5);
    }

    #[test]
    fn test_with_records_beyond_samples() {
        let fixture = LedgerFixture::with_records(8);
        assert_eq!(fixture.ledger.chain().len(), 9);
    }

    #[test]
    fn test_tampered_copy_leaves_original_intact() {
        let fixture = LedgerFixture::with_records(2);
        let damaged = fixture.tampered(2, |block| block.timestamp += 1);

        let key = fixture.receipts[0].identity_hash.to_hex();
        assert!(fixture.ledger.verify(&key).is_trusted());
        assert!(matches!(
            damaged.verify(&key),
            VerificationResult::Tampered { .. }
        ));
    }

    #[test]
    fn test_random_tourist_is_mintable() {
        let mut rng = rand::thread_rng();
        let mut fixture = LedgerFixture::new();
        for _ in 0..4 {
            let raw = random_tourist(&mut rng);
            fixture.mint(&raw);
        }
        assert!(fixture.ledger.chain().is_valid());
    }
}
