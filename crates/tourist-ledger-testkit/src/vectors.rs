//! Golden test vectors for identity canonicalization.
//!
//! Each vector fixes a raw record and a nonce. The preimage is the exact
//! string that gets hashed, so any implementation that normalizes
//! differently fails here before it produces a mismatched hash.

use serde::Serialize;

use tourist_ledger_core::{canonicalize, Block, RawRecord, RecordNonce};

/// Canonical CBOR preimage of the genesis block (hex), nonce included.
pub const GENESIS_PREIMAGE: &str = "a50000016130021b0000018cc251f40003a2006767656e65736973017821536d61727420546f75726973742043617264206c65646765722067656e657369730400";

/// Hash of the genesis block shared by every chain.
pub const GENESIS_HASH: &str = "1f5aaa7bea2683ffc1cbdf88d2eb0e9f443806e49d47b286068c20962fc4c0fc";

/// A golden test vector.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub raw_name: Option<&'static str>,
    pub email: Option<&'static str>,
    pub phone: Option<&'static str>,
    pub tourist_type: Option<&'static str>,
    pub country: Option<&'static str>,
    pub passport_number: Option<&'static str>,
    pub national_id_number: Option<&'static str>,
    pub date_of_birth: Option<&'static str>,
    /// Record nonce.
    #[serde(serialize_with = "hex_bytes")]
    pub nonce: [u8; 16],
    /// Expected identity preimage.
    pub expected_preimage: &'static str,
    /// Expected identity hash (hex). Empty means "report only".
    pub expected_identity: &'static str,
}

fn hex_bytes<S: serde::Serializer>(bytes: &[u8; 16], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

impl CanonicalVector {
    pub fn raw_record(&self) -> RawRecord {
        RawRecord {
            name: self.raw_name.map(String::from),
            email: self.email.map(String::from),
            phone: self.phone.map(String::from),
            tourist_type: self.tourist_type.map(String::from),
            country: self.country.map(String::from),
            passport_number: self.passport_number.map(String::from),
            national_id_number: self.national_id_number.map(String::from),
            date_of_birth: self.date_of_birth.map(String::from),
        }
    }

    pub fn nonce(&self) -> RecordNonce {
        RecordNonce::from_bytes(self.nonce)
    }
}

const EMPTY: CanonicalVector = CanonicalVector {
    name: "",
    raw_name: None,
    email: None,
    phone: None,
    tourist_type: None,
    country: None,
    passport_number: None,
    national_id_number: None,
    date_of_birth: None,
    nonce: [0; 16],
    expected_preimage: "",
    expected_identity: "",
};

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<CanonicalVector> {
    vec![
        CanonicalVector {
            name: "minimal record",
            raw_name: Some("Asha Rao"),
            country: Some("IN"),
            passport_number: Some("X1234"),
            expected_preimage: "Asha Rao||||IN|X1234||00000000000000000000000000000000",
            expected_identity: "0f5939ef22c47fc141a71cbe6b5d1cea7ec22f87e55e4a8fb6ccc358ae2fa891",
            ..EMPTY
        },
        CanonicalVector {
            name: "whitespace, case, phone punctuation and ISO timestamp",
            raw_name: Some("  Asha Rao "),
            email: Some(" Asha.Rao@Example.COM "),
            phone: Some("+91 (98) 765-43210"),
            tourist_type: Some(" International "),
            country: Some(" in "),
            passport_number: Some(" X1234 "),
            national_id_number: Some("AADHAAR-1"),
            date_of_birth: Some("1990-05-01T00:00:00.000Z"),
            nonce: [
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
                0x0e, 0x0f, 0x10,
            ],
            expected_preimage: "Asha Rao|asha.rao@example.com|919876543210|international|IN|X1234|1990-05-01|0102030405060708090a0b0c0d0e0f10",
            expected_identity: "efac8ea10f261ebe433e930028db2d1a39501c8f5b2ca7f969caf568f4dae72a",
            ..EMPTY
        },
        CanonicalVector {
            name: "blank passport falls back to national id",
            raw_name: Some("Bikram Thapa"),
            tourist_type: Some("Domestic"),
            country: Some("np"),
            passport_number: Some("   "),
            national_id_number: Some(" NP-778899 "),
            date_of_birth: Some("01/05/1990"),
            nonce: [0xff; 16],
            expected_preimage: "Bikram Thapa|||domestic|NP|NP-778899|01/05/1990|ffffffffffffffffffffffffffffffff",
            expected_identity: "3bdca6f7fdc2de426b6c7f9e1f9e5e0b4be62b3646057bc118acab674bdb5779",
            ..EMPTY
        },
        CanonicalVector {
            name: "separator and escape inside fields",
            raw_name: Some(r"A|B \ C"),
            passport_number: Some("P|1"),
            nonce: [0xab; 16],
            expected_preimage: r"A\|B \\ C|||||P\|1||abababababababababababababababab",
            expected_identity: "8b4891698e283ce6f174716df098513ea87456d32e58e6705758cd8bc227c424",
            ..EMPTY
        },
    ]
}

/// Check every vector's preimage (and identity, where pinned).
///
/// Returns `(name, matches, identity_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let (record, identity) = canonicalize(&v.raw_record(), Some(&v.nonce()));
            let hex = identity.to_hex();

            let matches = record.preimage() == v.expected_preimage
                && (v.expected_identity.is_empty() || hex == v.expected_identity);

            (v.name.to_string(), matches, hex)
        })
        .collect()
}

/// Check the genesis block against its pinned preimage and hash.
pub fn verify_genesis() -> bool {
    let genesis = Block::genesis();
    let preimage = hex::encode(tourist_ledger_core::encoding::seal_preimage(
        &genesis.preimage_prefix(),
        genesis.nonce,
    ));
    preimage == GENESIS_PREIMAGE && genesis.hash.to_hex() == GENESIS_HASH
}

/// Vectors with computed identities, as JSON for other implementations.
pub fn vectors_json() -> serde_json::Result<String> {
    let computed: Vec<serde_json::Value> = all_vectors()
        .iter()
        .map(|v| -> serde_json::Result<serde_json::Value> {
            let (_, identity) = canonicalize(&v.raw_record(), Some(&v.nonce()));
            let mut value = serde_json::to_value(v)?;
            value["expected_identity"] = serde_json::Value::String(identity.to_hex());
            Ok(value)
        })
        .collect::<serde_json::Result<_>>()?;
    serde_json::to_string_pretty(&computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, identity) in verify_all_vectors() {
            assert!(matches, "vector '{}' diverged (identity {})", name, identity);
        }
    }

    #[test]
    fn test_every_vector_pins_its_identity() {
        for vector in all_vectors() {
            assert_eq!(vector.expected_identity.len(), 64, "vector '{}'", vector.name);
        }
    }

    #[test]
    fn test_genesis_is_pinned() {
        let genesis = Block::genesis();
        assert_eq!(genesis.hash.to_hex(), GENESIS_HASH);
        assert!(verify_genesis());
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let (_, h1) = canonicalize(&vector.raw_record(), Some(&vector.nonce()));
            let (_, h2) = canonicalize(&vector.raw_record(), Some(&vector.nonce()));
            assert_eq!(h1, h2, "vector '{}' produced different identities", vector.name);
        }
    }

    #[test]
    fn test_different_nonces_different_identities() {
        let v1 = all_vectors().remove(0);
        let v2 = CanonicalVector {
            nonce: [0x01; 16],
            ..v1.clone()
        };

        let (_, h1) = canonicalize(&v1.raw_record(), Some(&v1.nonce()));
        let (_, h2) = canonicalize(&v2.raw_record(), Some(&v2.nonce()));
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_vectors_json() {
        let json: serde_json::Value = serde_json::from_str(&vectors_json().unwrap()).unwrap();
        let vectors = json.as_array().unwrap();
        assert_eq!(vectors.len(), all_vectors().len());
        assert_eq!(vectors[0]["nonce"], "00000000000000000000000000000000");
        assert_eq!(vectors[0]["expected_identity"].as_str().unwrap().len(), 64);
    }
}
