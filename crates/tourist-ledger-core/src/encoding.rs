//! Canonical CBOR encoding for block hashing.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! A block's hash covers `index | previous_hash | timestamp | data | nonce`.
//! The nonce is the last map entry, so the bytes before it can be encoded
//! once and reused for every nonce the miner tries.

use ciborium::value::Value;

use crate::block::{BlockData, CardPayload, PrevLink};
use crate::crypto::{Blake3Hash, BlockHash};

/// Block field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR, so numeric order is also
/// encoded-byte order.
mod keys {
    pub const INDEX: u64 = 0;
    pub const PREVIOUS_HASH: u64 = 1;
    pub const TIMESTAMP: u64 = 2;
    pub const DATA: u64 = 3;
    pub const NONCE: u64 = 4;

    /// Number of entries in a block map, nonce included.
    pub const BLOCK_ENTRIES: u64 = 5;
}

/// Payload field keys.
mod data_keys {
    pub const KIND: u64 = 0;
    pub const MESSAGE: u64 = 1;
    pub const IDENTITY_HASH: u64 = 1;
    pub const NAME: u64 = 2;
    pub const TOURIST_TYPE: u64 = 3;
    pub const COUNTRY: u64 = 4;
    pub const ISSUED_AT: u64 = 5;
    pub const SUPERSEDES: u64 = 6;
}

const KIND_GENESIS: &str = "genesis";
const KIND_TOURIST_CARD: &str = "tourist-card";

/// Encode every block field except the nonce.
///
/// The map header already counts the nonce entry; complete the preimage
/// with [`seal_preimage`].
pub fn block_preimage_prefix(
    index: u64,
    previous_hash: &PrevLink,
    timestamp: i64,
    data: &BlockData,
) -> Vec<u8> {
    let entries = vec![
        (Value::Integer(keys::INDEX.into()), Value::Integer(index.into())),
        (
            Value::Integer(keys::PREVIOUS_HASH.into()),
            prev_link_to_cbor_value(previous_hash),
        ),
        (
            Value::Integer(keys::TIMESTAMP.into()),
            Value::Integer(timestamp.into()),
        ),
        (Value::Integer(keys::DATA.into()), data_to_cbor_value(data)),
    ];

    let mut buf = Vec::new();
    encode_uint(&mut buf, 5, keys::BLOCK_ENTRIES);
    encode_entries_sorted(&mut buf, &entries);
    buf
}

/// Append the nonce entry to a prefix, producing the full preimage.
pub fn seal_preimage(prefix: &[u8], nonce: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(prefix.len() + 10);
    buf.extend_from_slice(prefix);
    encode_uint(&mut buf, 0, keys::NONCE);
    encode_uint(&mut buf, 0, nonce);
    buf
}

/// Hash a prefix completed with the given nonce.
pub fn hash_with_nonce(prefix: &[u8], nonce: u64) -> BlockHash {
    let mut tail = Vec::with_capacity(10);
    encode_uint(&mut tail, 0, keys::NONCE);
    encode_uint(&mut tail, 0, nonce);
    Blake3Hash::hash_parts(&[prefix, &tail]).into()
}

/// Encode a payload on its own (used by tests and debugging tools).
pub fn canonical_data_bytes(data: &BlockData) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &data_to_cbor_value(data));
    buf
}

fn prev_link_to_cbor_value(link: &PrevLink) -> Value {
    match link {
        PrevLink::Genesis => Value::Text(PrevLink::GENESIS_TEXT.to_string()),
        PrevLink::Block(hash) => Value::Bytes(hash.0.to_vec()),
    }
}

fn data_to_cbor_value(data: &BlockData) -> Value {
    match data {
        BlockData::Genesis { message } => Value::Map(vec![
            (
                Value::Integer(data_keys::KIND.into()),
                Value::Text(KIND_GENESIS.to_string()),
            ),
            (
                Value::Integer(data_keys::MESSAGE.into()),
                Value::Text(message.clone()),
            ),
        ]),
        BlockData::TouristCard(card) => card_to_cbor_value(card),
    }
}

fn card_to_cbor_value(card: &CardPayload) -> Value {
    let supersedes = match &card.supersedes {
        Some(id) => Value::Bytes(id.0.to_vec()),
        None => Value::Null,
    };

    Value::Map(vec![
        (
            Value::Integer(data_keys::KIND.into()),
            Value::Text(KIND_TOURIST_CARD.to_string()),
        ),
        (
            Value::Integer(data_keys::IDENTITY_HASH.into()),
            Value::Bytes(card.identity_hash.0.to_vec()),
        ),
        (
            Value::Integer(data_keys::NAME.into()),
            Value::Text(card.name.clone()),
        ),
        (
            Value::Integer(data_keys::TOURIST_TYPE.into()),
            Value::Text(card.tourist_type.clone()),
        ),
        (
            Value::Integer(data_keys::COUNTRY.into()),
            Value::Text(card.country.clone()),
        ),
        (
            Value::Integer(data_keys::ISSUED_AT.into()),
            Value::Integer(card.issued_at.into()),
        ),
        (Value::Integer(data_keys::SUPERSEDES.into()), supersedes),
    ])
}

/// Recursively encode a CBOR value.
///
/// Only the value shapes built in this module are reachable.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        _ => unreachable!("ledger payloads never contain floats, tags or simple values"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    encode_uint(buf, 5, entries.len() as u64);
    encode_entries_sorted(buf, entries);
}

/// Write key-value pairs sorted by their encoded key bytes.
fn encode_entries_sorted(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::IdentityHash;

    fn sample_card() -> BlockData {
        BlockData::TouristCard(CardPayload {
            identity_hash: IdentityHash::from_bytes([0x11; 32]),
            name: "Asha Rao".into(),
            tourist_type: "international".into(),
            country: "IN".into(),
            issued_at: 1_736_870_400_000,
            supersedes: None,
        })
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();

        encode_uint(&mut buf, 0, 0);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, 65536);
        assert_eq!(buf, vec![0x1a, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_negative_integer_encoding() {
        let mut buf = Vec::new();
        encode_integer(&mut buf, (-1i64).into());
        assert_eq!(buf, vec![0x20]);

        buf.clear();
        encode_integer(&mut buf, (-25i64).into());
        assert_eq!(buf, vec![0x38, 24]);
    }

    #[test]
    fn test_map_key_ordering() {
        let mut buf = Vec::new();
        let entries = vec![
            (Value::Integer(8.into()), Value::Integer(80.into())),
            (Value::Integer(0.into()), Value::Integer(0.into())),
            (Value::Integer(5.into()), Value::Integer(50.into())),
        ];
        encode_map_canonical(&mut buf, &entries);

        assert_eq!(buf[0], 0xa3);
        assert_eq!(&buf[1..3], &[0x00, 0x00]);
        assert_eq!(&buf[3..6], &[0x05, 0x18, 50]);
        assert_eq!(&buf[6..9], &[0x08, 0x18, 80]);
    }

    #[test]
    fn test_payload_encoding_deterministic() {
        let a = canonical_data_bytes(&sample_card());
        let b = canonical_data_bytes(&sample_card());
        assert_eq!(a, b);
    }

    #[test]
    fn test_payload_field_change_changes_bytes() {
        let original = canonical_data_bytes(&sample_card());

        let mut altered = sample_card();
        if let BlockData::TouristCard(card) = &mut altered {
            card.country = "IO".into();
        }
        assert_ne!(original, canonical_data_bytes(&altered));
    }

    #[test]
    fn test_prefix_header_counts_nonce() {
        let prefix = block_preimage_prefix(1, &PrevLink::Genesis, 0, &sample_card());
        // map(5)
        assert_eq!(prefix[0], 0xa5);
        // key 0, index 1
        assert_eq!(&prefix[1..3], &[0x00, 0x01]);
        // key 1, text "0"
        assert_eq!(&prefix[3..6], &[0x01, 0x61, b'0']);
    }

    #[test]
    fn test_sealed_preimage_decodes_as_cbor() {
        let prefix = block_preimage_prefix(
            7,
            &PrevLink::Block(BlockHash::from_bytes([0x22; 32])),
            -5,
            &sample_card(),
        );
        let bytes = seal_preimage(&prefix, 1_000_000);

        let value: Value = ciborium::from_reader(std::io::Cursor::new(&bytes)).unwrap();
        let Value::Map(entries) = value else {
            panic!("expected map");
        };
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[4].0, Value::Integer(4.into()));
        assert_eq!(entries[4].1, Value::Integer(1_000_000.into()));
    }

    #[test]
    fn test_hash_with_nonce_matches_sealed_preimage() {
        let prefix = block_preimage_prefix(3, &PrevLink::Genesis, 42, &sample_card());
        for nonce in [0u64, 23, 24, 70_000, u64::MAX] {
            let direct: BlockHash = Blake3Hash::hash(&seal_preimage(&prefix, nonce)).into();
            assert_eq!(hash_with_nonce(&prefix, nonce), direct);
        }
    }
}
