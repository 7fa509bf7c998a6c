//! Canonicalization of tourist records into identity hashes.
//!
//! A raw record arrives as free-form strings. Canonicalization trims and
//! normalizes each field, attaches a nonce, and hashes the pipe-delimited
//! field string:
//!
//! ```text
//! name | email | phone | tourist_type | country | id_number | date_of_birth | nonce
//! ```
//!
//! A fresh nonce is drawn on every registration, so minting is never
//! idempotent: two registrations of the same person yield two identities.
//! Re-deriving with a preserved nonce (the profile update path) is
//! idempotent.

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::{Blake3Hash, IdentityHash};
use crate::error::{CoreError, Result};

/// Field separator in the identity preimage.
const SEPARATOR: char = '|';

/// Escape character for separators occurring inside a field.
const ESCAPE: char = '\\';

/// Raw tourist fields as submitted by the surrounding application.
///
/// Every field is optional; absent fields canonicalize to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tourist_type: Option<String>,
    pub country: Option<String>,
    pub passport_number: Option<String>,
    pub national_id_number: Option<String>,
    pub date_of_birth: Option<String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_tourist_type(mut self, tourist_type: impl Into<String>) -> Self {
        self.tourist_type = Some(tourist_type.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_passport_number(mut self, number: impl Into<String>) -> Self {
        self.passport_number = Some(number.into());
        self
    }

    pub fn with_national_id_number(mut self, number: impl Into<String>) -> Self {
        self.national_id_number = Some(number.into());
        self
    }

    pub fn with_date_of_birth(mut self, date: impl Into<String>) -> Self {
        self.date_of_birth = Some(date.into());
        self
    }
}

/// Uniqueness nonce mixed into every identity hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordNonce(pub [u8; 16]);

impl RecordNonce {
    /// Draw a fresh random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        let got = bytes.len();
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidLength { expected: 16, got })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for RecordNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordNonce({})", self.to_hex())
    }
}

impl Serialize for RecordNonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecordNonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// An identity field that must be present before a card can be minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    Name,
    IdNumber,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityField::Name => f.write_str("name"),
            IdentityField::IdNumber => f.write_str("id_number"),
        }
    }
}

/// Normalized identity fields plus the nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub name: String,
    /// Lower-cased.
    pub email: String,
    /// Digits only.
    pub phone: String,
    /// Lower-cased.
    pub tourist_type: String,
    /// Upper-cased.
    pub country: String,
    /// Passport number, or national ID number when no passport is given.
    pub id_number: String,
    pub date_of_birth: String,
    pub nonce: RecordNonce,
}

impl CanonicalRecord {
    /// The exact string that is hashed into the identity.
    pub fn preimage(&self) -> String {
        let nonce = self.nonce.to_hex();
        let fields = [
            self.name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.tourist_type.as_str(),
            self.country.as_str(),
            self.id_number.as_str(),
            self.date_of_birth.as_str(),
            nonce.as_str(),
        ];

        let mut out = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            push_escaped(&mut out, field);
        }
        out
    }

    pub fn identity_hash(&self) -> IdentityHash {
        Blake3Hash::hash(self.preimage().as_bytes()).into()
    }

    /// Mandatory identity fields that normalized to empty.
    pub fn missing_identity_fields(&self) -> Vec<IdentityField> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push(IdentityField::Name);
        }
        if self.id_number.is_empty() {
            missing.push(IdentityField::IdNumber);
        }
        missing
    }
}

/// Normalize a raw record and derive its identity hash.
///
/// With `existing_nonce` the result is deterministic; without it a fresh
/// nonce is drawn and the hash differs on every call.
pub fn canonicalize(
    raw: &RawRecord,
    existing_nonce: Option<&RecordNonce>,
) -> (CanonicalRecord, IdentityHash) {
    let id_number = non_blank(&raw.passport_number)
        .or_else(|| non_blank(&raw.national_id_number))
        .unwrap_or_default()
        .to_string();

    let record = CanonicalRecord {
        name: trimmed(&raw.name).to_string(),
        email: trimmed(&raw.email).to_lowercase(),
        phone: trimmed(&raw.phone)
            .chars()
            .filter(char::is_ascii_digit)
            .collect(),
        tourist_type: trimmed(&raw.tourist_type).to_lowercase(),
        country: trimmed(&raw.country).to_uppercase(),
        id_number,
        date_of_birth: normalize_date(trimmed(&raw.date_of_birth)).to_string(),
        nonce: existing_nonce.copied().unwrap_or_else(RecordNonce::generate),
    };

    let identity = record.identity_hash();
    (record, identity)
}

fn trimmed(field: &Option<String>) -> &str {
    field.as_deref().map(str::trim).unwrap_or_default()
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    Some(trimmed(field)).filter(|s| !s.is_empty())
}

/// Reduce an ISO-8601 timestamp (`1990-05-01T00:00:00.000Z`) to its date.
/// Anything else passes through trimmed.
fn normalize_date(date: &str) -> &str {
    let bytes = date.as_bytes();
    let looks_like_iso_date = bytes.len() > 10
        && bytes[10] == b'T'
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[..10]
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if looks_like_iso_date {
        &date[..10]
    } else {
        date
    }
}

fn push_escaped(out: &mut String, field: &str) {
    for c in field.chars() {
        if c == SEPARATOR || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}
