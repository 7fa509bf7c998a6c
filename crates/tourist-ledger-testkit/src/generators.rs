//! Proptest generators for property-based testing.

use proptest::prelude::*;

use tourist_ledger_core::{RawRecord, RecordNonce};

/// Generate a random RecordNonce.
pub fn record_nonce() -> impl Strategy<Value = RecordNonce> {
    any::<[u8; 16]>().prop_map(RecordNonce::from_bytes)
}

/// Text padded with whitespace, sometimes carrying the separator or escape.
pub fn messy_text(max_len: usize) -> impl Strategy<Value = String> {
    let core = prop::collection::vec(
        prop_oneof![
            8 => prop::char::range('a', 'z'),
            2 => prop::char::range('A', 'Z'),
            1 => Just(' '),
            1 => Just('|'),
            1 => Just('\\'),
            1 => Just('é'),
        ],
        0..=max_len,
    )
    .prop_map(|chars| chars.into_iter().collect::<String>());

    ("[ \t]{0,2}", core, "[ \t\n]{0,2}").prop_map(|(lead, core, trail)| lead + &core + &trail)
}

/// An ISO date, an ISO timestamp, or free text.
pub fn date_of_birth() -> impl Strategy<Value = String> {
    prop_oneof![
        (1900u32..2020, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d)),
        (1900u32..2020, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}T00:00:00.000Z", y, m, d)),
        "[0-9/]{0,10}",
    ]
}

/// A raw record with every field optional and often messy.
pub fn raw_record() -> impl Strategy<Value = RawRecord> {
    (
        proptest::option::of(messy_text(24)),
        proptest::option::of("[ ]?[A-Za-z0-9.]{1,12}@[A-Za-z]{1,8}\\.[a-z]{2,3}[ ]?"),
        proptest::option::of("[+]?[0-9 ()-]{0,16}"),
        proptest::option::of(messy_text(14)),
        proptest::option::of("[ ]?[A-Za-z]{2}[ ]?"),
        proptest::option::of(messy_text(12)),
        proptest::option::of(messy_text(12)),
        proptest::option::of(date_of_birth()),
    )
        .prop_map(
            |(name, email, phone, tourist_type, country, passport, national_id, dob)| RawRecord {
                name,
                email,
                phone,
                tourist_type,
                country,
                passport_number: passport,
                national_id_number: national_id,
                date_of_birth: dob,
            },
        )
}

/// A raw record that passes the default mandatory-field checks.
pub fn valid_raw_record() -> impl Strategy<Value = RawRecord> {
    (raw_record(), "[A-Z][a-z]{1,12}", "[A-Z0-9]{4,10}").prop_map(|(raw, name, id)| {
        RawRecord {
            name: Some(name),
            passport_number: Some(id),
            ..raw
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourist_ledger::{Ledger, LedgerConfig};
    use tourist_ledger_core::canonicalize;

    proptest! {
        #[test]
        fn test_supplied_nonce_is_idempotent(raw in raw_record(), nonce in record_nonce()) {
            let (r1, h1) = canonicalize(&raw, Some(&nonce));
            let (r2, h2) = canonicalize(&raw, Some(&nonce));

            prop_assert_eq!(r1, r2);
            prop_assert_eq!(h1, h2);
        }

        #[test]
        fn test_fresh_nonce_changes_identity(raw in raw_record()) {
            let (_, h1) = canonicalize(&raw, None);
            let (_, h2) = canonicalize(&raw, None);

            prop_assert_ne!(h1, h2);
        }

        #[test]
        fn test_normalized_fields_are_trimmed(raw in raw_record(), nonce in record_nonce()) {
            let (record, _) = canonicalize(&raw, Some(&nonce));

            for field in [&record.name, &record.email, &record.tourist_type, &record.country] {
                prop_assert_eq!(field.trim(), field.as_str());
            }
            prop_assert!(record.phone.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(record.date_of_birth.len() <= 10 || !record.date_of_birth.contains('T'));
        }

        #[test]
        fn test_field_boundaries_are_unambiguous(
            left in messy_text(8),
            right in messy_text(8),
            nonce in record_nonce(),
        ) {
            // Moving text across the name/email boundary must change the hash.
            let a = RawRecord::new().with_name(format!("{}|", left.trim())).with_email(right.trim());
            let b = RawRecord::new().with_name(left.trim()).with_email(format!("|{}", right.trim()));

            let (_, ha) = canonicalize(&a, Some(&nonce));
            let (_, hb) = canonicalize(&b, Some(&nonce));
            prop_assert_ne!(ha, hb);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_valid_records_always_mint(raw in valid_raw_record()) {
            let mut ledger = Ledger::new(LedgerConfig::default().with_difficulty(1)).unwrap();
            let receipt = ledger.mint(&raw).unwrap();

            prop_assert!(receipt.block.is_self_consistent());
            prop_assert!(ledger.verify_identity(&receipt.identity_hash).is_trusted());
        }
    }
}
