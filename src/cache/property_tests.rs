//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check codec round trips and key normalization.

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::cache::{CacheKey, Codec, Decoded, Encoding, StoredPayload};

// == Strategies ==
/// Generates arbitrary JSON values, including finite floats.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON numbers are finite", |f| f.is_finite())
            .prop_map(Value::from),
        ".{0,24}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_-]{1,12}", inner, 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Top-level values: `null` at the top level means "no entry".
fn cacheable_strategy() -> impl Strategy<Value = Value> {
    json_strategy().prop_filter("top-level null is not cacheable", |v| !v.is_null())
}

fn encoding_strategy() -> impl Strategy<Value = Encoding> {
    prop_oneof![Just(Encoding::Plain), Just(Encoding::Compressed)]
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:-]{0,16}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // decode(encode(v)) reproduces v under every write strategy
    #[test]
    fn prop_roundtrip_every_encoding(value in cacheable_strategy(), encoding in encoding_strategy()) {
        let codec = Codec::new(encoding);
        let payload = codec.encode(&value).unwrap();
        prop_assert_eq!(codec.decode(&payload).unwrap(), Decoded::Structured(value));
    }

    // Entries written before a strategy change remain readable after it
    #[test]
    fn prop_backward_compatible_decode(
        value in cacheable_strategy(),
        written_with in encoding_strategy(),
        read_with in encoding_strategy()
    ) {
        let payload = Codec::new(written_with).encode(&value).unwrap();
        let decoded = Codec::new(read_with).decode(&payload).unwrap();
        prop_assert_eq!(decoded, Decoded::Structured(value));
    }

    // Decoding never fails on non-empty input thanks to raw passthrough
    #[test]
    fn prop_non_empty_payload_always_decodes(raw in ".{1,64}") {
        prop_assert!(Codec::default().decode(&StoredPayload::new(raw)).is_ok());
    }

    // Case and surrounding whitespace never change a key
    #[test]
    fn prop_key_normalization(name in name_strategy(), page in 1u32..1000, limit in 1u32..500) {
        let padded = format!("  {}  ", name.to_uppercase());
        prop_assert_eq!(CacheKey::list(&name, page, limit), CacheKey::list(&padded, page, limit));
        prop_assert_eq!(CacheKey::detail(&name), CacheKey::detail(&padded));
    }

    // Distinct logical list requests never share a key
    #[test]
    fn prop_distinct_list_requests_distinct_keys(
        a in (name_strategy(), 1u32..50, 1u32..50),
        b in (name_strategy(), 1u32..50, 1u32..50)
    ) {
        let same_request = a.0.to_lowercase() == b.0.to_lowercase() && a.1 == b.1 && a.2 == b.2;
        let same_key = CacheKey::list(&a.0, a.1, a.2) == CacheKey::list(&b.0, b.1, b.2);
        prop_assert_eq!(same_request, same_key);
    }
}
