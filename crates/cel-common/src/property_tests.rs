//! Property-based tests for value equality, ordering and serialization

use crate::*;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Generate scalar values that serialize
fn arb_serializable_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null(NullValue)),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        ".{0,40}".prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(|b| Value::from(Bytes::from(b))),
        (-(crate::time::MAX_DURATION_SECONDS - 1)..crate::time::MAX_DURATION_SECONDS, 0i64..1_000_000_000)
            .prop_map(|(s, n)| {
                let n = if s < 0 { -n } else { n };
                Value::from(TimeDelta::seconds(s) + TimeDelta::nanoseconds(n))
            }),
        (crate::time::MIN_TIMESTAMP_SECONDS..=crate::time::MAX_TIMESTAMP_SECONDS, 0u32..1_000_000_000)
            .prop_filter_map("representable timestamp", |(s, n)| {
                DateTime::from_timestamp(s, n).map(Value::from)
            }),
    ]
}

/// Generate numeric values of all three numeric kinds
fn arb_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1.0e20f64..1.0e20).prop_map(Value::from),
        (-1000i64..1000).prop_map(|i| Value::from(i as f64)),
    ]
}

proptest! {
    /// The preflighted size is the number of bytes written
    #[test]
    fn prop_serialized_size_matches(value in arb_serializable_scalar()) {
        let size = value.get_serialized_size().unwrap();
        let bytes = value.serialize().unwrap();
        prop_assert_eq!(size, bytes.len());
        let any = value.convert_to_any(TYPE_GOOGLE_APIS_COM_PREFIX).unwrap();
        prop_assert_eq!(any.value(), &bytes);
    }

    /// A view behaves exactly like the value it borrows
    #[test]
    fn prop_view_agrees_with_value(value in arb_serializable_scalar()) {
        let view = value.as_view();
        prop_assert_eq!(value.kind(), view.kind());
        prop_assert_eq!(value.debug_string(), view.debug_string());
        prop_assert_eq!(hash_of(&value), hash_of(&view));
        prop_assert_eq!(value.partial_cmp(&view), view.partial_cmp(&value));
        prop_assert_eq!(value == view, value == value.clone());
        prop_assert_eq!(value.serialize().unwrap(), view.serialize().unwrap());
    }

    /// Integer literals compare like their values
    #[test]
    fn prop_int_literal_comparisons(a in any::<i64>(), b in any::<i64>()) {
        let value = Value::from(a);
        prop_assert_eq!(value == b, a == b);
        prop_assert_eq!(value.partial_cmp(&b), a.partial_cmp(&b));
        prop_assert_eq!(value.as_view().partial_cmp(&b), a.partial_cmp(&b));
        prop_assert_eq!(b.partial_cmp(&value), b.partial_cmp(&a));
    }

    /// Strings order by their bytes
    #[test]
    fn prop_string_ordering(a in ".{0,12}", b in ".{0,12}") {
        let va = Value::from(a.as_str());
        let vb = Value::from(b.as_str());
        prop_assert_eq!(va.partial_cmp(&vb), Some(a.cmp(&b)));
        prop_assert_eq!(va == vb, a == b);
    }

    /// Equal numbers hash alike and ordering is antisymmetric
    #[test]
    fn prop_numeric_ordering_consistent(a in arb_number(), b in arb_number()) {
        let forward = a.partial_cmp(&b);
        let backward = b.partial_cmp(&a);
        prop_assert_eq!(forward, backward.map(Ordering::reverse));
        prop_assert_eq!(a == b, forward == Some(Ordering::Equal));
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    /// Integers that fit the JSON number range project to numbers
    #[test]
    fn prop_json_int_projection(i in any::<i64>()) {
        let json = Value::from(i).convert_to_json().unwrap();
        if (json::JSON_MIN_INT..=json::JSON_MAX_INT).contains(&i) {
            prop_assert_eq!(json, Json::Number(i as f64));
        } else {
            prop_assert_eq!(json, Json::String(i.to_string()));
        }
    }

    /// Optionals and maps holding equal numbers are equal and hash alike
    #[test]
    fn prop_extension_hash_agrees_with_equality(a in arb_number(), b in arb_number()) {
        let oa = Value::from(OptionalValue::of(a.clone()));
        let ob = Value::from(OptionalValue::of(b.clone()));
        prop_assert_eq!(oa == ob, a == b);
        if oa == ob {
            prop_assert_eq!(hash_of(&oa), hash_of(&ob));
        }

        let single = |value: &Value| {
            let mut builder = MapValueBuilder::new(MapType::default());
            builder.put(Value::from("n"), value.clone()).unwrap();
            Value::Map(builder.build())
        };
        let (ma, mb) = (single(&a), single(&b));
        prop_assert_eq!(ma == mb, a == b);
        if ma == mb {
            prop_assert_eq!(hash_of(&ma), hash_of(&mb));
        }
    }

    /// An optional hashes alike whichever numeric kind holds its number
    #[test]
    fn prop_optional_numeric_kinds_hash_alike(i in 0i64..1_000_000) {
        let int = Value::from(OptionalValue::of(Value::from(i)));
        let uint = Value::from(OptionalValue::of(Value::from(i as u64)));
        let double = Value::from(OptionalValue::of(Value::from(i as f64)));
        prop_assert_eq!(&int, &uint);
        prop_assert_eq!(&int, &double);
        prop_assert_eq!(hash_of(&int), hash_of(&uint));
        prop_assert_eq!(hash_of(&int), hash_of(&double));
    }

    /// Lists built from the same elements are equal and hash alike
    #[test]
    fn prop_list_equality(items in prop::collection::vec(any::<i64>(), 0..8)) {
        let a = Value::List(test_helpers::int_list(&items));
        let b = Value::List(ListValue::new(test_helpers::RecordingList::new(items.clone())));
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }
}
