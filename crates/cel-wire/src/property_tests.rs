//! Property-based tests for the wrapper encoders

use crate::*;
use bytes::BytesMut;
use proptest::prelude::*;

fn encoded_len(f: impl FnOnce(&mut BytesMut)) -> usize {
    let mut buffer = BytesMut::new();
    f(&mut buffer);
    buffer.len()
}

proptest! {
    /// Varint size must match what put_varint writes
    #[test]
    fn prop_varint_size_matches(value in any::<u64>()) {
        prop_assert_eq!(encoded_len(|b| put_varint(b, value)), varint_size(value));
    }

    #[test]
    fn prop_int64_size_matches(value in any::<i64>()) {
        prop_assert_eq!(encoded_len(|b| put_int64_value(b, value)), int64_value_size(value));
    }

    #[test]
    fn prop_uint64_size_matches(value in any::<u64>()) {
        prop_assert_eq!(encoded_len(|b| put_uint64_value(b, value)), uint64_value_size(value));
    }

    #[test]
    fn prop_double_size_matches(value in any::<f64>()) {
        prop_assert_eq!(encoded_len(|b| put_double_value(b, value)), double_value_size(value));
    }

    #[test]
    fn prop_string_size_matches(value in ".{0,300}") {
        prop_assert_eq!(encoded_len(|b| put_string_value(b, &value)), string_value_size(&value));
    }

    #[test]
    fn prop_duration_size_matches(seconds in any::<i64>(), nanos in -999_999_999i32..=999_999_999) {
        prop_assert_eq!(encoded_len(|b| put_duration(b, seconds, nanos)), duration_size(seconds, nanos));
    }
}
