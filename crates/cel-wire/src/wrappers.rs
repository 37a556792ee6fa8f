//! Encoders for the protobuf well-known wrapper messages
//!
//! All of these messages are proto3: a field holding its default value is
//! omitted, so the default value of every wrapper encodes to zero bytes.

use crate::encoder::{
    length_delimited_size, put_fixed64, put_length_delimited, put_tag, put_varint, varint_size,
    WireTag, WireType,
};
use bytes::BufMut;

const WRAPPER_VARINT_TAG: WireTag = WireTag::new(1, WireType::Varint);
const WRAPPER_FIXED64_TAG: WireTag = WireTag::new(1, WireType::Fixed64);
const WRAPPER_LENGTH_DELIMITED_TAG: WireTag = WireTag::new(1, WireType::LengthDelimited);

const SECONDS_TAG: WireTag = WireTag::new(1, WireType::Varint);
const NANOS_TAG: WireTag = WireTag::new(2, WireType::Varint);

const ANY_TYPE_URL_TAG: WireTag = WireTag::new(1, WireType::LengthDelimited);
const ANY_VALUE_TAG: WireTag = WireTag::new(2, WireType::LengthDelimited);

fn varint_field_size(tag: WireTag, value: u64) -> usize {
    if value == 0 {
        0
    } else {
        tag.encoded_len() + varint_size(value)
    }
}

fn put_varint_field<B: BufMut>(buffer: &mut B, tag: WireTag, value: u64) {
    if value != 0 {
        put_tag(buffer, tag);
        put_varint(buffer, value);
    }
}

fn bytes_field_size(tag: WireTag, payload: &[u8]) -> usize {
    if payload.is_empty() {
        0
    } else {
        tag.encoded_len() + length_delimited_size(payload.len())
    }
}

fn put_bytes_field<B: BufMut>(buffer: &mut B, tag: WireTag, payload: &[u8]) {
    if !payload.is_empty() {
        put_tag(buffer, tag);
        put_length_delimited(buffer, payload);
    }
}

/// Size of a `google.protobuf.BoolValue`
pub fn bool_value_size(value: bool) -> usize {
    varint_field_size(WRAPPER_VARINT_TAG, u64::from(value))
}

/// Append a `google.protobuf.BoolValue`
pub fn put_bool_value<B: BufMut>(buffer: &mut B, value: bool) {
    put_varint_field(buffer, WRAPPER_VARINT_TAG, u64::from(value));
}

/// Size of a `google.protobuf.Int64Value`
pub fn int64_value_size(value: i64) -> usize {
    varint_field_size(WRAPPER_VARINT_TAG, value as u64)
}

/// Append a `google.protobuf.Int64Value`
pub fn put_int64_value<B: BufMut>(buffer: &mut B, value: i64) {
    put_varint_field(buffer, WRAPPER_VARINT_TAG, value as u64);
}

/// Size of a `google.protobuf.UInt64Value`
pub fn uint64_value_size(value: u64) -> usize {
    varint_field_size(WRAPPER_VARINT_TAG, value)
}

/// Append a `google.protobuf.UInt64Value`
pub fn put_uint64_value<B: BufMut>(buffer: &mut B, value: u64) {
    put_varint_field(buffer, WRAPPER_VARINT_TAG, value);
}

/// Size of a `google.protobuf.DoubleValue`
///
/// Presence is decided on the bit pattern, so `-0.0` is encoded while `0.0`
/// is not.
pub fn double_value_size(value: f64) -> usize {
    if value.to_bits() == 0 {
        0
    } else {
        WRAPPER_FIXED64_TAG.encoded_len() + 8
    }
}

/// Append a `google.protobuf.DoubleValue`
pub fn put_double_value<B: BufMut>(buffer: &mut B, value: f64) {
    let bits = value.to_bits();
    if bits != 0 {
        put_tag(buffer, WRAPPER_FIXED64_TAG);
        put_fixed64(buffer, bits);
    }
}

/// Size of a `google.protobuf.StringValue`
pub fn string_value_size(value: &str) -> usize {
    bytes_field_size(WRAPPER_LENGTH_DELIMITED_TAG, value.as_bytes())
}

/// Append a `google.protobuf.StringValue`
pub fn put_string_value<B: BufMut>(buffer: &mut B, value: &str) {
    put_bytes_field(buffer, WRAPPER_LENGTH_DELIMITED_TAG, value.as_bytes());
}

/// Size of a `google.protobuf.BytesValue`
pub fn bytes_value_size(value: &[u8]) -> usize {
    bytes_field_size(WRAPPER_LENGTH_DELIMITED_TAG, value)
}

/// Append a `google.protobuf.BytesValue`
pub fn put_bytes_value<B: BufMut>(buffer: &mut B, value: &[u8]) {
    put_bytes_field(buffer, WRAPPER_LENGTH_DELIMITED_TAG, value);
}

// `nanos` is an int32 field: negative values are sign extended to ten bytes.
fn seconds_nanos_size(seconds: i64, nanos: i32) -> usize {
    varint_field_size(SECONDS_TAG, seconds as u64)
        + varint_field_size(NANOS_TAG, i64::from(nanos) as u64)
}

fn put_seconds_nanos<B: BufMut>(buffer: &mut B, seconds: i64, nanos: i32) {
    put_varint_field(buffer, SECONDS_TAG, seconds as u64);
    put_varint_field(buffer, NANOS_TAG, i64::from(nanos) as u64);
}

/// Size of a `google.protobuf.Duration`
pub fn duration_size(seconds: i64, nanos: i32) -> usize {
    seconds_nanos_size(seconds, nanos)
}

/// Append a `google.protobuf.Duration`
///
/// The caller is responsible for `seconds` and `nanos` carrying the same sign.
pub fn put_duration<B: BufMut>(buffer: &mut B, seconds: i64, nanos: i32) {
    put_seconds_nanos(buffer, seconds, nanos);
}

/// Size of a `google.protobuf.Timestamp`
pub fn timestamp_size(seconds: i64, nanos: i32) -> usize {
    seconds_nanos_size(seconds, nanos)
}

/// Append a `google.protobuf.Timestamp`
///
/// `nanos` must be in `0..1_000_000_000`.
pub fn put_timestamp<B: BufMut>(buffer: &mut B, seconds: i64, nanos: i32) {
    put_seconds_nanos(buffer, seconds, nanos);
}

/// Size of a `google.protobuf.Any`
pub fn any_size(type_url: &str, value: &[u8]) -> usize {
    bytes_field_size(ANY_TYPE_URL_TAG, type_url.as_bytes()) + bytes_field_size(ANY_VALUE_TAG, value)
}

/// Append a `google.protobuf.Any`
pub fn put_any<B: BufMut>(buffer: &mut B, type_url: &str, value: &[u8]) {
    put_bytes_field(buffer, ANY_TYPE_URL_TAG, type_url.as_bytes());
    put_bytes_field(buffer, ANY_VALUE_TAG, value);
}
