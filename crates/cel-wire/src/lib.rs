//! Protocol buffer wire encoding for CEL values
//!
//! This crate knows nothing about CEL values themselves. It provides the
//! low-level pieces (varints, tags, fixed-width and length-delimited fields)
//! and the encoders for the well-known wrapper messages that primitive CEL
//! values serialize as:
//!
//! - `google.protobuf.BoolValue`, `Int64Value`, `UInt64Value`, `DoubleValue`
//! - `google.protobuf.StringValue`, `BytesValue`
//! - `google.protobuf.Duration`, `Timestamp`
//! - `google.protobuf.Any`
//!
//! Every encoder comes with a matching `*_size` function. The size function
//! always returns exactly the number of bytes the encoder appends, so callers
//! can preflight buffer sizes.

pub mod encoder;
pub mod wrappers;

#[cfg(test)]
mod property_tests;

pub use encoder::{
    length_delimited_size, put_fixed64, put_length_delimited, put_tag, put_varint, varint_size,
    WireTag, WireType,
};
pub use wrappers::{
    any_size, bool_value_size, bytes_value_size, double_value_size, duration_size,
    int64_value_size, put_any, put_bool_value, put_bytes_value, put_double_value, put_duration,
    put_int64_value, put_string_value, put_timestamp, put_uint64_value, string_value_size,
    timestamp_size, uint64_value_size,
};
