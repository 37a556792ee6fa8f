//! Inline scalar alternatives

use super::Serializable;
use crate::any::make_type_url_with_prefix;
use crate::json::{json_int, json_uint, json_value_size, put_json_value, Json, JSON_VALUE_TYPE_NAME};
use crate::kind::ValueKind;
use crate::literal::format_double;
use crate::time::{
    duration_to_parts, encode_duration_to_json, encode_timestamp_to_json, format_duration,
    format_timestamp, timestamp_to_parts, validate_duration, validate_timestamp,
};
use crate::types::Type;
use crate::ValueResult;
use bytes::BytesMut;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// `null`, serialized as `google.protobuf.Value`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NullValue;

impl NullValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Null;

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Null
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        "null".to_string()
    }
}

impl Serializable for NullValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Ok(json_value_size(&Json::Null))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        put_json_value(buffer, &Json::Null);
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, JSON_VALUE_TYPE_NAME))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(Json::Null)
    }
}

/// A `bool` value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolValue(bool);

impl BoolValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Bool;

    /// Wrap `value`
    pub const fn new(value: bool) -> Self {
        BoolValue(value)
    }

    /// The underlying native value
    pub const fn native_value(self) -> bool {
        self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Bool
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.to_string()
    }
}

impl Serializable for BoolValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Ok(cel_wire::bool_value_size(self.0))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        cel_wire::put_bool_value(buffer, self.0);
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.BoolValue"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(Json::Bool(self.0))
    }
}

/// An `int` value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntValue(i64);

impl IntValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Int;

    /// Wrap `value`
    pub const fn new(value: i64) -> Self {
        IntValue(value)
    }

    /// The underlying native value
    pub const fn native_value(self) -> i64 {
        self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Int
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.to_string()
    }
}

impl Serializable for IntValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Ok(cel_wire::int64_value_size(self.0))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        cel_wire::put_int64_value(buffer, self.0);
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.Int64Value"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(json_int(self.0))
    }
}

/// A `uint` value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UintValue(u64);

impl UintValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Uint;

    /// Wrap `value`
    pub const fn new(value: u64) -> Self {
        UintValue(value)
    }

    /// The underlying native value
    pub const fn native_value(self) -> u64 {
        self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Uint
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format!("{}u", self.0)
    }
}

impl Serializable for UintValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Ok(cel_wire::uint64_value_size(self.0))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        cel_wire::put_uint64_value(buffer, self.0);
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.UInt64Value"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(json_uint(self.0))
    }
}

/// A `double` value
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct DoubleValue(f64);

impl DoubleValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Double;

    /// Wrap `value`
    pub const fn new(value: f64) -> Self {
        DoubleValue(value)
    }

    /// The underlying native value
    pub const fn native_value(self) -> f64 {
        self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Double
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format_double(self.0)
    }
}

impl Serializable for DoubleValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Ok(cel_wire::double_value_size(self.0))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        cel_wire::put_double_value(buffer, self.0);
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.DoubleValue"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(Json::Number(self.0))
    }
}

/// A signed span of time with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DurationValue(TimeDelta);

impl Default for DurationValue {
    fn default() -> Self {
        DurationValue(TimeDelta::zero())
    }
}

impl DurationValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Duration;

    /// Wrap `value` without range checks
    pub const fn new(value: TimeDelta) -> Self {
        DurationValue(value)
    }

    /// The underlying native value
    pub const fn native_value(self) -> TimeDelta {
        self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Duration
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format_duration(self.0)
    }
}

impl Serializable for DurationValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        validate_duration(self.0)?;
        let (seconds, nanos) = duration_to_parts(self.0);
        Ok(cel_wire::duration_size(seconds, nanos))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        validate_duration(self.0)?;
        let (seconds, nanos) = duration_to_parts(self.0);
        cel_wire::put_duration(buffer, seconds, nanos);
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.Duration"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(Json::String(encode_duration_to_json(self.0)?))
    }
}

/// An instant in UTC with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestampValue(DateTime<Utc>);

impl Default for TimestampValue {
    fn default() -> Self {
        TimestampValue(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl TimestampValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Timestamp;

    /// Wrap `value` without range checks
    pub const fn new(value: DateTime<Utc>) -> Self {
        TimestampValue(value)
    }

    /// The underlying native value
    pub const fn native_value(self) -> DateTime<Utc> {
        self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Timestamp
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format_timestamp(self.0)
    }
}

impl Serializable for TimestampValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        validate_timestamp(self.0)?;
        let (seconds, nanos) = timestamp_to_parts(self.0);
        Ok(cel_wire::timestamp_size(seconds, nanos))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        validate_timestamp(self.0)?;
        let (seconds, nanos) = timestamp_to_parts(self.0);
        cel_wire::put_timestamp(buffer, seconds, nanos);
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.Timestamp"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(Json::String(encode_timestamp_to_json(self.0)?))
    }
}

/// Generates `Display`, `From` and raw comparisons between a scalar
/// alternative and its native type
macro_rules! scalar_native_conversions {
    ($($alternative:ident($native:ty)),* $(,)?) => {
        $(
            impl fmt::Display for $alternative {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.debug_string())
                }
            }

            impl From<$native> for $alternative {
                fn from(value: $native) -> Self {
                    $alternative(value)
                }
            }

            impl From<$alternative> for $native {
                fn from(value: $alternative) -> Self {
                    value.0
                }
            }

            impl PartialEq<$native> for $alternative {
                fn eq(&self, other: &$native) -> bool {
                    self.0 == *other
                }
            }

            impl PartialEq<$alternative> for $native {
                fn eq(&self, other: &$alternative) -> bool {
                    *self == other.0
                }
            }
        )*
    };
}

scalar_native_conversions!(
    BoolValue(bool),
    IntValue(i64),
    UintValue(u64),
    DoubleValue(f64),
    DurationValue(TimeDelta),
    TimestampValue(DateTime<Utc>),
);

impl fmt::Display for NullValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::any::TYPE_GOOGLE_APIS_COM_PREFIX;
    use chrono::TimeZone;

    #[test]
    fn test_debug_strings() {
        assert_eq!(NullValue.debug_string(), "null");
        assert_eq!(BoolValue::new(true).debug_string(), "true");
        assert_eq!(IntValue::new(-1).debug_string(), "-1");
        assert_eq!(UintValue::new(1).debug_string(), "1u");
        assert_eq!(DoubleValue::new(1.0).debug_string(), "1.0");
        assert_eq!(DoubleValue::new(f64::NAN).debug_string(), "nan");
        assert_eq!(DurationValue::new(TimeDelta::seconds(1)).debug_string(), "1s");
        assert_eq!(TimestampValue::default().debug_string(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_bool_wire_form() {
        assert_eq!(BoolValue::new(false).serialize().unwrap().as_ref(), &[] as &[u8]);
        assert_eq!(BoolValue::new(true).serialize().unwrap().as_ref(), &[0x08, 0x01]);
        assert_eq!(BoolValue::new(true).get_serialized_size().unwrap(), 2);
    }

    #[test]
    fn test_type_urls() {
        let prefix = TYPE_GOOGLE_APIS_COM_PREFIX;
        assert_eq!(
            IntValue::new(1).get_type_url(prefix).unwrap(),
            "type.googleapis.com/google.protobuf.Int64Value"
        );
        assert_eq!(
            UintValue::new(1).get_type_url("type.googleapis.com").unwrap(),
            "type.googleapis.com/google.protobuf.UInt64Value"
        );
        assert_eq!(
            NullValue.get_type_url(prefix).unwrap(),
            "type.googleapis.com/google.protobuf.Value"
        );
    }

    #[test]
    fn test_null_wire_form() {
        assert_eq!(NullValue.serialize().unwrap().as_ref(), &[0x08, 0x00]);
        assert_eq!(NullValue.convert_to_json().unwrap(), Json::Null);
    }

    #[test]
    fn test_duration_range_enforced_at_serialization() {
        let huge = DurationValue::new(TimeDelta::seconds(crate::time::MAX_DURATION_SECONDS + 1));
        assert_eq!(
            huge.serialize().unwrap_err().code(),
            crate::ErrorCode::InvalidArgument
        );
        assert!(huge.get_serialized_size().is_err());
        assert!(huge.convert_to_json().is_err());
        // Only the wire boundary rejects it
        assert_eq!(huge.kind(), ValueKind::Duration);
    }

    #[test]
    fn test_timestamp_json() {
        let t = TimestampValue::new(Utc.timestamp_opt(1, 0).unwrap());
        assert_eq!(
            t.convert_to_json().unwrap(),
            Json::String("1970-01-01T00:00:01Z".to_string())
        );
    }

    #[test]
    fn test_native_comparisons() {
        assert_eq!(BoolValue::new(true), true);
        assert_eq!(7i64, IntValue::new(7));
        assert_eq!(u64::from(UintValue::new(3)), 3);
        assert_eq!(DoubleValue::from(0.5), 0.5);
    }
}
