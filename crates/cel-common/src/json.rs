//! JSON projection of CEL values
//!
//! [`Json`] mirrors `google.protobuf.Value`: numbers are doubles, object
//! keys are strings and object fields keep insertion order. Integers that a
//! double cannot hold exactly are projected as decimal strings and bytes as
//! base64.
//!
//! Besides conversion to and from `serde_json`, this module encodes JSON to
//! the protobuf wire forms of `google.protobuf.Value`, `ListValue` and
//! `Struct`.

use crate::any::{make_type_url_with_prefix, Any};
use base64::prelude::*;
use bytes::BytesMut;
use cel_wire::{
    length_delimited_size, put_fixed64, put_length_delimited, put_tag, put_varint, varint_size,
    WireTag, WireType,
};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Type name of `google.protobuf.Value`
pub const JSON_VALUE_TYPE_NAME: &str = "google.protobuf.Value";
/// Type name of `google.protobuf.ListValue`
pub const JSON_LIST_TYPE_NAME: &str = "google.protobuf.ListValue";
/// Type name of `google.protobuf.Struct`
pub const JSON_STRUCT_TYPE_NAME: &str = "google.protobuf.Struct";

/// Largest integer magnitude a JSON number holds exactly
pub const JSON_MAX_INT: i64 = (1 << 53) - 1;
/// Smallest int that projects to a JSON number
pub const JSON_MIN_INT: i64 = -JSON_MAX_INT;
/// Largest uint that projects to a JSON number
pub const JSON_MAX_UINT: u64 = (1 << 53) - 1;

/// A JSON array
pub type JsonArray = Vec<Json>;
/// A JSON object, in insertion order
pub type JsonObject = IndexMap<String, Json>;

/// A JSON value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Json {
    /// `null`
    #[default]
    Null,
    /// `true` or `false`
    Bool(bool),
    /// A number, always a double
    Number(f64),
    /// A string
    String(String),
    /// An array
    Array(JsonArray),
    /// An object
    Object(JsonObject),
}

/// Project a signed integer, as a string when outside the exact range
pub fn json_int(value: i64) -> Json {
    if (JSON_MIN_INT..=JSON_MAX_INT).contains(&value) {
        Json::Number(value as f64)
    } else {
        Json::String(value.to_string())
    }
}

/// Project an unsigned integer, as a string when outside the exact range
pub fn json_uint(value: u64) -> Json {
    if value <= JSON_MAX_UINT {
        Json::Number(value as f64)
    } else {
        Json::String(value.to_string())
    }
}

/// Project bytes as standard base64
pub fn json_bytes(value: &[u8]) -> Json {
    Json::String(BASE64_STANDARD.encode(value))
}

impl Json {
    /// Name of the JSON kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Json::Null => "null",
            Json::Bool(_) => "bool",
            Json::Number(_) => "number",
            Json::String(_) => "string",
            Json::Array(_) => "array",
            Json::Object(_) => "object",
        }
    }

    /// Whether this is `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Json::Null)
    }

    /// The boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Json::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Json::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Json::String(s) => Some(s),
            _ => None,
        }
    }

    /// The array, if this is one
    pub fn as_array(&self) -> Option<&JsonArray> {
        match self {
            Json::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The object, if this is one
    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            Json::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Convert into a `serde_json` value
    ///
    /// Non-finite numbers have no JSON literal and become the strings
    /// `"NaN"`, `"Infinity"` and `"-Infinity"`.
    pub fn to_serde_json(&self) -> serde_json::Value {
        match self {
            Json::Null => serde_json::Value::Null,
            Json::Bool(b) => serde_json::Value::Bool(*b),
            Json::Number(n) => number_to_serde_json(*n),
            Json::String(s) => serde_json::Value::String(s.clone()),
            Json::Array(items) => {
                serde_json::Value::Array(items.iter().map(Json::to_serde_json).collect())
            }
            Json::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_serde_json()))
                    .collect(),
            ),
        }
    }

    /// Convert from a `serde_json` value
    pub fn from_serde_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Json::Null,
            serde_json::Value::Bool(b) => Json::Bool(b),
            serde_json::Value::Number(n) => Json::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Json::String(s),
            serde_json::Value::Array(items) => {
                Json::Array(items.into_iter().map(Json::from_serde_json).collect())
            }
            serde_json::Value::Object(fields) => Json::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Json::from_serde_json(v)))
                    .collect(),
            ),
        }
    }

    /// Encoded size as `google.protobuf.Value`
    pub fn get_serialized_size(&self) -> usize {
        json_value_size(self)
    }

    /// Append the `google.protobuf.Value` wire form to `buffer`
    pub fn serialize_to(&self, buffer: &mut BytesMut) {
        put_json_value(buffer, self);
    }

    /// Wrap the `google.protobuf.Value` wire form in an `Any`
    pub fn to_any(&self, prefix: &str) -> Any {
        let mut buffer = BytesMut::with_capacity(json_value_size(self));
        put_json_value(&mut buffer, self);
        Any::new(
            make_type_url_with_prefix(prefix, JSON_VALUE_TYPE_NAME),
            buffer.freeze(),
        )
    }
}

fn number_to_serde_json(n: f64) -> serde_json::Value {
    if n.is_nan() {
        return serde_json::Value::String("NaN".to_string());
    }
    if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return serde_json::Value::String(text.to_string());
    }
    // Integral values print without a trailing ".0"
    if n.fract() == 0.0 && n.abs() <= JSON_MAX_INT as f64 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl Serialize for Json {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_serde_json().serialize(serializer)
    }
}

impl fmt::Display for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_serde_json())
    }
}

impl From<bool> for Json {
    fn from(value: bool) -> Self {
        Json::Bool(value)
    }
}

impl From<f64> for Json {
    fn from(value: f64) -> Self {
        Json::Number(value)
    }
}

impl From<String> for Json {
    fn from(value: String) -> Self {
        Json::String(value)
    }
}

impl From<&str> for Json {
    fn from(value: &str) -> Self {
        Json::String(value.to_string())
    }
}

impl From<JsonArray> for Json {
    fn from(value: JsonArray) -> Self {
        Json::Array(value)
    }
}

impl From<JsonObject> for Json {
    fn from(value: JsonObject) -> Self {
        Json::Object(value)
    }
}

// google.protobuf.Value
const VALUE_NULL_TAG: WireTag = WireTag::new(1, WireType::Varint);
const VALUE_NUMBER_TAG: WireTag = WireTag::new(2, WireType::Fixed64);
const VALUE_STRING_TAG: WireTag = WireTag::new(3, WireType::LengthDelimited);
const VALUE_BOOL_TAG: WireTag = WireTag::new(4, WireType::Varint);
const VALUE_STRUCT_TAG: WireTag = WireTag::new(5, WireType::LengthDelimited);
const VALUE_LIST_TAG: WireTag = WireTag::new(6, WireType::LengthDelimited);
// google.protobuf.ListValue
const LIST_VALUES_TAG: WireTag = WireTag::new(1, WireType::LengthDelimited);
// google.protobuf.Struct and its map entry
const STRUCT_FIELDS_TAG: WireTag = WireTag::new(1, WireType::LengthDelimited);
const ENTRY_KEY_TAG: WireTag = WireTag::new(1, WireType::LengthDelimited);
const ENTRY_VALUE_TAG: WireTag = WireTag::new(2, WireType::LengthDelimited);

/// Encoded size of `json` as `google.protobuf.Value`
pub fn json_value_size(json: &Json) -> usize {
    match json {
        Json::Null => VALUE_NULL_TAG.encoded_len() + varint_size(0),
        Json::Bool(b) => VALUE_BOOL_TAG.encoded_len() + varint_size(u64::from(*b)),
        Json::Number(_) => VALUE_NUMBER_TAG.encoded_len() + 8,
        Json::String(s) => VALUE_STRING_TAG.encoded_len() + length_delimited_size(s.len()),
        Json::Array(items) => {
            VALUE_LIST_TAG.encoded_len() + length_delimited_size(json_array_size(items))
        }
        Json::Object(fields) => {
            VALUE_STRUCT_TAG.encoded_len() + length_delimited_size(json_object_size(fields))
        }
    }
}

/// Encoded size of `items` as `google.protobuf.ListValue`
pub fn json_array_size(items: &[Json]) -> usize {
    items
        .iter()
        .map(|item| LIST_VALUES_TAG.encoded_len() + length_delimited_size(json_value_size(item)))
        .sum()
}

/// Encoded size of `fields` as `google.protobuf.Struct`
pub fn json_object_size(fields: &JsonObject) -> usize {
    fields
        .iter()
        .map(|(key, value)| {
            STRUCT_FIELDS_TAG.encoded_len() + length_delimited_size(json_entry_size(key, value))
        })
        .sum()
}

fn json_entry_size(key: &str, value: &Json) -> usize {
    ENTRY_KEY_TAG.encoded_len()
        + length_delimited_size(key.len())
        + ENTRY_VALUE_TAG.encoded_len()
        + length_delimited_size(json_value_size(value))
}

/// Append `json` as `google.protobuf.Value`
pub fn put_json_value(buffer: &mut BytesMut, json: &Json) {
    match json {
        Json::Null => {
            put_tag(buffer, VALUE_NULL_TAG);
            put_varint(buffer, 0);
        }
        Json::Bool(b) => {
            put_tag(buffer, VALUE_BOOL_TAG);
            put_varint(buffer, u64::from(*b));
        }
        Json::Number(n) => {
            put_tag(buffer, VALUE_NUMBER_TAG);
            put_fixed64(buffer, n.to_bits());
        }
        Json::String(s) => {
            put_tag(buffer, VALUE_STRING_TAG);
            put_length_delimited(buffer, s.as_bytes());
        }
        Json::Array(items) => {
            put_tag(buffer, VALUE_LIST_TAG);
            put_varint(buffer, json_array_size(items) as u64);
            put_json_array(buffer, items);
        }
        Json::Object(fields) => {
            put_tag(buffer, VALUE_STRUCT_TAG);
            put_varint(buffer, json_object_size(fields) as u64);
            put_json_object(buffer, fields);
        }
    }
}

/// Append `items` as `google.protobuf.ListValue`
pub fn put_json_array(buffer: &mut BytesMut, items: &[Json]) {
    for item in items {
        put_tag(buffer, LIST_VALUES_TAG);
        put_varint(buffer, json_value_size(item) as u64);
        put_json_value(buffer, item);
    }
}

/// Append `fields` as `google.protobuf.Struct`
pub fn put_json_object(buffer: &mut BytesMut, fields: &JsonObject) {
    for (key, value) in fields {
        put_tag(buffer, STRUCT_FIELDS_TAG);
        put_varint(buffer, json_entry_size(key, value) as u64);
        put_tag(buffer, ENTRY_KEY_TAG);
        put_length_delimited(buffer, key.as_bytes());
        put_tag(buffer, ENTRY_VALUE_TAG);
        put_varint(buffer, json_value_size(value) as u64);
        put_json_value(buffer, value);
    }
}

/// Wrap `items` in an `Any` as `google.protobuf.ListValue`
pub fn json_array_to_any(items: &[Json], prefix: &str) -> Any {
    let mut buffer = BytesMut::with_capacity(json_array_size(items));
    put_json_array(&mut buffer, items);
    Any::new(
        make_type_url_with_prefix(prefix, JSON_LIST_TYPE_NAME),
        buffer.freeze(),
    )
}

/// Wrap `fields` in an `Any` as `google.protobuf.Struct`
pub fn json_object_to_any(fields: &JsonObject, prefix: &str) -> Any {
    let mut buffer = BytesMut::with_capacity(json_object_size(fields));
    put_json_object(&mut buffer, fields);
    Any::new(
        make_type_url_with_prefix(prefix, JSON_STRUCT_TYPE_NAME),
        buffer.freeze(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &Json) -> Vec<u8> {
        let mut buffer = BytesMut::new();
        put_json_value(&mut buffer, json);
        assert_eq!(buffer.len(), json_value_size(json));
        buffer.to_vec()
    }

    #[test]
    fn test_integer_projection_limits() {
        assert_eq!(json_int(JSON_MAX_INT), Json::Number(JSON_MAX_INT as f64));
        assert_eq!(json_int(JSON_MIN_INT), Json::Number(JSON_MIN_INT as f64));
        assert_eq!(
            json_int(JSON_MAX_INT + 1),
            Json::String("9007199254740992".to_string())
        );
        assert_eq!(json_int(i64::MIN), Json::String(i64::MIN.to_string()));
        assert_eq!(json_uint(JSON_MAX_UINT), Json::Number(JSON_MAX_UINT as f64));
        assert_eq!(json_uint(u64::MAX), Json::String(u64::MAX.to_string()));
    }

    #[test]
    fn test_bytes_projection() {
        assert_eq!(json_bytes(b"foo"), Json::String("Zm9v".to_string()));
        assert_eq!(json_bytes(b""), Json::String(String::new()));
    }

    #[test]
    fn test_value_wire_forms() {
        assert_eq!(encode(&Json::Null), vec![0x08, 0x00]);
        assert_eq!(encode(&Json::Bool(false)), vec![0x20, 0x00]);
        assert_eq!(encode(&Json::Bool(true)), vec![0x20, 0x01]);
        assert_eq!(encode(&Json::from("a")), vec![0x1a, 0x01, b'a']);
        let mut number = vec![0x11];
        number.extend_from_slice(&1.0f64.to_bits().to_le_bytes());
        assert_eq!(encode(&Json::Number(1.0)), number);
    }

    #[test]
    fn test_nested_wire_forms() {
        let array = Json::Array(vec![Json::Null]);
        // Value.list_value { values { null_value } }
        assert_eq!(encode(&array), vec![0x32, 0x04, 0x0a, 0x02, 0x08, 0x00]);

        let mut fields = JsonObject::new();
        fields.insert("k".to_string(), Json::Bool(true));
        let object = Json::Object(fields);
        // Value.struct_value { fields { key: "k" value { bool_value: true } } }
        assert_eq!(
            encode(&object),
            vec![0x2a, 0x09, 0x0a, 0x07, 0x0a, 0x01, b'k', 0x12, 0x02, 0x20, 0x01]
        );
    }

    #[test]
    fn test_any_wrappers() {
        let any = json_array_to_any(&[], "type.googleapis.com/");
        assert_eq!(any.type_url(), "type.googleapis.com/google.protobuf.ListValue");
        assert!(any.value().is_empty());
        let any = json_object_to_any(&JsonObject::new(), "type.googleapis.com");
        assert_eq!(any.type_url(), "type.googleapis.com/google.protobuf.Struct");
        let any = Json::Null.to_any("type.googleapis.com/");
        assert_eq!(any.type_url(), "type.googleapis.com/google.protobuf.Value");
        assert_eq!(any.value().as_ref(), &[0x08, 0x00]);
    }

    #[test]
    fn test_serde_json_conversion() {
        let mut fields = JsonObject::new();
        fields.insert("b".to_string(), Json::Number(1.0));
        fields.insert("a".to_string(), Json::Array(vec![Json::Number(1.5), Json::Null]));
        let json = Json::Object(fields);
        assert_eq!(json.to_string(), r#"{"b":1,"a":[1.5,null]}"#);
        assert_eq!(
            serde_json::to_string(&json).unwrap(),
            r#"{"b":1,"a":[1.5,null]}"#
        );
        assert_eq!(Json::from_serde_json(json.to_serde_json()), json);
    }

    #[test]
    fn test_non_finite_numbers() {
        assert_eq!(Json::Number(f64::NAN).to_string(), "\"NaN\"");
        assert_eq!(Json::Number(f64::INFINITY).to_string(), "\"Infinity\"");
        assert_eq!(Json::Number(f64::NEG_INFINITY).to_string(), "\"-Infinity\"");
    }
}
