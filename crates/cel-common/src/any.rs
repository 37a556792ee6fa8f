//! The `google.protobuf.Any` envelope

use crate::literal::{format_bytes_literal, format_string_literal};
use bytes::{Bytes, BytesMut};
use std::fmt;

/// Default type URL prefix for well-known and user message types
pub const TYPE_GOOGLE_APIS_COM_PREFIX: &str = "type.googleapis.com/";

/// Build a type URL from a prefix and a fully qualified type name
///
/// A trailing `/` on the prefix is optional; exactly one separator ends up
/// between the two parts.
pub fn make_type_url_with_prefix(prefix: &str, type_name: &str) -> String {
    let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
    format!("{prefix}/{type_name}")
}

/// Build a type URL under [`TYPE_GOOGLE_APIS_COM_PREFIX`]
pub fn make_type_url(type_name: &str) -> String {
    make_type_url_with_prefix(TYPE_GOOGLE_APIS_COM_PREFIX, type_name)
}

/// A serialized message together with the URL naming its type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Any {
    type_url: String,
    value: Bytes,
}

impl Any {
    /// An envelope holding `value` serialized as `type_url`
    pub fn new(type_url: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Any {
            type_url: type_url.into(),
            value: value.into(),
        }
    }

    /// The type URL of the payload
    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    /// The serialized payload
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Replace the type URL
    pub fn set_type_url(&mut self, type_url: impl Into<String>) {
        self.type_url = type_url.into();
    }

    /// Replace the payload
    pub fn set_value(&mut self, value: impl Into<Bytes>) {
        self.value = value.into();
    }

    /// Release the type URL and payload
    pub fn into_parts(self) -> (String, Bytes) {
        (self.type_url, self.value)
    }

    /// Type URL and payload size, for diagnostics
    pub fn debug_string(&self) -> String {
        format!(
            "google.protobuf.Any{{type_url: {}, value: {}}}",
            format_string_literal(&self.type_url),
            format_bytes_literal(&self.value)
        )
    }

    /// Encoded size of the envelope itself
    pub fn get_serialized_size(&self) -> usize {
        cel_wire::any_size(&self.type_url, &self.value)
    }

    /// Append the envelope's wire form to `buffer`
    pub fn serialize_to(&self, buffer: &mut BytesMut) {
        cel_wire::put_any(buffer, &self.type_url, &self.value);
    }
}

impl fmt::Display for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_url_separator() {
        assert_eq!(
            make_type_url("google.protobuf.BoolValue"),
            "type.googleapis.com/google.protobuf.BoolValue"
        );
        assert_eq!(
            make_type_url_with_prefix("type.googleapis.com", "google.protobuf.Int64Value"),
            "type.googleapis.com/google.protobuf.Int64Value"
        );
        assert_eq!(
            make_type_url_with_prefix("example.com/types/", "my.Message"),
            "example.com/types/my.Message"
        );
    }

    #[test]
    fn test_any_accessors() {
        let mut any = Any::new("type.googleapis.com/google.protobuf.BoolValue", vec![0x08, 0x01]);
        assert_eq!(any.value().as_ref(), &[0x08, 0x01]);
        any.set_value(Bytes::new());
        assert!(any.value().is_empty());
        let (url, _) = any.into_parts();
        assert_eq!(url, "type.googleapis.com/google.protobuf.BoolValue");
    }

    #[test]
    fn test_any_debug_string() {
        let any = Any::new("type.googleapis.com/google.protobuf.StringValue", Bytes::from_static(b"\x0a\x01a"));
        assert_eq!(
            any.debug_string(),
            "google.protobuf.Any{type_url: \"type.googleapis.com/google.protobuf.StringValue\", value: b\"\\n\\x01a\"}"
        );
    }

    #[test]
    fn test_any_wire_form() {
        let any = Any::new("a/b", vec![0x08, 0x01]);
        let mut buffer = BytesMut::new();
        any.serialize_to(&mut buffer);
        assert_eq!(buffer.len(), any.get_serialized_size());
        assert_eq!(&buffer[..], &[0x0a, 0x03, b'a', b'/', b'b', 0x12, 0x02, 0x08, 0x01]);
    }
}
