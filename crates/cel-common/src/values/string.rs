//! String and bytes alternatives
//!
//! Owning values share their buffer, so cloning is a reference-count bump.
//! Views either borrow a plain slice or the buffer of an owning value; in
//! the second case [`StringValueView::to_owned_value`] shares instead of
//! copying.

use super::Serializable;
use crate::any::make_type_url_with_prefix;
use crate::json::{json_bytes, Json};
use crate::kind::ValueKind;
use crate::literal::{format_bytes_literal, format_string_literal};
use crate::types::Type;
use crate::ValueResult;
use bytes::{Bytes, BytesMut};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A `string` value sharing its UTF-8 buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringValue(Arc<str>);

impl Default for StringValue {
    fn default() -> Self {
        StringValue(Arc::from(""))
    }
}

impl StringValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::String;

    /// A string holding `value`
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        StringValue(value.into())
    }

    /// The text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the value as a view
    pub fn as_view(&self) -> StringValueView<'_> {
        StringValueView(StrRef::Shared(&self.0))
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::String
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format_string_literal(&self.0)
    }
}

impl Serializable for StringValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        self.as_view().get_serialized_size()
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        self.as_view().serialize_to(buffer)
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        self.as_view().get_type_url(prefix)
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        self.as_view().convert_to_json()
    }
}

#[derive(Debug, Clone, Copy)]
enum StrRef<'a> {
    Borrowed(&'a str),
    Shared(&'a Arc<str>),
}

/// A borrowed string
#[derive(Debug, Clone, Copy)]
pub struct StringValueView<'a>(StrRef<'a>);

impl Default for StringValueView<'_> {
    fn default() -> Self {
        StringValueView(StrRef::Borrowed(""))
    }
}

impl<'a> StringValueView<'a> {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::String;

    /// View `value`
    pub const fn new(value: &'a str) -> Self {
        StringValueView(StrRef::Borrowed(value))
    }

    /// The text, with the view's lifetime
    pub fn as_str(&self) -> &'a str {
        match self.0 {
            StrRef::Borrowed(s) => s,
            StrRef::Shared(s) => &**s,
        }
    }

    /// Take ownership, sharing the buffer when the view came from a value
    pub fn to_owned_value(&self) -> StringValue {
        match self.0 {
            StrRef::Borrowed(s) => StringValue::new(s),
            StrRef::Shared(s) => StringValue(Arc::clone(s)),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Whether the string is empty
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::String
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format_string_literal(self.as_str())
    }
}

impl Serializable for StringValueView<'_> {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Ok(cel_wire::string_value_size(self.as_str()))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        cel_wire::put_string_value(buffer, self.as_str());
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.StringValue"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(Json::String(self.as_str().to_string()))
    }
}

impl PartialEq for StringValueView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for StringValueView<'_> {}

impl PartialOrd for StringValueView<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringValueView<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for StringValueView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

/// A `bytes` value sharing its buffer
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BytesValue(Bytes);

impl BytesValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Bytes;

    /// A bytes value holding `value`
    pub fn new(value: impl Into<Bytes>) -> Self {
        BytesValue(value.into())
    }

    /// The bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The underlying native value
    pub fn native_value(&self) -> &Bytes {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the value as a view
    pub fn as_view(&self) -> BytesValueView<'_> {
        BytesValueView(BytesRef::Shared(&self.0))
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Bytes
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format_bytes_literal(&self.0)
    }
}

impl Serializable for BytesValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        self.as_view().get_serialized_size()
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        self.as_view().serialize_to(buffer)
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        self.as_view().get_type_url(prefix)
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        self.as_view().convert_to_json()
    }
}

#[derive(Debug, Clone, Copy)]
enum BytesRef<'a> {
    Borrowed(&'a [u8]),
    Shared(&'a Bytes),
}

/// A borrowed byte string
#[derive(Debug, Clone, Copy)]
pub struct BytesValueView<'a>(BytesRef<'a>);

impl Default for BytesValueView<'_> {
    fn default() -> Self {
        BytesValueView(BytesRef::Borrowed(&[]))
    }
}

impl<'a> BytesValueView<'a> {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Bytes;

    /// View `value`
    pub const fn new(value: &'a [u8]) -> Self {
        BytesValueView(BytesRef::Borrowed(value))
    }

    /// The bytes, with the view's lifetime
    pub fn as_bytes(&self) -> &'a [u8] {
        match self.0 {
            BytesRef::Borrowed(b) => b,
            BytesRef::Shared(b) => &**b,
        }
    }

    /// Take ownership, sharing the buffer when the view came from a value
    pub fn to_owned_value(&self) -> BytesValue {
        match self.0 {
            BytesRef::Borrowed(b) => BytesValue(Bytes::copy_from_slice(b)),
            BytesRef::Shared(b) => BytesValue(b.clone()),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Bytes
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        format_bytes_literal(self.as_bytes())
    }
}

impl Serializable for BytesValueView<'_> {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Ok(cel_wire::bytes_value_size(self.as_bytes()))
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        cel_wire::put_bytes_value(buffer, self.as_bytes());
        Ok(())
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, "google.protobuf.BytesValue"))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Ok(json_bytes(self.as_bytes()))
    }
}

impl PartialEq for BytesValueView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for BytesValueView<'_> {}

impl PartialOrd for BytesValueView<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BytesValueView<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for BytesValueView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl fmt::Display for StringValueView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl fmt::Display for BytesValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl fmt::Display for BytesValueView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl From<&str> for StringValue {
    fn from(value: &str) -> Self {
        StringValue::new(value)
    }
}

impl From<String> for StringValue {
    fn from(value: String) -> Self {
        StringValue::new(value)
    }
}

impl<'a> From<&'a StringValue> for StringValueView<'a> {
    fn from(value: &'a StringValue) -> Self {
        value.as_view()
    }
}

impl From<StringValueView<'_>> for StringValue {
    fn from(view: StringValueView<'_>) -> Self {
        view.to_owned_value()
    }
}

impl From<&[u8]> for BytesValue {
    fn from(value: &[u8]) -> Self {
        BytesValue(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for BytesValue {
    fn from(value: Vec<u8>) -> Self {
        BytesValue(Bytes::from(value))
    }
}

impl<'a> From<&'a BytesValue> for BytesValueView<'a> {
    fn from(value: &'a BytesValue) -> Self {
        value.as_view()
    }
}

impl From<BytesValueView<'_>> for BytesValue {
    fn from(view: BytesValueView<'_>) -> Self {
        view.to_owned_value()
    }
}

impl PartialEq<str> for StringValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for StringValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<&str> for StringValueView<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_shares_owned_buffer() {
        let value = StringValue::new("shared");
        let owned = value.as_view().to_owned_value();
        assert!(Arc::ptr_eq(&value.0, &owned.0));

        let literal = StringValueView::new("literal");
        assert_eq!(literal.to_owned_value(), "literal");
    }

    #[test]
    fn test_string_wire_and_json() {
        let value = StringValue::new("a");
        assert_eq!(value.serialize().unwrap().as_ref(), &[0x0a, 0x01, b'a']);
        assert!(StringValue::default().serialize().unwrap().is_empty());
        assert_eq!(value.convert_to_json().unwrap(), Json::String("a".to_string()));
        assert_eq!(value.debug_string(), "\"a\"");
    }

    #[test]
    fn test_bytes_wire_and_json() {
        let value = BytesValue::new(Bytes::from_static(b"foo"));
        assert_eq!(value.serialize().unwrap().as_ref(), &[0x0a, 0x03, b'f', b'o', b'o']);
        assert_eq!(value.convert_to_json().unwrap(), Json::String("Zm9v".to_string()));
        assert_eq!(value.debug_string(), "b\"foo\"");
        assert_eq!(
            value.get_type_url("type.googleapis.com/").unwrap(),
            "type.googleapis.com/google.protobuf.BytesValue"
        );
    }

    #[test]
    fn test_view_ordering() {
        assert!(StringValueView::new("a") < StringValueView::new("b"));
        assert_eq!(StringValue::new("x").as_view(), StringValueView::new("x"));
        assert!(BytesValueView::new(b"\x00") < BytesValueView::new(b"\x01"));
    }
}
