//! Values: the owning [`Value`] and the borrowing [`ValueView`]
//!
//! A `Value` owns its payload. Scalars (null, bool, int, uint, double,
//! duration, timestamp) are stored inline; strings and bytes are shared
//! buffers; lists, maps, opaques and structs are shared trait objects, so
//! cloning any value is cheap and never deep-copies.
//!
//! A `ValueView<'a>` has the same alternatives but borrows from a live
//! value (or, for strings and bytes, from any buffer). Views are `Copy` and
//! are the currency of callbacks and lookups; [`ValueView::to_value`] turns
//! a view back into an owning value by sharing, not copying, its payload.

mod compare;
mod error;
mod list;
mod map;
mod opaque;
mod optional;
mod scalars;
mod string;
mod structs;
mod type_value;
mod unknown;

pub use error::{ErrorValue, ErrorValueView};
pub use list::{
    ListValue, ListValueBuilder, ListValueInterface, ListValueIterator, ListValueView,
    ValueIterator,
};
pub use map::{check_key, MapValue, MapValueBuilder, MapValueInterface, MapValueView};
pub use opaque::{OpaqueValue, OpaqueValueInterface, OpaqueValueView};
pub use optional::{OptionalValue, OptionalValueView};
pub use scalars::{
    BoolValue, DoubleValue, DurationValue, IntValue, NullValue, TimestampValue, UintValue,
};
pub use string::{BytesValue, BytesValueView, StringValue, StringValueView};
pub use structs::{StructValue, StructValueInterface, StructValueView};
pub use type_value::{TypeValue, TypeValueView};
pub use unknown::{AttributeTrail, FunctionResult, UnknownValue, UnknownValueView};

pub(crate) use list::{EmptyList, ValueList};
pub(crate) use map::EmptyMap;

use crate::any::Any;
use crate::json::Json;
use crate::kind::ValueKind;
use crate::types::Type;
use crate::ValueResult;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Conversion of a value to its external forms
///
/// Every value alternative serializes as the protobuf message that
/// represents it (`google.protobuf.Int64Value` for ints, `ListValue` for
/// lists and so on), and projects to JSON. Diagnostic alternatives (errors,
/// unknowns and types) fail every entry point with `FailedPrecondition`.
pub trait Serializable {
    /// Exact number of bytes `serialize_to` appends
    fn get_serialized_size(&self) -> ValueResult<usize>;

    /// Append the wire form of the value to `buffer`
    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()>;

    /// The wire form of the value in a fresh buffer
    fn serialize(&self) -> ValueResult<Bytes> {
        let capacity = self.get_serialized_size().unwrap_or_default();
        let mut buffer = BytesMut::with_capacity(capacity);
        self.serialize_to(&mut buffer)?;
        Ok(buffer.freeze())
    }

    /// Type URL of the message the value serializes as
    fn get_type_url(&self, prefix: &str) -> ValueResult<String>;

    /// The value wrapped in a `google.protobuf.Any`
    fn convert_to_any(&self, prefix: &str) -> ValueResult<Any> {
        let type_url = self.get_type_url(prefix)?;
        let value = self.serialize()?;
        Ok(Any::new(type_url, value))
    }

    /// The JSON projection of the value
    fn convert_to_json(&self) -> ValueResult<Json>;
}

/// Generates a `Copy` view that borrows an owning value handle
///
/// The view dereferences to the handle, so every read operation of the
/// handle is available on the view.
macro_rules! borrowed_view {
    ($(#[$meta:meta])* $view:ident => $owned:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $view<'a>(&'a $owned);

        impl<'a> $view<'a> {
            /// View `value`
            pub fn new(value: &'a $owned) -> Self {
                $view(value)
            }

            /// The viewed handle, with the view's lifetime
            pub fn inner(self) -> &'a $owned {
                self.0
            }

            /// Share ownership of the viewed value
            pub fn to_owned_value(self) -> $owned {
                self.0.clone()
            }
        }

        impl std::ops::Deref for $view<'_> {
            type Target = $owned;

            fn deref(&self) -> &$owned {
                self.0
            }
        }

        impl<'a> From<&'a $owned> for $view<'a> {
            fn from(value: &'a $owned) -> Self {
                $view(value)
            }
        }

        impl From<$view<'_>> for $owned {
            fn from(view: $view<'_>) -> Self {
                view.to_owned_value()
            }
        }
    };
}

pub(crate) use borrowed_view;

/// An owning CEL value
#[derive(Debug, Clone)]
pub enum Value {
    /// `null`
    Null(NullValue),
    /// `bool`
    Bool(BoolValue),
    /// `int`
    Int(IntValue),
    /// `uint`
    Uint(UintValue),
    /// `double`
    Double(DoubleValue),
    /// `google.protobuf.Duration`
    Duration(DurationValue),
    /// `google.protobuf.Timestamp`
    Timestamp(TimestampValue),
    /// `string`
    String(StringValue),
    /// `bytes`
    Bytes(BytesValue),
    /// An error carried as a value
    Error(ErrorValue),
    /// Unknown attributes and function results
    Unknown(UnknownValue),
    /// A type carried as a value
    Type(TypeValue),
    /// `list`
    List(ListValue),
    /// `map`
    Map(MapValue),
    /// Host data, optionals included
    Opaque(OpaqueValue),
    /// A message-like value with named fields
    Struct(StructValue),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null(NullValue)
    }
}

impl Value {
    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        self.as_view().kind()
    }

    /// The runtime type of the value
    pub fn get_type(&self) -> Type {
        self.as_view().get_type()
    }

    /// Borrow the value as a view
    pub fn as_view(&self) -> ValueView<'_> {
        match self {
            Value::Null(v) => ValueView::Null(*v),
            Value::Bool(v) => ValueView::Bool(*v),
            Value::Int(v) => ValueView::Int(*v),
            Value::Uint(v) => ValueView::Uint(*v),
            Value::Double(v) => ValueView::Double(*v),
            Value::Duration(v) => ValueView::Duration(*v),
            Value::Timestamp(v) => ValueView::Timestamp(*v),
            Value::String(v) => ValueView::String(v.as_view()),
            Value::Bytes(v) => ValueView::Bytes(v.as_view()),
            Value::Error(v) => ValueView::Error(ErrorValueView::new(v)),
            Value::Unknown(v) => ValueView::Unknown(UnknownValueView::new(v)),
            Value::Type(v) => ValueView::Type(TypeValueView::new(v)),
            Value::List(v) => ValueView::List(ListValueView::new(v)),
            Value::Map(v) => ValueView::Map(MapValueView::new(v)),
            Value::Opaque(v) => ValueView::Opaque(OpaqueValueView::new(v)),
            Value::Struct(v) => ValueView::Struct(StructValueView::new(v)),
        }
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.as_view().debug_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl Serializable for Value {
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

/// A borrowed CEL value
#[derive(Debug, Clone, Copy)]
pub enum ValueView<'a> {
    /// `null`
    Null(NullValue),
    /// `bool`
    Bool(BoolValue),
    /// `int`
    Int(IntValue),
    /// `uint`
    Uint(UintValue),
    /// `double`
    Double(DoubleValue),
    /// `google.protobuf.Duration`
    Duration(DurationValue),
    /// `google.protobuf.Timestamp`
    Timestamp(TimestampValue),
    /// `string`
    String(StringValueView<'a>),
    /// `bytes`
    Bytes(BytesValueView<'a>),
    /// An error carried as a value
    Error(ErrorValueView<'a>),
    /// Unknown attributes and function results
    Unknown(UnknownValueView<'a>),
    /// A type carried as a value
    Type(TypeValueView<'a>),
    /// `list`
    List(ListValueView<'a>),
    /// `map`
    Map(MapValueView<'a>),
    /// Host data, optionals included
    Opaque(OpaqueValueView<'a>),
    /// A message-like value with named fields
    Struct(StructValueView<'a>),
}

impl Default for ValueView<'_> {
    fn default() -> Self {
        ValueView::Null(NullValue)
    }
}

impl<'a> ValueView<'a> {
    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueView::Null(_) => ValueKind::Null,
            ValueView::Bool(_) => ValueKind::Bool,
            ValueView::Int(_) => ValueKind::Int,
            ValueView::Uint(_) => ValueKind::Uint,
            ValueView::Double(_) => ValueKind::Double,
            ValueView::Duration(_) => ValueKind::Duration,
            ValueView::Timestamp(_) => ValueKind::Timestamp,
            ValueView::String(_) => ValueKind::String,
            ValueView::Bytes(_) => ValueKind::Bytes,
            ValueView::Error(_) => ValueKind::Error,
            ValueView::Unknown(_) => ValueKind::Unknown,
            ValueView::Type(_) => ValueKind::Type,
            ValueView::List(_) => ValueKind::List,
            ValueView::Map(_) => ValueKind::Map,
            ValueView::Opaque(_) => ValueKind::Opaque,
            ValueView::Struct(_) => ValueKind::Struct,
        }
    }

    /// The runtime type of the viewed value
    pub fn get_type(&self) -> Type {
        match self {
            ValueView::Null(_) => Type::Null,
            ValueView::Bool(_) => Type::Bool,
            ValueView::Int(_) => Type::Int,
            ValueView::Uint(_) => Type::Uint,
            ValueView::Double(_) => Type::Double,
            ValueView::Duration(_) => Type::Duration,
            ValueView::Timestamp(_) => Type::Timestamp,
            ValueView::String(_) => Type::String,
            ValueView::Bytes(_) => Type::Bytes,
            ValueView::Error(_) => Type::Error,
            ValueView::Unknown(_) => Type::Unknown,
            ValueView::Type(_) => Type::Type,
            ValueView::List(v) => Type::List(v.get_type()),
            ValueView::Map(v) => Type::Map(v.get_type()),
            ValueView::Opaque(v) => Type::Opaque(v.get_type()),
            ValueView::Struct(v) => Type::Struct(v.get_type()),
        }
    }

    /// Take ownership of the viewed value, sharing its payload
    pub fn to_value(self) -> Value {
        match self {
            ValueView::Null(v) => Value::Null(v),
            ValueView::Bool(v) => Value::Bool(v),
            ValueView::Int(v) => Value::Int(v),
            ValueView::Uint(v) => Value::Uint(v),
            ValueView::Double(v) => Value::Double(v),
            ValueView::Duration(v) => Value::Duration(v),
            ValueView::Timestamp(v) => Value::Timestamp(v),
            ValueView::String(v) => Value::String(v.to_owned_value()),
            ValueView::Bytes(v) => Value::Bytes(v.to_owned_value()),
            ValueView::Error(v) => Value::Error(v.to_owned_value()),
            ValueView::Unknown(v) => Value::Unknown(v.to_owned_value()),
            ValueView::Type(v) => Value::Type(v.to_owned_value()),
            ValueView::List(v) => Value::List(v.to_owned_value()),
            ValueView::Map(v) => Value::Map(v.to_owned_value()),
            ValueView::Opaque(v) => Value::Opaque(v.to_owned_value()),
            ValueView::Struct(v) => Value::Struct(v.to_owned_value()),
        }
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        match self {
            ValueView::Null(v) => v.debug_string(),
            ValueView::Bool(v) => v.debug_string(),
            ValueView::Int(v) => v.debug_string(),
            ValueView::Uint(v) => v.debug_string(),
            ValueView::Double(v) => v.debug_string(),
            ValueView::Duration(v) => v.debug_string(),
            ValueView::Timestamp(v) => v.debug_string(),
            ValueView::String(v) => v.debug_string(),
            ValueView::Bytes(v) => v.debug_string(),
            ValueView::Error(v) => v.debug_string(),
            ValueView::Unknown(v) => v.debug_string(),
            ValueView::Type(v) => v.debug_string(),
            ValueView::List(v) => v.debug_string(),
            ValueView::Map(v) => v.debug_string(),
            ValueView::Opaque(v) => v.debug_string(),
            ValueView::Struct(v) => v.debug_string(),
        }
    }

    fn as_serializable(&self) -> &dyn Serializable {
        match self {
            ValueView::Null(v) => v,
            ValueView::Bool(v) => v,
            ValueView::Int(v) => v,
            ValueView::Uint(v) => v,
            ValueView::Double(v) => v,
            ValueView::Duration(v) => v,
            ValueView::Timestamp(v) => v,
            ValueView::String(v) => v,
            ValueView::Bytes(v) => v,
            ValueView::Error(v) => v.inner(),
            ValueView::Unknown(v) => v.inner(),
            ValueView::Type(v) => v.inner(),
            ValueView::List(v) => v.inner(),
            ValueView::Map(v) => v.inner(),
            ValueView::Opaque(v) => v.inner(),
            ValueView::Struct(v) => v.inner(),
        }
    }
}

impl fmt::Display for ValueView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl Serializable for ValueView<'_> {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        self.as_serializable().get_serialized_size()
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        self.as_serializable().serialize_to(buffer)
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        self.as_serializable().get_type_url(prefix)
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        self.as_serializable().convert_to_json()
    }
}

impl<'a> From<&'a Value> for ValueView<'a> {
    fn from(value: &'a Value) -> Self {
        value.as_view()
    }
}

impl From<ValueView<'_>> for Value {
    fn from(view: ValueView<'_>) -> Self {
        view.to_value()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(BoolValue::new(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(IntValue::new(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint(UintValue::new(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(DoubleValue::new(value))
    }
}

impl From<TimeDelta> for Value {
    fn from(value: TimeDelta) -> Self {
        Value::Duration(DurationValue::new(value))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(TimestampValue::new(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(StringValue::new(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(StringValue::new(value))
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(BytesValue::new(value))
    }
}

impl From<Type> for Value {
    fn from(value: Type) -> Self {
        Value::Type(TypeValue::new(value))
    }
}

impl From<bool> for ValueView<'_> {
    fn from(value: bool) -> Self {
        ValueView::Bool(BoolValue::new(value))
    }
}

impl From<i64> for ValueView<'_> {
    fn from(value: i64) -> Self {
        ValueView::Int(IntValue::new(value))
    }
}

impl From<u64> for ValueView<'_> {
    fn from(value: u64) -> Self {
        ValueView::Uint(UintValue::new(value))
    }
}

impl From<f64> for ValueView<'_> {
    fn from(value: f64) -> Self {
        ValueView::Double(DoubleValue::new(value))
    }
}

impl<'a> From<&'a str> for ValueView<'a> {
    fn from(value: &'a str) -> Self {
        ValueView::String(StringValueView::new(value))
    }
}

impl<'a> From<&'a [u8]> for ValueView<'a> {
    fn from(value: &'a [u8]) -> Self {
        ValueView::Bytes(BytesValueView::new(value))
    }
}

/// Generates `From<alternative>` for [`Value`]
macro_rules! value_from_alternative {
    ($($variant:ident($alternative:ty)),* $(,)?) => {
        $(
            impl From<$alternative> for Value {
                fn from(value: $alternative) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from_alternative!(
    Null(NullValue),
    Bool(BoolValue),
    Int(IntValue),
    Uint(UintValue),
    Double(DoubleValue),
    Duration(DurationValue),
    Timestamp(TimestampValue),
    String(StringValue),
    Bytes(BytesValue),
    Error(ErrorValue),
    Unknown(UnknownValue),
    Type(TypeValue),
    List(ListValue),
    Map(MapValue),
    Opaque(OpaqueValue),
    Struct(StructValue),
);
