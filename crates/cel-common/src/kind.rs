//! Kind tags and runtime type identity
//!
//! [`ValueKind`] identifies which alternative a value holds and [`TypeKind`]
//! which alternative a type holds. Both are closed. Extension kinds (list,
//! map, opaque, struct) additionally carry a [`NativeTypeId`] naming the
//! concrete implementation behind them.

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Which alternative a value holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    /// `null`
    Null,
    /// `bool`
    Bool,
    /// `int`, a signed 64-bit integer
    Int,
    /// `uint`, an unsigned 64-bit integer
    Uint,
    /// `double`
    Double,
    /// `string`, UTF-8 text
    String,
    /// `bytes`
    Bytes,
    /// A message-like value with named fields
    Struct,
    /// `google.protobuf.Duration`
    Duration,
    /// `google.protobuf.Timestamp`
    Timestamp,
    /// `list`
    List,
    /// `map`
    Map,
    /// A set of unknown attributes and function results
    Unknown,
    /// A type used as a value
    Type,
    /// An error used as a value
    Error,
    /// Host data opaque to the language
    Opaque,
}

impl ValueKind {
    /// Human readable name, as used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null_type",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Uint => "uint",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Struct => "struct",
            ValueKind::Duration => "google.protobuf.Duration",
            ValueKind::Timestamp => "google.protobuf.Timestamp",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Unknown => "*unknown*",
            ValueKind::Type => "type",
            ValueKind::Error => "*error*",
            ValueKind::Opaque => "*opaque*",
        }
    }

    /// Whether the payload of this kind is an open, shared implementation
    pub const fn is_extension(self) -> bool {
        matches!(
            self,
            ValueKind::List | ValueKind::Map | ValueKind::Opaque | ValueKind::Struct
        )
    }

    /// Whether the payload of this kind is stored inline
    pub const fn is_inline(self) -> bool {
        matches!(
            self,
            ValueKind::Null
                | ValueKind::Bool
                | ValueKind::Int
                | ValueKind::Uint
                | ValueKind::Double
                | ValueKind::Duration
                | ValueKind::Timestamp
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which alternative a type holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeKind {
    /// `null_type`
    Null,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `uint`
    Uint,
    /// `double`
    Double,
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// A named message type
    Struct,
    /// `google.protobuf.Duration`
    Duration,
    /// `google.protobuf.Timestamp`
    Timestamp,
    /// `list(E)`
    List,
    /// `map(K, V)`
    Map,
    /// The type of unknown values
    Unknown,
    /// `type`
    Type,
    /// The type of error values
    Error,
    /// `google.protobuf.Any`
    Any,
    /// `dyn`, statically unknown
    Dyn,
    /// A named opaque type with parameters
    Opaque,
    /// `google.protobuf.BoolValue`
    BoolWrapper,
    /// `google.protobuf.Int64Value`
    IntWrapper,
    /// `google.protobuf.UInt64Value`
    UintWrapper,
    /// `google.protobuf.DoubleValue`
    DoubleWrapper,
    /// `google.protobuf.StringValue`
    StringWrapper,
    /// `google.protobuf.BytesValue`
    BytesWrapper,
}

impl TypeKind {
    /// Human readable name, as used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            TypeKind::Null => "null_type",
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Uint => "uint",
            TypeKind::Double => "double",
            TypeKind::String => "string",
            TypeKind::Bytes => "bytes",
            TypeKind::Struct => "struct",
            TypeKind::Duration => "google.protobuf.Duration",
            TypeKind::Timestamp => "google.protobuf.Timestamp",
            TypeKind::List => "list",
            TypeKind::Map => "map",
            TypeKind::Unknown => "*unknown*",
            TypeKind::Type => "type",
            TypeKind::Error => "*error*",
            TypeKind::Any => "google.protobuf.Any",
            TypeKind::Dyn => "dyn",
            TypeKind::Opaque => "*opaque*",
            TypeKind::BoolWrapper => "google.protobuf.BoolValue",
            TypeKind::IntWrapper => "google.protobuf.Int64Value",
            TypeKind::UintWrapper => "google.protobuf.UInt64Value",
            TypeKind::DoubleWrapper => "google.protobuf.DoubleValue",
            TypeKind::StringWrapper => "google.protobuf.StringValue",
            TypeKind::BytesWrapper => "google.protobuf.BytesValue",
        }
    }

    /// The value kind a value of this type has, when it is fixed
    ///
    /// `dyn` and `google.protobuf.Any` can hold any kind and wrapper types
    /// can hold either their primitive or null, so these return `None`.
    pub const fn value_kind(self) -> Option<ValueKind> {
        match self {
            TypeKind::Null => Some(ValueKind::Null),
            TypeKind::Bool => Some(ValueKind::Bool),
            TypeKind::Int => Some(ValueKind::Int),
            TypeKind::Uint => Some(ValueKind::Uint),
            TypeKind::Double => Some(ValueKind::Double),
            TypeKind::String => Some(ValueKind::String),
            TypeKind::Bytes => Some(ValueKind::Bytes),
            TypeKind::Struct => Some(ValueKind::Struct),
            TypeKind::Duration => Some(ValueKind::Duration),
            TypeKind::Timestamp => Some(ValueKind::Timestamp),
            TypeKind::List => Some(ValueKind::List),
            TypeKind::Map => Some(ValueKind::Map),
            TypeKind::Unknown => Some(ValueKind::Unknown),
            TypeKind::Type => Some(ValueKind::Type),
            TypeKind::Error => Some(ValueKind::Error),
            TypeKind::Opaque => Some(ValueKind::Opaque),
            TypeKind::Any
            | TypeKind::Dyn
            | TypeKind::BoolWrapper
            | TypeKind::IntWrapper
            | TypeKind::UintWrapper
            | TypeKind::DoubleWrapper
            | TypeKind::StringWrapper
            | TypeKind::BytesWrapper => None,
        }
    }
}

impl From<ValueKind> for TypeKind {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Null => TypeKind::Null,
            ValueKind::Bool => TypeKind::Bool,
            ValueKind::Int => TypeKind::Int,
            ValueKind::Uint => TypeKind::Uint,
            ValueKind::Double => TypeKind::Double,
            ValueKind::String => TypeKind::String,
            ValueKind::Bytes => TypeKind::Bytes,
            ValueKind::Struct => TypeKind::Struct,
            ValueKind::Duration => TypeKind::Duration,
            ValueKind::Timestamp => TypeKind::Timestamp,
            ValueKind::List => TypeKind::List,
            ValueKind::Map => TypeKind::Map,
            ValueKind::Unknown => TypeKind::Unknown,
            ValueKind::Type => TypeKind::Type,
            ValueKind::Error => TypeKind::Error,
            ValueKind::Opaque => TypeKind::Opaque,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a concrete Rust type behind an extension value
///
/// Compared by the underlying [`TypeId`], so two ids are equal exactly when
/// they denote the same implementation. The type name is kept for display
/// only.
#[derive(Clone, Copy)]
pub struct NativeTypeId {
    id: TypeId,
    name: &'static str,
}

impl NativeTypeId {
    /// Identity of `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        NativeTypeId {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Name of the type, for diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for NativeTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NativeTypeId {}

impl Hash for NativeTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for NativeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeTypeId({})", self.name)
    }
}

impl fmt::Display for NativeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct First;
    struct Second;

    #[test]
    fn test_native_type_id_identity() {
        assert_eq!(NativeTypeId::of::<First>(), NativeTypeId::of::<First>());
        assert_ne!(NativeTypeId::of::<First>(), NativeTypeId::of::<Second>());
        assert!(NativeTypeId::of::<First>().name().ends_with("First"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ValueKind::Bool.to_string(), "bool");
        assert_eq!(ValueKind::Error.to_string(), "*error*");
        assert_eq!(TypeKind::BoolWrapper.name(), "google.protobuf.BoolValue");
        assert_eq!(TypeKind::from(ValueKind::Map), TypeKind::Map);
        assert_eq!(TypeKind::Dyn.value_kind(), None);
        assert_eq!(TypeKind::List.value_kind(), Some(ValueKind::List));
    }

    #[test]
    fn test_kind_storage_classes() {
        assert!(ValueKind::List.is_extension());
        assert!(ValueKind::Struct.is_extension());
        assert!(!ValueKind::String.is_extension());
        assert!(ValueKind::Timestamp.is_inline());
        assert!(!ValueKind::Bytes.is_inline());
    }
}
