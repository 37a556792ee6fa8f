//! Opaque values
//!
//! Opaque values carry host data the language cannot look inside. They have
//! a type and a debug string, compare by identity unless the implementation
//! says otherwise, and cannot be serialized.

use super::{borrowed_view, Serializable};
use crate::json::Json;
use crate::kind::{NativeTypeId, ValueKind};
use crate::types::OpaqueType;
use crate::{ValueError, ValueResult};
use bytes::BytesMut;
use std::any::Any;
use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

/// Behaviour of an opaque implementation
pub trait OpaqueValueInterface: Any + Send + Sync + fmt::Debug {
    /// The type of the value
    fn get_type(&self) -> OpaqueType;

    /// Rendering for diagnostics
    fn debug_string(&self) -> String;

    /// Whether `other` denotes the same value; identity by default
    ///
    /// Only called with an `other` of the same native type.
    fn equals(&self, other: &dyn OpaqueValueInterface) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const _)
    }

    /// Feed `state` the parts of the value `equals` looks at
    ///
    /// Values that are `equals` must feed the same data. The default feeds
    /// nothing, which agrees with any `equals`.
    fn hash_contents(&self, _state: &mut dyn Hasher) {}

    /// Identity of the implementation type
    fn native_type_id(&self) -> NativeTypeId {
        NativeTypeId::of::<Self>()
    }

    /// Exact number of bytes `serialize_to` appends
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Err(ValueError::unserializable(self.get_type().name()))
    }

    /// Append the wire form of the value to `buffer`
    fn serialize_to(&self, _buffer: &mut BytesMut) -> ValueResult<()> {
        Err(ValueError::unserializable(self.get_type().name()))
    }

    /// Type URL of the message the value serializes as
    fn get_type_url(&self, _prefix: &str) -> ValueResult<String> {
        Err(ValueError::unserializable(self.get_type().name()))
    }

    /// The value as JSON; opaques have no JSON form by default
    fn convert_to_json(&self) -> ValueResult<Json> {
        Err(ValueError::not_convertible_to_json(self.get_type().name()))
    }
}

impl dyn OpaqueValueInterface {
    /// The implementation as a `T`, if it is one
    pub fn downcast_ref<T: OpaqueValueInterface>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }
}

/// Shared handle to an opaque implementation
#[derive(Debug, Clone)]
pub struct OpaqueValue(Arc<dyn OpaqueValueInterface>);

impl OpaqueValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Opaque;

    /// Share `opaque` behind a handle
    pub fn new<T: OpaqueValueInterface>(opaque: T) -> Self {
        OpaqueValue(Arc::new(opaque))
    }

    /// Wrap an implementation that is already shared
    pub fn from_arc(opaque: Arc<dyn OpaqueValueInterface>) -> Self {
        OpaqueValue(opaque)
    }

    /// The implementation behind the handle
    pub fn interface(&self) -> &dyn OpaqueValueInterface {
        &*self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> OpaqueType {
        self.0.get_type()
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.debug_string()
    }

    /// Identity of the implementation type
    pub fn native_type_id(&self) -> NativeTypeId {
        self.0.native_type_id()
    }

    /// The implementation as a `T`, if it is one
    pub fn downcast_ref<T: OpaqueValueInterface>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Equality as defined by the implementation, false across native types
    pub fn equals(&self, other: &OpaqueValue) -> bool {
        self.native_type_id() == other.native_type_id() && self.0.equals(&*other.0)
    }

    /// Whether both handles share one allocation
    pub fn ptr_eq(&self, other: &OpaqueValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Serializable for OpaqueValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        self.0.get_serialized_size()
    }

    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        self.0.serialize_to(buffer)
    }

    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        self.0.get_type_url(prefix)
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        self.0.convert_to_json()
    }
}

impl fmt::Display for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

borrowed_view!(
    /// A borrowed opaque value
    OpaqueValueView => OpaqueValue
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[derive(Debug)]
    struct Handle(u32);

    impl OpaqueValueInterface for Handle {
        fn get_type(&self) -> OpaqueType {
            OpaqueType::new("test.Handle", &[])
        }

        fn debug_string(&self) -> String {
            format!("handle({})", self.0)
        }
    }

    #[test]
    fn test_identity_equality() {
        let a = OpaqueValue::new(Handle(1));
        let b = OpaqueValue::new(Handle(1));
        assert!(a.equals(&a.clone()));
        assert!(!a.equals(&b));
    }

    #[test]
    fn test_unserializable() {
        let value = OpaqueValue::new(Handle(7));
        let err = value.serialize().unwrap_err();
        assert_eq!(err.code(), ErrorCode::FailedPrecondition);
        assert_eq!(err.message(), "test.Handle is unserializable");
        assert_eq!(
            value.convert_to_json().unwrap_err().message(),
            "test.Handle is not convertable to JSON"
        );
        assert!(value.get_type_url("type.googleapis.com/").is_err());
    }

    #[test]
    fn test_downcast() {
        let value = OpaqueValue::new(Handle(3));
        assert_eq!(value.downcast_ref::<Handle>().map(|h| h.0), Some(3));
        assert_eq!(value.native_type_id(), NativeTypeId::of::<Handle>());
        assert_eq!(value.debug_string(), "handle(3)");
    }
}
