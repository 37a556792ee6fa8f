//! Struct values
//!
//! A struct is a message-like value with named fields, provided by the host
//! through [`StructValueInterface`]. Unless an implementation knows its own
//! wire form, a struct projects to JSON from its fields but does not
//! serialize.

use super::{borrowed_view, Serializable, Value, ValueView};
use crate::any::make_type_url_with_prefix;
use crate::json::{Json, JsonObject};
use crate::kind::{NativeTypeId, ValueKind};
use crate::types::StructType;
use crate::value_factory::{ValueFactory, ValueManager};
use crate::{ValueError, ValueResult};
use bytes::BytesMut;
use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Behaviour of a struct implementation
pub trait StructValueInterface: Any + Send + Sync + fmt::Debug {
    /// The type of the value
    fn get_type(&self) -> StructType;

    /// Value of the field `name`; fails with `NotFound` for unknown fields
    fn get_field_by_name(&self, factory: &dyn ValueFactory, name: &str) -> ValueResult<Value>;

    /// Whether the field `name` is set; fails with `NotFound` for unknown
    /// fields
    fn has_field_by_name(&self, name: &str) -> ValueResult<bool>;

    /// Visit set fields until `callback` returns `false`
    fn for_each_field(
        &self,
        factory: &dyn ValueFactory,
        callback: &mut dyn FnMut(&str, ValueView<'_>) -> ValueResult<bool>,
    ) -> ValueResult<()>;

    /// Rendering for diagnostics
    fn debug_string(&self) -> String {
        let mut fields = Vec::new();
        let result = self.for_each_field(ValueManager::shared(), &mut |name, value| {
            fields.push(format!("{name}: {}", value.debug_string()));
            Ok(true)
        });
        if let Err(err) = result {
            fields.push(err.to_string());
        }
        format!("{}{{{}}}", self.get_type().name(), fields.join(", "))
    }

    /// Same type name and pairwise equal set fields
    fn equals(&self, other: &dyn StructValueInterface) -> bool {
        if self.get_type() != other.get_type() {
            return false;
        }
        let factory = ValueManager::shared();
        let mut count = 0usize;
        let mut equal = true;
        let visited = self.for_each_field(factory, &mut |name, value| {
            count += 1;
            equal = other
                .get_field_by_name(factory, name)
                .is_ok_and(|theirs| theirs == value);
            Ok(equal)
        });
        if visited.is_err() || !equal {
            return false;
        }
        let mut other_count = 0usize;
        other
            .for_each_field(factory, &mut |_, _| {
                other_count += 1;
                Ok(true)
            })
            .is_ok()
            && count == other_count
    }

    /// Feed `state` the parts of the value `equals` looks at
    ///
    /// The default feeds the type name and the set fields, combined so that
    /// field order does not matter.
    fn hash_contents(&self, mut state: &mut dyn Hasher) {
        self.get_type().name().hash(&mut state);
        let mut count = 0usize;
        let mut combined = 0u64;
        let _ = self.for_each_field(ValueManager::shared(), &mut |name, value| {
            let mut field = DefaultHasher::new();
            name.hash(&mut field);
            value.hash(&mut field);
            combined = combined.wrapping_add(field.finish());
            count += 1;
            Ok(true)
        });
        count.hash(&mut state);
        combined.hash(&mut state);
    }

    /// Identity of the implementation type
    fn native_type_id(&self) -> NativeTypeId {
        NativeTypeId::of::<Self>()
    }

    /// Set fields as a JSON object
    fn convert_to_json_object(&self) -> ValueResult<JsonObject> {
        let mut object = JsonObject::new();
        self.for_each_field(ValueManager::shared(), &mut |name, value| {
            object.insert(name.to_string(), value.convert_to_json()?);
            Ok(true)
        })?;
        Ok(object)
    }

    /// Exact number of bytes `serialize_to` appends
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Err(ValueError::unimplemented(format!(
            "preflighting serialization size is not implemented by {}",
            self.get_type().name()
        )))
    }

    /// Append the wire form of the value to `buffer`
    fn serialize_to(&self, _buffer: &mut BytesMut) -> ValueResult<()> {
        Err(ValueError::unimplemented(format!(
            "serialization is not implemented by {}",
            self.get_type().name()
        )))
    }

    /// Type URL of the message the value serializes as
    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, self.get_type().name()))
    }
}

impl dyn StructValueInterface {
    /// The implementation as a `T`, if it is one
    pub fn downcast_ref<T: StructValueInterface>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }
}

/// Shared handle to a struct implementation
#[derive(Debug, Clone)]
pub struct StructValue(Arc<dyn StructValueInterface>);

impl StructValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Struct;

    /// Share `value` behind a handle
    pub fn new<T: StructValueInterface>(value: T) -> Self {
        StructValue(Arc::new(value))
    }

    /// Wrap an implementation that is already shared
    pub fn from_arc(value: Arc<dyn StructValueInterface>) -> Self {
        StructValue(value)
    }

    /// The implementation behind the handle
    pub fn interface(&self) -> &dyn StructValueInterface {
        &*self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> StructType {
        self.0.get_type()
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.debug_string()
    }

    /// Value of the field `name`; fails with `NotFound` for unknown fields
    pub fn get_field_by_name(&self, factory: &dyn ValueFactory, name: &str) -> ValueResult<Value> {
        self.0.get_field_by_name(factory, name)
    }

    /// Whether the field `name` is set
    pub fn has_field_by_name(&self, name: &str) -> ValueResult<bool> {
        self.0.has_field_by_name(name)
    }

    /// Visit set fields until `callback` returns `false`
    pub fn for_each_field<F>(&self, factory: &dyn ValueFactory, mut callback: F) -> ValueResult<()>
    where
        F: FnMut(&str, ValueView<'_>) -> ValueResult<bool>,
    {
        self.0.for_each_field(factory, &mut callback)
    }

    /// The value as a JSON object
    pub fn convert_to_json_object(&self) -> ValueResult<JsonObject> {
        self.0.convert_to_json_object()
    }

    /// Identity of the implementation type
    pub fn native_type_id(&self) -> NativeTypeId {
        self.0.native_type_id()
    }

    /// The implementation as a `T`, if it is one
    pub fn downcast_ref<T: StructValueInterface>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Equality as defined by the implementation, false across native types
    pub fn equals(&self, other: &StructValue) -> bool {
        self.native_type_id() == other.native_type_id() && self.0.equals(&*other.0)
    }

    /// Whether both handles share one allocation
    pub fn ptr_eq(&self, other: &StructValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Serializable for StructValue {
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
        Ok(Json::Object(self.0.convert_to_json_object()?))
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

borrowed_view!(
    /// A borrowed struct
    StructValueView => StructValue
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use indexmap::IndexMap;

    #[derive(Debug)]
    struct Point {
        fields: IndexMap<&'static str, i64>,
    }

    impl Point {
        fn new(x: i64, y: i64) -> Self {
            Point {
                fields: IndexMap::from([("x", x), ("y", y)]),
            }
        }
    }

    impl StructValueInterface for Point {
        fn get_type(&self) -> StructType {
            StructType::new("test.Point")
        }

        fn get_field_by_name(&self, _factory: &dyn ValueFactory, name: &str) -> ValueResult<Value> {
            self.fields
                .get(name)
                .map(|v| Value::from(*v))
                .ok_or_else(|| ValueError::not_found(format!("no_such_field: {name}")))
        }

        fn has_field_by_name(&self, name: &str) -> ValueResult<bool> {
            Ok(self.fields.contains_key(name))
        }

        fn for_each_field(
            &self,
            _factory: &dyn ValueFactory,
            callback: &mut dyn FnMut(&str, ValueView<'_>) -> ValueResult<bool>,
        ) -> ValueResult<()> {
            for (name, value) in &self.fields {
                if !callback(name, Value::from(*value).as_view())? {
                    break;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_default_debug_string_and_json() {
        let point = StructValue::new(Point::new(1, 2));
        assert_eq!(point.debug_string(), "test.Point{x: 1, y: 2}");
        let json = point.convert_to_json().unwrap();
        assert_eq!(json.to_string(), r#"{"x":1,"y":2}"#);
    }

    #[test]
    fn test_default_equality_compares_fields() {
        let a = StructValue::new(Point::new(1, 2));
        assert!(a.equals(&StructValue::new(Point::new(1, 2))));
        assert!(!a.equals(&StructValue::new(Point::new(1, 3))));
    }

    #[test]
    fn test_default_serialization() {
        let point = StructValue::new(Point::new(1, 2));
        assert_eq!(
            point.get_type_url("type.googleapis.com/").unwrap(),
            "type.googleapis.com/test.Point"
        );
        assert_eq!(point.serialize().unwrap_err().code(), ErrorCode::Unimplemented);
        assert_eq!(
            point.get_serialized_size().unwrap_err().code(),
            ErrorCode::Unimplemented
        );
        assert_eq!(
            point
                .get_field_by_name(ValueManager::shared(), "z")
                .unwrap_err()
                .code(),
            ErrorCode::NotFound
        );
    }
}
