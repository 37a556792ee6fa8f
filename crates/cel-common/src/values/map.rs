//! Maps
//!
//! A map is any type implementing [`MapValueInterface`], shared behind a
//! [`MapValue`] handle. Keys are restricted to bool, int, uint and string.
//! Lookups with an error or unknown key propagate the key instead of
//! failing, which lets errors flow through index expressions.

use super::list::check_element_kind;
use super::{
    borrowed_view, BoolValue, ListValue, ListValueIterator, NullValue, Serializable, StringValue,
    Value, ValueView,
};
use crate::any::make_type_url_with_prefix;
use crate::json::{put_json_object, Json, JsonObject, JSON_STRUCT_TYPE_NAME};
use crate::kind::{NativeTypeId, ValueKind};
use crate::types::MapType;
use crate::value_factory::{ValueFactory, ValueManager};
use crate::{ValueError, ValueResult};
use bytes::BytesMut;
use indexmap::IndexMap;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Check that `key` has a kind maps accept
pub fn check_key(key: ValueView<'_>) -> ValueResult<()> {
    match key.kind() {
        ValueKind::Bool | ValueKind::Int | ValueKind::Uint | ValueKind::String => Ok(()),
        kind => Err(ValueError::invalid_argument(format!(
            "Invalid map key type: '{kind}'"
        ))),
    }
}

fn no_such_key(key: ValueView<'_>) -> ValueError {
    ValueError::not_found(format!("Key not found in map : {}", key.debug_string()))
}

/// The JSON object field name of a map key
fn json_key(key: ValueView<'_>) -> ValueResult<String> {
    match key {
        ValueView::String(s) => Ok(s.as_str().to_string()),
        ValueView::Bool(b) => Ok(b.native_value().to_string()),
        ValueView::Int(i) => Ok(i.native_value().to_string()),
        ValueView::Uint(u) => Ok(u.native_value().to_string()),
        other => Err(ValueError::invalid_argument(format!(
            "Invalid map key type: '{}'",
            other.kind()
        ))),
    }
}

/// Order of map keys: by kind, then by value within a kind
fn key_order(a: ValueView<'_>, b: ValueView<'_>) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| a.partial_cmp(&b).unwrap_or(Ordering::Equal))
}

/// Behaviour of a map implementation
pub trait MapValueInterface: Any + Send + Sync + fmt::Debug {
    /// The type of the value
    fn get_type(&self) -> MapType;

    /// Number of entries
    fn size(&self) -> usize;

    /// Whether the map has no entries
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Value stored under `key`, which callers have checked with [`check_key`]
    fn find_impl(&self, factory: &dyn ValueFactory, key: ValueView<'_>) -> ValueResult<Option<Value>>;

    /// Whether `key` is present, which callers have checked with [`check_key`]
    fn has_impl(&self, key: ValueView<'_>) -> ValueResult<bool>;

    /// The keys of the map as a list, in iteration order
    fn list_keys(&self, factory: &dyn ValueFactory) -> ValueResult<ListValue>;

    /// Visit entries in iteration order until `callback` returns `false`
    fn for_each(
        &self,
        factory: &dyn ValueFactory,
        callback: &mut dyn FnMut(ValueView<'_>, ValueView<'_>) -> ValueResult<bool>,
    ) -> ValueResult<()> {
        let keys = self.list_keys(factory)?;
        for index in 0..keys.size() {
            let key = keys.get(factory, index)?;
            let value = self
                .find_impl(factory, key.as_view())?
                .ok_or_else(|| no_such_key(key.as_view()))?;
            if !callback(key.as_view(), value.as_view())? {
                break;
            }
        }
        Ok(())
    }

    /// The map as a JSON object, with keys rendered as strings
    fn convert_to_json_object(&self) -> ValueResult<JsonObject> {
        let factory = ValueManager::shared();
        let mut object = JsonObject::with_capacity(self.size());
        self.for_each(factory, &mut |key, value| {
            if object.insert(json_key(key)?, value.convert_to_json()?).is_some() {
                return Err(ValueError::failed_precondition(
                    "cannot convert map with duplicate keys to JSON",
                ));
            }
            Ok(true)
        })?;
        Ok(object)
    }

    /// Entries rendered in key order
    fn debug_string(&self) -> String {
        let factory = ValueManager::shared();
        let mut entries = Vec::with_capacity(self.size());
        let result = self.for_each(factory, &mut |key, value| {
            entries.push((key.to_value(), value.debug_string()));
            Ok(true)
        });
        entries.sort_by(|(a, _), (b, _)| key_order(a.as_view(), b.as_view()));
        let mut rendered: Vec<String> = entries
            .iter()
            .map(|(key, value)| format!("{}: {value}", key.debug_string()))
            .collect();
        if let Err(err) = result {
            rendered.push(err.to_string());
        }
        format!("{{{}}}", rendered.join(", "))
    }

    /// Identity of the implementation type
    fn native_type_id(&self) -> NativeTypeId {
        NativeTypeId::of::<Self>()
    }

    /// Exact number of bytes `serialize_to` appends
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Err(ValueError::unimplemented(
            "preflighting serialization size is not implemented by this map",
        ))
    }

    /// Serialize as `google.protobuf.Struct`
    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        let object = self.convert_to_json_object()?;
        tracing::trace!(len = object.len(), "serializing map through its JSON form");
        put_json_object(buffer, &object);
        Ok(())
    }

    /// Type URL of the message the value serializes as
    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, JSON_STRUCT_TYPE_NAME))
    }
}

impl dyn MapValueInterface {
    /// The implementation as a `T`, if it is one
    pub fn downcast_ref<T: MapValueInterface>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }
}

/// Shared handle to a map implementation
#[derive(Debug, Clone)]
pub struct MapValue(Arc<dyn MapValueInterface>);

impl MapValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Map;

    /// Share `map` behind a handle
    pub fn new<T: MapValueInterface>(map: T) -> Self {
        MapValue(Arc::new(map))
    }

    /// Wrap an implementation that is already shared
    pub fn from_arc(map: Arc<dyn MapValueInterface>) -> Self {
        MapValue(map)
    }

    /// The implementation behind the handle
    pub fn interface(&self) -> &dyn MapValueInterface {
        &*self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> MapType {
        self.0.get_type()
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.debug_string()
    }

    /// Number of entries
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value stored under `key`
    ///
    /// An error or unknown key is returned as the result. A missing key
    /// fails with `NotFound` and an unsupported key kind with
    /// `InvalidArgument`.
    pub fn get(&self, factory: &dyn ValueFactory, key: ValueView<'_>) -> ValueResult<Value> {
        let (value, found) = self.find(factory, key)?;
        if found {
            return Ok(value);
        }
        match value.kind() {
            ValueKind::Error | ValueKind::Unknown => Ok(value),
            _ => Err(no_such_key(key)),
        }
    }

    /// Value stored under `key` and whether it was present
    ///
    /// A missing key yields `(null, false)`; an error or unknown key yields
    /// `(key, false)`.
    pub fn find(
        &self,
        factory: &dyn ValueFactory,
        key: ValueView<'_>,
    ) -> ValueResult<(Value, bool)> {
        if matches!(key, ValueView::Error(_) | ValueView::Unknown(_)) {
            return Ok((key.to_value(), false));
        }
        check_key(key)?;
        Ok(match self.0.find_impl(factory, key)? {
            Some(value) => (value, true),
            None => (Value::Null(NullValue), false),
        })
    }

    /// Presence of `key` as a bool value, or the key itself when it is an
    /// error or unknown
    pub fn has(&self, key: ValueView<'_>) -> ValueResult<Value> {
        if matches!(key, ValueView::Error(_) | ValueView::Unknown(_)) {
            return Ok(key.to_value());
        }
        check_key(key)?;
        Ok(Value::Bool(BoolValue::new(self.0.has_impl(key)?)))
    }

    /// The keys as a list, in iteration order
    pub fn list_keys(&self, factory: &dyn ValueFactory) -> ValueResult<ListValue> {
        self.0.list_keys(factory)
    }

    /// Visit entries in iteration order until `callback` returns `false`
    pub fn for_each<F>(&self, factory: &dyn ValueFactory, mut callback: F) -> ValueResult<()>
    where
        F: FnMut(ValueView<'_>, ValueView<'_>) -> ValueResult<bool>,
    {
        self.0.for_each(factory, &mut callback)
    }

    /// Iterator over the keys of the map
    pub fn new_iterator<'a>(
        &self,
        factory: &'a dyn ValueFactory,
    ) -> ValueResult<ListValueIterator<'a>> {
        Ok(ListValueIterator::new(self.0.list_keys(factory)?, factory))
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
    pub fn downcast_ref<T: MapValueInterface>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Whether both handles share one allocation
    pub fn ptr_eq(&self, other: &MapValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for MapValue {
    fn default() -> Self {
        ValueManager::shared().get_zero_dyn_dyn_map_value()
    }
}

impl Serializable for MapValue {
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

impl fmt::Display for MapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

borrowed_view!(
    /// A borrowed map
    MapValueView => MapValue
);

/// A validated map key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(StringValue),
}

impl MapKey {
    pub(crate) fn from_view(key: ValueView<'_>) -> ValueResult<Self> {
        match key {
            ValueView::Bool(b) => Ok(MapKey::Bool(b.native_value())),
            ValueView::Int(i) => Ok(MapKey::Int(i.native_value())),
            ValueView::Uint(u) => Ok(MapKey::Uint(u.native_value())),
            ValueView::String(s) => Ok(MapKey::String(s.to_owned_value())),
            other => Err(ValueError::invalid_argument(format!(
                "Invalid map key type: '{}'",
                other.kind()
            ))),
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            MapKey::Bool(b) => Value::from(*b),
            MapKey::Int(i) => Value::from(*i),
            MapKey::Uint(u) => Value::from(*u),
            MapKey::String(s) => Value::String(s.clone()),
        }
    }
}

/// The empty map of a given type
#[derive(Debug)]
pub(crate) struct EmptyMap {
    map_type: MapType,
}

impl EmptyMap {
    pub(crate) fn new(map_type: MapType) -> Self {
        EmptyMap { map_type }
    }
}

impl MapValueInterface for EmptyMap {
    fn get_type(&self) -> MapType {
        self.map_type.clone()
    }

    fn size(&self) -> usize {
        0
    }

    fn find_impl(&self, _factory: &dyn ValueFactory, _key: ValueView<'_>) -> ValueResult<Option<Value>> {
        Ok(None)
    }

    fn has_impl(&self, _key: ValueView<'_>) -> ValueResult<bool> {
        Ok(false)
    }

    fn list_keys(&self, factory: &dyn ValueFactory) -> ValueResult<ListValue> {
        let key_type = factory.create_list_type(self.map_type.key().clone());
        Ok(factory.create_zero_list_value(key_type))
    }

    fn convert_to_json_object(&self) -> ValueResult<JsonObject> {
        Ok(JsonObject::new())
    }

    fn debug_string(&self) -> String {
        "{}".to_string()
    }
}

/// A map of materialized values, iterated in insertion order
#[derive(Debug)]
pub(crate) struct ValueMap {
    map_type: MapType,
    entries: IndexMap<MapKey, Value>,
}

impl ValueMap {
    pub(crate) fn new(map_type: MapType, entries: IndexMap<MapKey, Value>) -> Self {
        ValueMap { map_type, entries }
    }
}

impl MapValueInterface for ValueMap {
    fn get_type(&self) -> MapType {
        self.map_type.clone()
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn find_impl(&self, _factory: &dyn ValueFactory, key: ValueView<'_>) -> ValueResult<Option<Value>> {
        Ok(MapKey::from_view(key).ok().and_then(|key| self.entries.get(&key).cloned()))
    }

    fn has_impl(&self, key: ValueView<'_>) -> ValueResult<bool> {
        Ok(MapKey::from_view(key).ok().is_some_and(|key| self.entries.contains_key(&key)))
    }

    fn list_keys(&self, factory: &dyn ValueFactory) -> ValueResult<ListValue> {
        let keys: Vec<Value> = self.entries.keys().map(MapKey::to_value).collect();
        let key_type = factory.create_list_type(self.map_type.key().clone());
        Ok(factory.create_list_value(key_type, keys))
    }

    fn for_each(
        &self,
        _factory: &dyn ValueFactory,
        callback: &mut dyn FnMut(ValueView<'_>, ValueView<'_>) -> ValueResult<bool>,
    ) -> ValueResult<()> {
        for (key, value) in &self.entries {
            let key = key.to_value();
            if !callback(key.as_view(), value.as_view())? {
                break;
            }
        }
        Ok(())
    }
}

/// Incremental construction of a map
#[derive(Debug, Clone)]
pub struct MapValueBuilder {
    map_type: MapType,
    entries: IndexMap<MapKey, Value>,
}

impl MapValueBuilder {
    /// A builder for maps of `map_type`
    pub fn new(map_type: MapType) -> Self {
        MapValueBuilder {
            map_type,
            entries: IndexMap::new(),
        }
    }

    /// Insert an entry; fails for unsupported and duplicate keys
    pub fn put(&mut self, key: Value, value: Value) -> ValueResult<()> {
        let map_key = MapKey::from_view(key.as_view())?;
        check_element_kind(self.map_type.key(), &key)?;
        check_element_kind(self.map_type.value(), &value)?;
        if self.entries.contains_key(&map_key) {
            return Err(ValueError::already_exists(format!(
                "duplicate key in map: {}",
                key.debug_string()
            )));
        }
        self.entries.insert(map_key, value);
        Ok(())
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reserve room for `additional` more entries
    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Finish building; an empty result is the cached zero value
    pub fn build(self) -> MapValue {
        if self.entries.is_empty() {
            return ValueManager::shared().create_zero_map_value(self.map_type);
        }
        MapValue::new(ValueMap::new(self.map_type, self.entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListType, Type};
    use crate::values::{ErrorValue, ValueIterator};
    use crate::ErrorCode;

    fn int_double_map(entries: &[(i64, f64)]) -> MapValue {
        let mut builder = MapValueBuilder::new(MapType::new(Type::Int, Type::Double));
        for (key, value) in entries {
            builder.put(Value::from(*key), Value::from(*value)).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_debug_string() {
        let map = int_double_map(&[(0, 3.0), (1, 4.0)]);
        assert_eq!(map.debug_string(), "{0: 3.0, 1: 4.0}");
    }

    #[test]
    fn test_debug_string_sorts_keys() {
        let map = int_double_map(&[(2, 1.0), (-1, 2.0), (0, 3.0)]);
        assert_eq!(map.debug_string(), "{-1: 2.0, 0: 3.0, 2: 1.0}");
        assert_eq!(
            map.debug_string(),
            int_double_map(&[(0, 3.0), (2, 1.0), (-1, 2.0)]).debug_string()
        );

        let mut builder = MapValueBuilder::new(MapType::default());
        builder.put(Value::from("b"), Value::from(1i64)).unwrap();
        builder.put(Value::from(1u64), Value::from(2i64)).unwrap();
        builder.put(Value::from("a"), Value::from(3i64)).unwrap();
        builder.put(Value::from(true), Value::from(4i64)).unwrap();
        assert_eq!(
            builder.build().debug_string(),
            "{true: 4, 1u: 2, \"a\": 3, \"b\": 1}"
        );
    }

    #[test]
    fn test_json_rejects_colliding_keys() {
        let mut builder = MapValueBuilder::new(MapType::default());
        builder.put(Value::from(1i64), Value::from("int")).unwrap();
        builder.put(Value::from("1"), Value::from("string")).unwrap();
        let map = builder.build();

        let err = map.convert_to_json_object().unwrap_err();
        assert_eq!(err.code(), ErrorCode::FailedPrecondition);
        assert_eq!(err.message(), "cannot convert map with duplicate keys to JSON");
        assert_eq!(
            map.serialize().unwrap_err().code(),
            ErrorCode::FailedPrecondition
        );
    }

    #[test]
    fn test_get_and_find() {
        let factory = ValueManager::shared();
        let map = int_double_map(&[(0, 3.0)]);
        assert_eq!(map.get(factory, Value::from(0i64).as_view()).unwrap().debug_string(), "3.0");

        let (value, found) = map.find(factory, Value::from(5i64).as_view()).unwrap();
        assert!(!found);
        assert_eq!(value.kind(), ValueKind::Null);

        let err = map.get(factory, Value::from(5i64).as_view()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), "Key not found in map : 5");
    }

    #[test]
    fn test_invalid_key_kinds() {
        let factory = ValueManager::shared();
        let map = int_double_map(&[(0, 3.0)]);
        let err = map.get(factory, Value::from(1.5).as_view()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.message(), "Invalid map key type: 'double'");
        assert!(map.has(Value::Null(NullValue).as_view()).is_err());
    }

    #[test]
    fn test_error_keys_propagate() {
        let factory = ValueManager::shared();
        let map = int_double_map(&[(0, 3.0)]);
        let key = Value::Error(ErrorValue::new(ValueError::unknown("upstream")));
        let result = map.get(factory, key.as_view()).unwrap();
        assert_eq!(result.kind(), ValueKind::Error);
        assert_eq!(map.has(key.as_view()).unwrap().kind(), ValueKind::Error);
        let (value, found) = map.find(factory, key.as_view()).unwrap();
        assert!(!found);
        assert_eq!(value.kind(), ValueKind::Error);
    }

    #[test]
    fn test_has() {
        let map = int_double_map(&[(0, 3.0)]);
        assert_eq!(map.has(Value::from(0i64).as_view()).unwrap().debug_string(), "true");
        assert_eq!(map.has(Value::from(9i64).as_view()).unwrap().debug_string(), "false");
    }

    #[test]
    fn test_builder_rejects_bad_entries() {
        let mut builder = MapValueBuilder::new(MapType::default());
        builder.put(Value::from("a"), Value::from(1i64)).unwrap();
        assert_eq!(
            builder.put(Value::from("a"), Value::from(2i64)).unwrap_err().code(),
            ErrorCode::AlreadyExists
        );
        assert_eq!(
            builder.put(Value::from(1.0), Value::from(2i64)).unwrap_err().code(),
            ErrorCode::InvalidArgument
        );
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_iteration_and_keys() {
        let factory = ValueManager::shared();
        let map = int_double_map(&[(2, 1.0), (1, 2.0)]);
        let keys = map.list_keys(factory).unwrap();
        assert_eq!(keys.debug_string(), "[2, 1]");
        assert_eq!(keys.get_type(), ListType::new(Type::Int));

        let mut iterator = map.new_iterator(factory).unwrap();
        let mut seen = Vec::new();
        while iterator.has_next() {
            seen.push(iterator.next().unwrap().debug_string());
        }
        assert_eq!(seen, vec!["2", "1"]);
        assert!(iterator.next().is_err());
    }

    #[test]
    fn test_json_keys_are_strings() {
        let map = int_double_map(&[(0, 3.0)]);
        let json = map.convert_to_json().unwrap();
        let mut expected = JsonObject::new();
        expected.insert("0".to_string(), Json::Number(3.0));
        assert_eq!(json, Json::Object(expected));
        assert_eq!(
            map.get_serialized_size().unwrap_err().code(),
            ErrorCode::Unimplemented
        );
        assert!(!map.serialize().unwrap().is_empty());
    }

    #[test]
    fn test_empty_map() {
        let factory = ValueManager::shared();
        let map = MapValue::default();
        assert_eq!(map.debug_string(), "{}");
        assert!(map.list_keys(factory).unwrap().is_empty());
        assert!(map.serialize().unwrap().is_empty());
        assert_eq!(
            map.get_type_url("type.googleapis.com/").unwrap(),
            "type.googleapis.com/google.protobuf.Struct"
        );
    }
}
