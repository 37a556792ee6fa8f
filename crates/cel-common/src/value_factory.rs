//! Value construction
//!
//! [`ValueFactory`] is the capability extension implementations receive
//! when they need to materialize values lazily. [`ValueManager`] is the
//! thread-safe implementation of both factories; empty lists, maps and
//! optionals of common types come from a process-local cache instead of
//! being allocated per request.

use crate::json::{Json, JsonArray, JsonObject};
use crate::time::{validate_duration, validate_timestamp};
use crate::types::{ListType, MapType, OpaqueType, OptionalType, ProcessLocalTypeCache, Type, TypeFactory};
use crate::values::{
    BoolValue, BytesValue, DoubleValue, DurationValue, EmptyList, EmptyMap, ErrorValue, IntValue,
    ListValue, ListValueBuilder, ListValueInterface, MapValue, MapValueBuilder,
    MapValueInterface, NullValue, OptionalValue, StringValue, TimestampValue, TypeValue,
    UintValue, UnknownValue, Value, ValueList, ValueView,
};
use crate::{ValueError, ValueResult};
use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Process-wide empty values for the types in the type cache
struct ProcessLocalValueCache {
    default_error: ErrorValue,
    empty_lists: HashMap<ListType, ListValue>,
    empty_maps: HashMap<MapType, MapValue>,
    empty_optionals: HashMap<OptionalType, OptionalValue>,
    dyn_list: ListValue,
    dyn_dyn_map: MapValue,
    string_dyn_map: MapValue,
    dyn_optional: OptionalValue,
}

static VALUE_CACHE: Lazy<ProcessLocalValueCache> = Lazy::new(ProcessLocalValueCache::new);

impl ProcessLocalValueCache {
    fn get() -> &'static ProcessLocalValueCache {
        &VALUE_CACHE
    }

    fn new() -> Self {
        tracing::trace!("initialising process-local value cache");
        let types = ProcessLocalTypeCache::get();
        let empty_lists: HashMap<ListType, ListValue> = types
            .list_types()
            .map(|t| (t.clone(), ListValue::new(EmptyList::new(t.clone()))))
            .collect();
        let empty_maps: HashMap<MapType, MapValue> = types
            .map_types()
            .map(|t| (t.clone(), MapValue::new(EmptyMap::new(t.clone()))))
            .collect();
        let empty_optionals: HashMap<OptionalType, OptionalValue> = types
            .optional_types()
            .map(|t| (t.clone(), OptionalValue::empty(t.clone())))
            .collect();
        let dyn_list = empty_lists[&ListType::new(Type::Dyn)].clone();
        let dyn_dyn_map = empty_maps[&MapType::new(Type::Dyn, Type::Dyn)].clone();
        let string_dyn_map = empty_maps[&MapType::new(Type::String, Type::Dyn)].clone();
        let dyn_optional = empty_optionals[&OptionalType::new(Type::Dyn)].clone();
        ProcessLocalValueCache {
            default_error: ErrorValue::default(),
            empty_lists,
            empty_maps,
            empty_optionals,
            dyn_list,
            dyn_dyn_map,
            string_dyn_map,
            dyn_optional,
        }
    }
}

/// Construction of values
///
/// The zero-value methods consult the process-local cache first and fall
/// back to the `*_impl` hooks.
pub trait ValueFactory: TypeFactory {
    /// The `null` value
    fn get_null_value(&self) -> NullValue {
        NullValue
    }

    /// A `bool` value
    fn create_bool_value(&self, value: bool) -> BoolValue {
        BoolValue::new(value)
    }

    /// An `int` value
    fn create_int_value(&self, value: i64) -> IntValue {
        IntValue::new(value)
    }

    /// A `uint` value
    fn create_uint_value(&self, value: u64) -> UintValue {
        UintValue::new(value)
    }

    /// A `double` value
    fn create_double_value(&self, value: f64) -> DoubleValue {
        DoubleValue::new(value)
    }

    /// A `string` value copied from `value`
    fn create_string_value(&self, value: &str) -> StringValue {
        StringValue::new(value)
    }

    /// A `bytes` value copied from `value`
    fn create_bytes_value(&self, value: &[u8]) -> BytesValue {
        BytesValue::from(value)
    }

    /// A duration, rejected with `InvalidArgument` outside the protobuf range
    fn create_duration_value(&self, value: TimeDelta) -> ValueResult<DurationValue> {
        validate_duration(value)?;
        Ok(DurationValue::new(value))
    }

    /// A timestamp, rejected with `InvalidArgument` outside years 1 to 9999
    fn create_timestamp_value(&self, value: DateTime<Utc>) -> ValueResult<TimestampValue> {
        validate_timestamp(value)?;
        Ok(TimestampValue::new(value))
    }

    /// A value denoting the type `value`
    fn create_type_value(&self, value: Type) -> TypeValue {
        TypeValue::new(value)
    }

    /// An error value wrapping `error`
    fn create_error_value(&self, error: ValueError) -> ErrorValue {
        ErrorValue::new(error)
    }

    /// The error used when no better one is available, `UNKNOWN: unknown error`
    fn get_default_error_value(&self) -> ErrorValue {
        ProcessLocalValueCache::get().default_error.clone()
    }

    /// The unknown value `unknown`
    fn create_unknown_value(&self, unknown: UnknownValue) -> UnknownValue {
        unknown
    }

    /// A list of `elements`; an empty list is the cached zero value
    fn create_list_value(&self, list_type: ListType, elements: Vec<Value>) -> ListValue {
        if elements.is_empty() {
            return self.create_zero_list_value(list_type);
        }
        ListValue::new(ValueList::new(list_type, elements))
    }

    /// A map of `entries`; fails for invalid and duplicate keys
    fn create_map_value(
        &self,
        map_type: MapType,
        entries: Vec<(Value, Value)>,
    ) -> ValueResult<MapValue> {
        let mut builder = MapValueBuilder::new(map_type);
        builder.reserve(entries.len());
        for (key, value) in entries {
            builder.put(key, value)?;
        }
        Ok(builder.build())
    }

    /// A builder for lists of `list_type`
    fn new_list_value_builder(&self, list_type: ListType) -> ListValueBuilder {
        ListValueBuilder::new(list_type)
    }

    /// A builder for maps of `map_type`
    fn new_map_value_builder(&self, map_type: MapType) -> MapValueBuilder {
        MapValueBuilder::new(map_type)
    }

    /// The value of a JSON document: numbers become doubles, arrays lists and objects maps
    fn create_value_from_json(&self, json: Json) -> Value {
        match json {
            Json::Null => Value::Null(NullValue),
            Json::Bool(b) => Value::from(b),
            Json::Number(n) => Value::from(n),
            Json::String(s) => Value::from(s),
            Json::Array(items) => Value::List(self.create_list_value_from_json_array(items)),
            Json::Object(fields) => Value::Map(self.create_map_value_from_json_object(fields)),
        }
    }

    /// A `list<dyn>` backed by `json`
    fn create_list_value_from_json_array(&self, json: JsonArray) -> ListValue {
        if json.is_empty() {
            return self.get_zero_dyn_list_value();
        }
        ListValue::new(JsonListValue(json))
    }

    /// A `map<string, dyn>` backed by `json`
    fn create_map_value_from_json_object(&self, json: JsonObject) -> MapValue {
        if json.is_empty() {
            return self.get_zero_string_dyn_map_value();
        }
        MapValue::new(JsonMapValue(json))
    }

    /// The empty list of `list_type`
    fn create_zero_list_value(&self, list_type: ListType) -> ListValue {
        match ProcessLocalValueCache::get().empty_lists.get(&list_type) {
            Some(list) => list.clone(),
            None => self.create_zero_list_value_impl(list_type),
        }
    }

    /// The empty map of `map_type`
    fn create_zero_map_value(&self, map_type: MapType) -> MapValue {
        match ProcessLocalValueCache::get().empty_maps.get(&map_type) {
            Some(map) => map.clone(),
            None => self.create_zero_map_value_impl(map_type),
        }
    }

    /// The empty optional of `optional_type`
    fn create_zero_optional_value(&self, optional_type: OptionalType) -> OptionalValue {
        match ProcessLocalValueCache::get().empty_optionals.get(&optional_type) {
            Some(optional) => optional.clone(),
            None => self.create_zero_optional_value_impl(optional_type),
        }
    }

    /// The empty `list<dyn>`
    fn get_zero_dyn_list_value(&self) -> ListValue {
        ProcessLocalValueCache::get().dyn_list.clone()
    }

    /// The empty `map<dyn, dyn>`
    fn get_zero_dyn_dyn_map_value(&self) -> MapValue {
        ProcessLocalValueCache::get().dyn_dyn_map.clone()
    }

    /// The empty `map<string, dyn>`
    fn get_zero_string_dyn_map_value(&self) -> MapValue {
        ProcessLocalValueCache::get().string_dyn_map.clone()
    }

    /// The empty `optional_type<dyn>`
    fn get_zero_dyn_optional_value(&self) -> OptionalValue {
        ProcessLocalValueCache::get().dyn_optional.clone()
    }

    /// Build an empty list the cache does not hold
    fn create_zero_list_value_impl(&self, list_type: ListType) -> ListValue {
        ListValue::new(EmptyList::new(list_type))
    }

    /// Build an empty map the cache does not hold
    fn create_zero_map_value_impl(&self, map_type: MapType) -> MapValue {
        MapValue::new(EmptyMap::new(map_type))
    }

    /// Build an empty optional the cache does not hold
    fn create_zero_optional_value_impl(&self, optional_type: OptionalType) -> OptionalValue {
        OptionalValue::empty(optional_type)
    }
}

/// Thread-safe value and type factory
///
/// Parameterized types that miss the process-local cache are interned, so
/// repeated requests for `list<list<int>>` share one allocation.
#[derive(Default)]
pub struct ValueManager {
    list_types: RwLock<HashMap<Type, ListType>>,
    map_types: RwLock<HashMap<(Type, Type), MapType>>,
    opaque_types: RwLock<HashMap<(String, Vec<Type>), OpaqueType>>,
}

static SHARED_VALUE_MANAGER: Lazy<ValueManager> = Lazy::new(ValueManager::new);

impl ValueManager {
    /// A manager with empty intern tables
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide manager, used where no factory is passed in
    pub fn shared() -> &'static ValueManager {
        &SHARED_VALUE_MANAGER
    }
}

impl fmt::Debug for ValueManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueManager")
            .field("list_types", &self.list_types.read().len())
            .field("map_types", &self.map_types.read().len())
            .field("opaque_types", &self.opaque_types.read().len())
            .finish()
    }
}

impl TypeFactory for ValueManager {
    fn create_list_type_impl(&self, element: Type) -> ListType {
        if let Some(list_type) = self.list_types.read().get(&element) {
            return list_type.clone();
        }
        self.list_types
            .write()
            .entry(element.clone())
            .or_insert_with(|| ListType::new(element))
            .clone()
    }

    fn create_map_type_impl(&self, key: Type, value: Type) -> MapType {
        let entry = (key, value);
        if let Some(map_type) = self.map_types.read().get(&entry) {
            return map_type.clone();
        }
        self.map_types
            .write()
            .entry(entry.clone())
            .or_insert_with(|| MapType::new(entry.0, entry.1))
            .clone()
    }

    fn create_opaque_type_impl(&self, name: &str, parameters: &[Type]) -> OpaqueType {
        let entry = (name.to_string(), parameters.to_vec());
        if let Some(opaque_type) = self.opaque_types.read().get(&entry) {
            return opaque_type.clone();
        }
        self.opaque_types
            .write()
            .entry(entry)
            .or_insert_with(|| OpaqueType::new(name, parameters))
            .clone()
    }
}

impl ValueFactory for ValueManager {}

/// A list backed by a JSON array, converting elements on access
#[derive(Debug)]
struct JsonListValue(JsonArray);

impl ListValueInterface for JsonListValue {
    fn get_type(&self) -> ListType {
        ListType::new(Type::Dyn)
    }

    fn size(&self) -> usize {
        self.0.len()
    }

    fn get_impl(&self, factory: &dyn ValueFactory, index: usize) -> ValueResult<Value> {
        self.0
            .get(index)
            .map(|json| factory.create_value_from_json(json.clone()))
            .ok_or_else(|| ValueError::invalid_argument("index out of bounds"))
    }

    fn convert_to_json_array(&self) -> ValueResult<JsonArray> {
        Ok(self.0.clone())
    }
}

/// A map backed by a JSON object, converting values on access
#[derive(Debug)]
struct JsonMapValue(JsonObject);

impl MapValueInterface for JsonMapValue {
    fn get_type(&self) -> MapType {
        MapType::new(Type::String, Type::Dyn)
    }

    fn size(&self) -> usize {
        self.0.len()
    }

    fn find_impl(
        &self,
        factory: &dyn ValueFactory,
        key: ValueView<'_>,
    ) -> ValueResult<Option<Value>> {
        let ValueView::String(key) = key else {
            return Ok(None);
        };
        Ok(self
            .0
            .get(key.as_str())
            .map(|json| factory.create_value_from_json(json.clone())))
    }

    fn has_impl(&self, key: ValueView<'_>) -> ValueResult<bool> {
        Ok(matches!(key, ValueView::String(key) if self.0.contains_key(key.as_str())))
    }

    fn list_keys(&self, factory: &dyn ValueFactory) -> ValueResult<ListValue> {
        let keys = self.0.keys().map(|key| Value::from(key.as_str())).collect();
        Ok(factory.create_list_value(factory.create_list_type(Type::String), keys))
    }

    fn convert_to_json_object(&self) -> ValueResult<JsonObject> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Serializable;
    use crate::ErrorCode;

    #[test]
    fn test_zero_values_are_cached() {
        let manager = ValueManager::new();
        let a = manager.create_zero_list_value(ListType::new(Type::Int));
        let b = ValueManager::shared().create_zero_list_value(ListType::new(Type::Int));
        assert!(a.ptr_eq(&b));
        assert!(manager
            .get_zero_dyn_dyn_map_value()
            .ptr_eq(&manager.create_zero_map_value(MapType::new(Type::Dyn, Type::Dyn))));
        let uncached = ListType::new(ListType::new(Type::Int).into());
        assert_eq!(manager.create_zero_list_value(uncached.clone()).get_type(), uncached);
    }

    #[test]
    fn test_default_error() {
        assert_eq!(
            ValueManager::shared().get_default_error_value().debug_string(),
            "UNKNOWN: unknown error"
        );
    }

    #[test]
    fn test_type_interning() {
        let manager = ValueManager::new();
        let nested: Type = ListType::new(Type::Int).into();
        let first = manager.create_list_type(nested.clone());
        let second = manager.create_list_type(nested);
        assert_eq!(first, second);
        assert_eq!(manager.list_types.read().len(), 1);
    }

    #[test]
    fn test_range_checked_time_values() {
        let manager = ValueManager::shared();
        assert!(manager.create_duration_value(TimeDelta::seconds(1)).is_ok());
        let err = manager
            .create_duration_value(TimeDelta::seconds(crate::time::MAX_DURATION_SECONDS + 1))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_values_from_json() {
        let manager = ValueManager::shared();
        let json: Json = Json::from_serde_json(serde_json::json!({
            "name": "cel",
            "tags": ["a", "b"],
            "stars": 5,
        }));
        let value = manager.create_value_from_json(json.clone());
        let Value::Map(map) = &value else {
            panic!("JSON objects become maps");
        };
        assert_eq!(map.size(), 3);
        assert_eq!(
            map.get(manager, Value::from("stars").as_view()).unwrap(),
            5.0
        );
        assert_eq!(
            map.get(manager, Value::from("tags").as_view())
                .unwrap()
                .debug_string(),
            "[\"a\", \"b\"]"
        );
        assert_eq!(value.convert_to_json().unwrap(), json);
        assert_eq!(map.get_type(), MapType::new(Type::String, Type::Dyn));
    }

    #[test]
    fn test_create_map_value() {
        let manager = ValueManager::shared();
        let map = manager
            .create_map_value(
                MapType::default(),
                vec![(Value::from(1i64), Value::from("one"))],
            )
            .unwrap();
        assert_eq!(map.debug_string(), "{1: \"one\"}");
        assert!(manager
            .create_map_value(MapType::default(), vec![(Value::from(0.5), Value::from(1i64))])
            .is_err());
    }
}
