//! Lists
//!
//! A list is any type implementing [`ListValueInterface`], shared behind a
//! [`ListValue`] handle. Implementations only provide the size and indexed
//! access; bounds checking, iteration and serialization are derived from
//! those.

use super::{borrowed_view, Serializable, Value, ValueView};
use crate::any::make_type_url_with_prefix;
use crate::json::{put_json_array, Json, JsonArray, JSON_LIST_TYPE_NAME};
use crate::kind::{NativeTypeId, ValueKind};
use crate::types::{ListType, Type};
use crate::value_factory::{ValueFactory, ValueManager};
use crate::{ValueError, ValueResult};
use bytes::BytesMut;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Behaviour of a list implementation
pub trait ListValueInterface: Any + Send + Sync + fmt::Debug {
    /// The type of the value
    fn get_type(&self) -> ListType;

    /// Number of elements
    fn size(&self) -> usize;

    /// Whether the list has no elements
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Element at `index`, which callers have checked against `size`
    fn get_impl(&self, factory: &dyn ValueFactory, index: usize) -> ValueResult<Value>;

    /// Visit elements in order until `callback` returns `false`
    fn for_each(
        &self,
        factory: &dyn ValueFactory,
        callback: &mut dyn FnMut(ValueView<'_>) -> ValueResult<bool>,
    ) -> ValueResult<()> {
        for index in 0..self.size() {
            let element = self.get_impl(factory, index)?;
            if !callback(element.as_view())? {
                break;
            }
        }
        Ok(())
    }

    /// The list as a JSON array
    fn convert_to_json_array(&self) -> ValueResult<JsonArray> {
        let factory = ValueManager::shared();
        let mut array = JsonArray::with_capacity(self.size());
        self.for_each(factory, &mut |element| {
            array.push(element.convert_to_json()?);
            Ok(true)
        })?;
        Ok(array)
    }

    /// Rendering for diagnostics
    fn debug_string(&self) -> String {
        let factory = ValueManager::shared();
        let mut elements = Vec::with_capacity(self.size());
        let result = self.for_each(factory, &mut |element| {
            elements.push(element.debug_string());
            Ok(true)
        });
        if let Err(err) = result {
            elements.push(err.to_string());
        }
        format!("[{}]", elements.join(", "))
    }

    /// Identity of the implementation type
    fn native_type_id(&self) -> NativeTypeId {
        NativeTypeId::of::<Self>()
    }

    /// Exact number of bytes `serialize_to` appends
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Err(ValueError::unimplemented(
            "preflighting serialization size is not implemented by this list",
        ))
    }

    /// Serialize as `google.protobuf.ListValue`
    fn serialize_to(&self, buffer: &mut BytesMut) -> ValueResult<()> {
        let array = self.convert_to_json_array()?;
        tracing::trace!(len = array.len(), "serializing list through its JSON form");
        put_json_array(buffer, &array);
        Ok(())
    }

    /// Type URL of the message the value serializes as
    fn get_type_url(&self, prefix: &str) -> ValueResult<String> {
        Ok(make_type_url_with_prefix(prefix, JSON_LIST_TYPE_NAME))
    }
}

impl dyn ListValueInterface {
    /// The implementation as a `T`, if it is one
    pub fn downcast_ref<T: ListValueInterface>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }
}

/// Sequential access to the elements of a list or the keys of a map
pub trait ValueIterator {
    /// Whether `next` has another element to return
    fn has_next(&self) -> bool;

    /// The next element; fails once `has_next` returns `false`
    fn next(&mut self) -> ValueResult<Value>;
}

/// Iterator over any list, driven by its size and indexed access
pub struct ListValueIterator<'a> {
    list: ListValue,
    factory: &'a dyn ValueFactory,
    index: usize,
    size: usize,
}

impl<'a> ListValueIterator<'a> {
    /// Iterate over `list` from its first element
    pub fn new(list: ListValue, factory: &'a dyn ValueFactory) -> Self {
        let size = list.size();
        ListValueIterator {
            list,
            factory,
            index: 0,
            size,
        }
    }
}

impl ValueIterator for ListValueIterator<'_> {
    fn has_next(&self) -> bool {
        self.index < self.size
    }

    fn next(&mut self) -> ValueResult<Value> {
        if !self.has_next() {
            return Err(ValueError::failed_precondition(
                "ValueIterator::next() called when ValueIterator::has_next() returns false",
            ));
        }
        let value = self.list.0.get_impl(self.factory, self.index)?;
        self.index += 1;
        Ok(value)
    }
}

impl fmt::Debug for ListValueIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListValueIterator")
            .field("index", &self.index)
            .field("size", &self.size)
            .finish()
    }
}

/// Shared handle to a list implementation
#[derive(Debug, Clone)]
pub struct ListValue(Arc<dyn ListValueInterface>);

impl ListValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::List;

    /// Share `list` behind a handle
    pub fn new<T: ListValueInterface>(list: T) -> Self {
        ListValue(Arc::new(list))
    }

    /// Wrap an implementation that is already shared
    pub fn from_arc(list: Arc<dyn ListValueInterface>) -> Self {
        ListValue(list)
    }

    /// The implementation behind the handle
    pub fn interface(&self) -> &dyn ListValueInterface {
        &*self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> ListType {
        self.0.get_type()
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.debug_string()
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Whether the list has no elements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at `index`, failing with `InvalidArgument` when out of bounds
    pub fn get(&self, factory: &dyn ValueFactory, index: usize) -> ValueResult<Value> {
        if index >= self.0.size() {
            return Err(ValueError::invalid_argument("index out of bounds"));
        }
        self.0.get_impl(factory, index)
    }

    /// Visit elements in order until `callback` returns `false`
    pub fn for_each<F>(&self, factory: &dyn ValueFactory, mut callback: F) -> ValueResult<()>
    where
        F: FnMut(ValueView<'_>) -> ValueResult<bool>,
    {
        self.0.for_each(factory, &mut callback)
    }

    /// An iterator over the elements
    pub fn new_iterator<'a>(&self, factory: &'a dyn ValueFactory) -> ListValueIterator<'a> {
        ListValueIterator::new(self.clone(), factory)
    }

    /// The list as a JSON array
    pub fn convert_to_json_array(&self) -> ValueResult<JsonArray> {
        self.0.convert_to_json_array()
    }

    /// Identity of the implementation type
    pub fn native_type_id(&self) -> NativeTypeId {
        self.0.native_type_id()
    }

    /// The implementation as a `T`, if it is one
    pub fn downcast_ref<T: ListValueInterface>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Whether both handles share one implementation object
    pub fn ptr_eq(&self, other: &ListValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for ListValue {
    fn default() -> Self {
        ValueManager::shared().get_zero_dyn_list_value()
    }
}

impl Serializable for ListValue {
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
        Ok(Json::Array(self.0.convert_to_json_array()?))
    }
}

impl fmt::Display for ListValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

borrowed_view!(
    /// A borrowed list
    ListValueView => ListValue
);

/// The empty list of a given type
#[derive(Debug)]
pub(crate) struct EmptyList {
    list_type: ListType,
}

impl EmptyList {
    pub(crate) fn new(list_type: ListType) -> Self {
        EmptyList { list_type }
    }
}

impl ListValueInterface for EmptyList {
    fn get_type(&self) -> ListType {
        self.list_type.clone()
    }

    fn size(&self) -> usize {
        0
    }

    fn get_impl(&self, _factory: &dyn ValueFactory, _index: usize) -> ValueResult<Value> {
        Err(ValueError::invalid_argument("index out of bounds"))
    }

    fn convert_to_json_array(&self) -> ValueResult<JsonArray> {
        Ok(JsonArray::new())
    }

    fn debug_string(&self) -> String {
        "[]".to_string()
    }
}

/// A list of materialized values
#[derive(Debug)]
pub(crate) struct ValueList {
    list_type: ListType,
    elements: Vec<Value>,
}

impl ValueList {
    pub(crate) fn new(list_type: ListType, elements: Vec<Value>) -> Self {
        ValueList {
            list_type,
            elements,
        }
    }
}

impl ListValueInterface for ValueList {
    fn get_type(&self) -> ListType {
        self.list_type.clone()
    }

    fn size(&self) -> usize {
        self.elements.len()
    }

    fn get_impl(&self, _factory: &dyn ValueFactory, index: usize) -> ValueResult<Value> {
        self.elements
            .get(index)
            .cloned()
            .ok_or_else(|| ValueError::invalid_argument("index out of bounds"))
    }

    fn for_each(
        &self,
        _factory: &dyn ValueFactory,
        callback: &mut dyn FnMut(ValueView<'_>) -> ValueResult<bool>,
    ) -> ValueResult<()> {
        for element in &self.elements {
            if !callback(element.as_view())? {
                break;
            }
        }
        Ok(())
    }

    fn convert_to_json_array(&self) -> ValueResult<JsonArray> {
        self.elements.iter().map(Serializable::convert_to_json).collect()
    }
}

/// Incremental construction of a list
///
/// Elements of a list whose element type fixes a kind are checked as they
/// are added.
#[derive(Debug, Clone)]
pub struct ListValueBuilder {
    list_type: ListType,
    elements: Vec<Value>,
}

impl ListValueBuilder {
    /// A builder for lists of `list_type`
    pub fn new(list_type: ListType) -> Self {
        ListValueBuilder {
            list_type,
            elements: Vec::new(),
        }
    }

    /// Append `value`; fails when its kind does not fit the element type
    pub fn add(&mut self, value: Value) -> ValueResult<()> {
        check_element_kind(self.list_type.element(), &value)?;
        self.elements.push(value);
        Ok(())
    }

    /// Number of elements added so far
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing has been added
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Reserve room for `additional` more entries
    pub fn reserve(&mut self, additional: usize) {
        self.elements.reserve(additional);
    }

    /// Finish building; an empty result is the cached zero value
    pub fn build(self) -> ListValue {
        if self.elements.is_empty() {
            return ValueManager::shared().create_zero_list_value(self.list_type);
        }
        ListValue::new(ValueList::new(self.list_type, self.elements))
    }
}

pub(crate) fn check_element_kind(expected: &Type, value: &Value) -> ValueResult<()> {
    match expected.kind().value_kind() {
        Some(kind) if kind != value.kind() => Err(ValueError::invalid_argument(format!(
            "expected {} but got {}",
            expected.debug_string(),
            value.kind()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    fn int_list(values: &[i64]) -> ListValue {
        let mut builder = ListValueBuilder::new(ListType::new(Type::Int));
        for value in values {
            builder.add(Value::from(*value)).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_get_checks_bounds() {
        let factory = ValueManager::shared();
        let list = int_list(&[0, 1, 2]);
        assert_eq!(list.get(factory, 2).unwrap().debug_string(), "2");
        let err = list.get(factory, 3).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.message(), "index out of bounds");
    }

    #[test]
    fn test_iterator_exhaustion() {
        let factory = ValueManager::shared();
        let list = int_list(&[7]);
        let mut iterator = list.new_iterator(factory);
        assert!(iterator.has_next());
        assert_eq!(iterator.next().unwrap().debug_string(), "7");
        assert!(!iterator.has_next());
        assert_eq!(
            iterator.next().unwrap_err().code(),
            ErrorCode::FailedPrecondition
        );
    }

    #[test]
    fn test_for_each_stops_early() {
        let factory = ValueManager::shared();
        let list = int_list(&[0, 1, 2, 3]);
        let mut seen = Vec::new();
        list.for_each(factory, |element| {
            seen.push(element.debug_string());
            Ok(seen.len() < 2)
        })
        .unwrap();
        assert_eq!(seen, vec!["0", "1"]);
    }

    #[test]
    fn test_builder_checks_element_kind() {
        let mut builder = ListValueBuilder::new(ListType::new(Type::Int));
        let err = builder.add(Value::from("nope")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(builder.is_empty());

        let mut dynamic = ListValueBuilder::new(ListType::default());
        dynamic.add(Value::from("ok")).unwrap();
        dynamic.add(Value::from(1i64)).unwrap();
        assert_eq!(dynamic.build().debug_string(), "[\"ok\", 1]");
    }

    #[test]
    fn test_builtin_list_has_no_preflight_size() {
        let list = int_list(&[1]);
        assert_eq!(
            list.get_serialized_size().unwrap_err().code(),
            ErrorCode::Unimplemented
        );
        // Values { number_value: 1.0 }
        let mut expected = vec![0x0a, 0x09, 0x11];
        expected.extend_from_slice(&1.0f64.to_bits().to_le_bytes());
        assert_eq!(list.serialize().unwrap().as_ref(), expected.as_slice());
    }

    #[test]
    fn test_empty_list() {
        let list = ListValue::default();
        assert!(list.is_empty());
        assert_eq!(list.debug_string(), "[]");
        assert_eq!(list.get_type(), ListType::new(Type::Dyn));
        assert!(list.serialize().unwrap().is_empty());
        assert_eq!(list.convert_to_json().unwrap(), Json::Array(vec![]));
    }

    #[test]
    fn test_downcast_builtin() {
        let list = int_list(&[1]);
        assert!(list.downcast_ref::<ValueList>().is_some());
        assert!(list.downcast_ref::<EmptyList>().is_none());
        assert_eq!(list.native_type_id(), NativeTypeId::of::<ValueList>());
    }
}
