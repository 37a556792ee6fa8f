//! Fixtures for tests of value consumers
//!
//! Available to this crate's tests and, through the `test-helpers`
//! feature, to downstream crates that need user-defined extension values.

use crate::types::{ListType, MapType, OpaqueType, StructType, Type};
use crate::value_factory::{ValueFactory, ValueManager};
use crate::values::{
    ListValue, ListValueInterface, MapValue, OpaqueValue, OpaqueValueInterface, StructValue,
    StructValueInterface, Value, ValueView,
};
use crate::{ValueError, ValueResult};
use parking_lot::Mutex;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// `list<int>` of `values` built by the shared factory
pub fn int_list(values: &[i64]) -> ListValue {
    let elements = values.iter().map(|v| Value::from(*v)).collect();
    ValueManager::shared().create_list_value(ListType::new(Type::Int), elements)
}

/// `map<string, int>` of `entries` built by the shared factory
pub fn string_int_map(entries: &[(&str, i64)]) -> MapValue {
    let entries = entries
        .iter()
        .map(|(k, v)| (Value::from(*k), Value::from(*v)))
        .collect();
    match ValueManager::shared().create_map_value(MapType::new(Type::String, Type::Int), entries) {
        Ok(map) => map,
        Err(err) => panic!("fixture map rejected: {err}"),
    }
}

/// A user-defined `list<int>` that records which indices were read
///
/// Overrides nothing but the required methods, so it exercises the
/// defaults of [`ListValueInterface`].
#[derive(Debug, Default)]
pub struct RecordingList {
    values: Vec<i64>,
    accessed: Arc<Mutex<Vec<usize>>>,
}

impl RecordingList {
    /// A list of `values` that records accesses
    pub fn new(values: Vec<i64>) -> Self {
        RecordingList {
            values,
            accessed: Arc::default(),
        }
    }

    /// Shared log of accessed indices, readable after the list is wrapped
    pub fn accessed(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.accessed)
    }
}

impl ListValueInterface for RecordingList {
    fn get_type(&self) -> ListType {
        ListType::new(Type::Int)
    }

    fn size(&self) -> usize {
        self.values.len()
    }

    fn get_impl(&self, _factory: &dyn ValueFactory, index: usize) -> ValueResult<Value> {
        self.accessed.lock().push(index);
        Ok(Value::from(self.values[index]))
    }
}

/// An opaque counter compared by its count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter(pub u64);

impl Counter {
    /// Name of the opaque type
    pub const TYPE_NAME: &'static str = "test.Counter";

    /// A counter holding `count`
    pub fn value(count: u64) -> OpaqueValue {
        OpaqueValue::new(Counter(count))
    }
}

impl OpaqueValueInterface for Counter {
    fn get_type(&self) -> OpaqueType {
        OpaqueType::new(Self::TYPE_NAME, &[])
    }

    fn debug_string(&self) -> String {
        format!("counter({})", self.0)
    }

    fn equals(&self, other: &dyn OpaqueValueInterface) -> bool {
        other.downcast_ref::<Counter>() == Some(self)
    }

    fn hash_contents(&self, mut state: &mut dyn Hasher) {
        self.0.hash(&mut state);
    }
}

/// A `test.Point` struct with integer fields `x` and `y`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// The `x` field
    pub x: i64,
    /// The `y` field
    pub y: i64,
}

impl Point {
    /// Name of the struct type
    pub const TYPE_NAME: &'static str = "test.Point";

    /// A point at `(x, y)`
    pub fn value(x: i64, y: i64) -> StructValue {
        StructValue::new(Point { x, y })
    }

    fn field(&self, name: &str) -> ValueResult<i64> {
        match name {
            "x" => Ok(self.x),
            "y" => Ok(self.y),
            _ => Err(ValueError::not_found(format!("no_such_field : {name}"))),
        }
    }
}

impl StructValueInterface for Point {
    fn get_type(&self) -> StructType {
        StructType::new(Self::TYPE_NAME)
    }

    fn get_field_by_name(&self, _factory: &dyn ValueFactory, name: &str) -> ValueResult<Value> {
        self.field(name).map(Value::from)
    }

    fn has_field_by_name(&self, name: &str) -> ValueResult<bool> {
        self.field(name).map(|value| value != 0)
    }

    fn for_each_field(
        &self,
        _factory: &dyn ValueFactory,
        callback: &mut dyn FnMut(&str, ValueView<'_>) -> ValueResult<bool>,
    ) -> ValueResult<()> {
        for (name, value) in [("x", self.x), ("y", self.y)] {
            if value != 0 && !callback(name, ValueView::from(value))? {
                break;
            }
        }
        Ok(())
    }
}
