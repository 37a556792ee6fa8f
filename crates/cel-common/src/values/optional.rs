//! Optional values: an opaque holding zero or one value

use super::{OpaqueValue, OpaqueValueInterface, Value};
use crate::kind::NativeTypeId;
use crate::types::{OpaqueType, OptionalType, TypeFactory};
use crate::value_factory::{ValueFactory, ValueManager};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

#[derive(Debug)]
struct OptionalValueImpl {
    optional_type: OptionalType,
    value: Option<Value>,
}

impl OpaqueValueInterface for OptionalValueImpl {
    fn get_type(&self) -> OpaqueType {
        self.optional_type.clone().into()
    }

    fn debug_string(&self) -> String {
        match &self.value {
            Some(value) => format!("optional({})", value.debug_string()),
            None => "optional.none()".to_string(),
        }
    }

    fn equals(&self, other: &dyn OpaqueValueInterface) -> bool {
        other
            .downcast_ref::<OptionalValueImpl>()
            .is_some_and(|other| match (&self.value, &other.value) {
                (Some(a), Some(b)) => a == b,
                (None, None) => true,
                _ => false,
            })
    }

    fn hash_contents(&self, mut state: &mut dyn Hasher) {
        self.value.is_some().hash(&mut state);
        if let Some(value) = &self.value {
            value.hash(&mut state);
        }
    }
}

fn optional_impl(opaque: &OpaqueValue) -> Option<&OptionalValueImpl> {
    opaque.downcast_ref::<OptionalValueImpl>()
}

/// An opaque value that either holds a value or is empty
#[derive(Debug, Clone)]
pub struct OptionalValue(OpaqueValue);

impl OptionalValue {
    /// An optional holding `value`
    pub fn of(value: Value) -> Self {
        OptionalValue(OpaqueValue::new(OptionalValueImpl {
            optional_type: ValueManager::shared().get_dyn_optional_type(),
            value: Some(value),
        }))
    }

    /// The empty `optional_type<dyn>`
    pub fn none() -> Self {
        ValueManager::shared().get_zero_dyn_optional_value()
    }

    /// The empty optional of `optional_type`
    pub(crate) fn empty(optional_type: OptionalType) -> Self {
        OptionalValue(OpaqueValue::new(OptionalValueImpl {
            optional_type,
            value: None,
        }))
    }

    /// Whether `opaque` is an optional
    pub fn is_optional(opaque: &OpaqueValue) -> bool {
        opaque.native_type_id() == NativeTypeId::of::<OptionalValueImpl>()
    }

    /// Reinterpret an opaque value, when it is an optional
    pub fn from_opaque(opaque: &OpaqueValue) -> Option<Self> {
        Self::is_optional(opaque).then(|| OptionalValue(opaque.clone()))
    }

    /// Whether the optional holds a value
    pub fn has_value(&self) -> bool {
        self.value().is_some()
    }

    /// The held value, if any
    pub fn value(&self) -> Option<&Value> {
        optional_impl(&self.0).and_then(|o| o.value.as_ref())
    }

    /// The type of the value
    pub fn get_type(&self) -> OptionalType {
        OptionalType::from_opaque(&self.0.get_type()).unwrap_or_default()
    }

    /// The optional as the opaque value it is
    pub fn as_opaque(&self) -> &OpaqueValue {
        &self.0
    }

    /// Convert into the opaque value it is
    pub fn into_opaque(self) -> OpaqueValue {
        self.0
    }
}

impl Deref for OptionalValue {
    type Target = OpaqueValue;

    fn deref(&self) -> &OpaqueValue {
        &self.0
    }
}

impl From<OptionalValue> for OpaqueValue {
    fn from(value: OptionalValue) -> Self {
        value.0
    }
}

impl From<OptionalValue> for Value {
    fn from(value: OptionalValue) -> Self {
        Value::Opaque(value.0)
    }
}

impl fmt::Display for OptionalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

/// A borrowed optional value
#[derive(Debug, Clone, Copy)]
pub struct OptionalValueView<'a>(&'a OpaqueValue);

impl<'a> OptionalValueView<'a> {
    pub(crate) fn from_opaque(opaque: &'a OpaqueValue) -> Option<Self> {
        OptionalValue::is_optional(opaque).then_some(OptionalValueView(opaque))
    }

    /// Whether the optional holds a value
    pub fn has_value(self) -> bool {
        self.value().is_some()
    }

    /// The held value, if any
    pub fn value(self) -> Option<&'a Value> {
        optional_impl(self.0).and_then(|o| o.value.as_ref())
    }

    /// Share ownership of the viewed optional
    pub fn to_owned_value(self) -> OptionalValue {
        OptionalValue(self.0.clone())
    }
}

impl Deref for OptionalValueView<'_> {
    type Target = OpaqueValue;

    fn deref(&self) -> &OpaqueValue {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn test_debug_strings() {
        assert_eq!(OptionalValue::of(Value::from(true)).debug_string(), "optional(true)");
        assert_eq!(OptionalValue::none().debug_string(), "optional.none()");
    }

    #[test]
    fn test_contents() {
        let some = OptionalValue::of(Value::from(1i64));
        assert!(some.has_value());
        assert_eq!(some.value().map(Value::debug_string).as_deref(), Some("1"));
        assert!(!OptionalValue::none().has_value());
        assert_eq!(some.get_type(), OptionalType::new(Type::Dyn));
    }

    #[test]
    fn test_equality_by_contents() {
        let a = OptionalValue::of(Value::from(1i64));
        let b = OptionalValue::of(Value::from(1u64));
        let c = OptionalValue::of(Value::from(2i64));
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert!(OptionalValue::none().equals(&OptionalValue::none()));
        assert!(!a.equals(&OptionalValue::none()));
    }

    #[test]
    fn test_from_opaque() {
        let value: Value = OptionalValue::none().into();
        let Value::Opaque(opaque) = &value else {
            panic!("optional is an opaque");
        };
        assert!(OptionalValue::from_opaque(opaque).is_some());
        assert!(OptionalValueView::from_opaque(opaque).is_some_and(|v| !v.has_value()));
    }
}
