//! Types as values

use super::{borrowed_view, Serializable};
use crate::json::Json;
use crate::kind::ValueKind;
use crate::types::Type;
use crate::{ValueError, ValueResult};
use bytes::BytesMut;
use std::fmt;

/// A type used as a value, e.g. the result of `type(x)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeValue(Type);

impl TypeValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Type;

    /// Wrap `value`
    pub fn new(value: Type) -> Self {
        TypeValue(value)
    }

    /// The underlying native value
    pub fn native_value(&self) -> &Type {
        &self.0
    }

    /// Name of the denoted type
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Type
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.debug_string()
    }
}

impl Serializable for TypeValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Err(ValueError::unserializable(Type::Type.name()))
    }

    fn serialize_to(&self, _buffer: &mut BytesMut) -> ValueResult<()> {
        Err(ValueError::unserializable(Type::Type.name()))
    }

    fn get_type_url(&self, _prefix: &str) -> ValueResult<String> {
        Err(ValueError::unserializable(Type::Type.name()))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Err(ValueError::not_convertible_to_json(Type::Type.name()))
    }
}

impl From<Type> for TypeValue {
    fn from(value: Type) -> Self {
        TypeValue(value)
    }
}

impl fmt::Display for TypeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

borrowed_view!(
    /// A borrowed type value
    TypeValueView => TypeValue
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ListType;

    #[test]
    fn test_type_value_debug_string() {
        assert_eq!(TypeValue::new(Type::Bool).debug_string(), "bool");
        assert_eq!(
            TypeValue::new(ListType::new(Type::Int).into()).debug_string(),
            "list<int>"
        );
    }

    #[test]
    fn test_type_value_refuses_serialization() {
        let value = TypeValue::new(Type::Int);
        assert_eq!(
            value.serialize().unwrap_err().message(),
            "type is unserializable"
        );
        assert_eq!(
            value.convert_to_json().unwrap_err().message(),
            "type is not convertable to JSON"
        );
    }
}
