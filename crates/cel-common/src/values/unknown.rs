//! Unknown values
//!
//! An unknown records which inputs an expression needed but did not have:
//! attribute paths that were marked unknown and function calls whose
//! results were not available. Unknowns merge as they flow through an
//! expression.

use super::{borrowed_view, Serializable};
use crate::json::Json;
use crate::kind::ValueKind;
use crate::types::Type;
use crate::{ValueError, ValueResult};
use bytes::BytesMut;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Path to an attribute, e.g. `request.auth.claims`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeTrail(Arc<str>);

impl AttributeTrail {
    /// Trail rooted at a variable
    pub fn new(variable: &str) -> Self {
        AttributeTrail(variable.into())
    }

    /// Trail extended by a field selection
    pub fn select(&self, field: &str) -> Self {
        AttributeTrail(format!("{}.{field}", self.0).into())
    }

    /// The dotted path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An unavailable function result, identified by the call's expression id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionResult {
    function: Arc<str>,
    expr_id: i64,
}

impl FunctionResult {
    /// The result of the call to `function` at `expr_id`
    pub fn new(function: &str, expr_id: i64) -> Self {
        FunctionResult {
            function: function.into(),
            expr_id,
        }
    }

    /// Name of the called function
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Expression id of the call
    pub fn expr_id(&self) -> i64 {
        self.expr_id
    }
}

#[derive(Debug, Default, PartialEq, Eq, Hash)]
struct UnknownData {
    attributes: BTreeSet<AttributeTrail>,
    function_results: BTreeSet<FunctionResult>,
}

/// Attributes and function results whose values are not yet known
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UnknownValue(Arc<UnknownData>);

impl UnknownValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Unknown;

    /// An unknown made of `attributes` and `function_results`
    pub fn new(
        attributes: impl IntoIterator<Item = AttributeTrail>,
        function_results: impl IntoIterator<Item = FunctionResult>,
    ) -> Self {
        UnknownValue(Arc::new(UnknownData {
            attributes: attributes.into_iter().collect(),
            function_results: function_results.into_iter().collect(),
        }))
    }

    /// The unknown attributes, in order
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeTrail> {
        self.0.attributes.iter()
    }

    /// The unknown function results, in order
    pub fn function_results(&self) -> impl Iterator<Item = &FunctionResult> {
        self.0.function_results.iter()
    }

    /// Union of two unknowns
    pub fn merge(&self, other: &UnknownValue) -> UnknownValue {
        if Arc::ptr_eq(&self.0, &other.0) {
            return self.clone();
        }
        UnknownValue::new(
            self.attributes().chain(other.attributes()).cloned(),
            self.function_results()
                .chain(other.function_results())
                .cloned(),
        )
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Unknown
    }

    /// Unknowns render as nothing
    pub fn debug_string(&self) -> String {
        String::new()
    }
}

impl Serializable for UnknownValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Err(ValueError::unserializable(Type::Unknown.name()))
    }

    fn serialize_to(&self, _buffer: &mut BytesMut) -> ValueResult<()> {
        Err(ValueError::unserializable(Type::Unknown.name()))
    }

    fn get_type_url(&self, _prefix: &str) -> ValueResult<String> {
        Err(ValueError::unserializable(Type::Unknown.name()))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Err(ValueError::not_convertible_to_json(Type::Unknown.name()))
    }
}

borrowed_view!(
    /// A borrowed unknown value
    UnknownValueView => UnknownValue
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_a_union() {
        let request = AttributeTrail::new("request");
        let a = UnknownValue::new([request.select("auth")], []);
        let b = UnknownValue::new(
            [request.select("auth"), request.select("path")],
            [FunctionResult::new("now", 4)],
        );
        let merged = a.merge(&b);
        let attributes: Vec<&str> = merged.attributes().map(AttributeTrail::as_str).collect();
        assert_eq!(attributes, vec!["request.auth", "request.path"]);
        assert_eq!(merged.function_results().count(), 1);
    }

    #[test]
    fn test_unknown_refuses_serialization() {
        let value = UnknownValue::default();
        assert_eq!(value.debug_string(), "");
        assert_eq!(
            value.serialize().unwrap_err().message(),
            "*unknown* is unserializable"
        );
        assert!(value.convert_to_json().is_err());
    }
}
