//! Error values
//!
//! An evaluation error is a value like any other so that it can flow
//! through expressions, but it must never cross a serialization boundary.

use super::{borrowed_view, Serializable};
use crate::json::Json;
use crate::kind::ValueKind;
use crate::types::Type;
use crate::{ValueError, ValueResult};
use bytes::BytesMut;
use std::fmt;
use std::sync::Arc;

/// An error carried as a value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorValue(Arc<ValueError>);

impl Default for ErrorValue {
    fn default() -> Self {
        ErrorValue::new(ValueError::unknown("unknown error"))
    }
}

impl ErrorValue {
    /// Kind of every value of this alternative
    pub const KIND: ValueKind = ValueKind::Error;

    /// Wrap `error`
    pub fn new(error: ValueError) -> Self {
        ErrorValue(Arc::new(error))
    }

    /// The carried error
    pub fn error(&self) -> &ValueError {
        &self.0
    }

    /// The kind of the value
    pub fn kind(&self) -> ValueKind {
        Self::KIND
    }

    /// The type of the value
    pub fn get_type(&self) -> Type {
        Type::Error
    }

    /// Rendering for diagnostics
    pub fn debug_string(&self) -> String {
        self.0.to_string()
    }
}

impl Serializable for ErrorValue {
    fn get_serialized_size(&self) -> ValueResult<usize> {
        Err(ValueError::unserializable(Type::Error.name()))
    }

    fn serialize_to(&self, _buffer: &mut BytesMut) -> ValueResult<()> {
        Err(ValueError::unserializable(Type::Error.name()))
    }

    fn get_type_url(&self, _prefix: &str) -> ValueResult<String> {
        Err(ValueError::unserializable(Type::Error.name()))
    }

    fn convert_to_json(&self) -> ValueResult<Json> {
        Err(ValueError::not_convertible_to_json(Type::Error.name()))
    }
}

impl From<ValueError> for ErrorValue {
    fn from(error: ValueError) -> Self {
        ErrorValue::new(error)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

borrowed_view!(
    /// A borrowed error value
    ErrorValueView => ErrorValue
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn test_default_error() {
        assert_eq!(ErrorValue::default().debug_string(), "UNKNOWN: unknown error");
    }

    #[test]
    fn test_every_entry_point_refuses() {
        let value = ErrorValue::new(ValueError::invalid_argument("boom"));
        let err = value.serialize().unwrap_err();
        assert_eq!(err.code(), ErrorCode::FailedPrecondition);
        assert_eq!(err.message(), "*error* is unserializable");
        assert!(value.get_serialized_size().is_err());
        assert!(value.get_type_url("type.googleapis.com/").is_err());
        assert!(value.convert_to_any("type.googleapis.com/").is_err());
        assert_eq!(
            value.convert_to_json().unwrap_err().to_string(),
            "FAILED_PRECONDITION: *error* is not convertable to JSON"
        );
    }
}
