//! CEL value and type core
//!
//! This crate provides the runtime representation of Common Expression
//! Language values and types, shared by the evaluator, extension functions
//! and host bindings:
//!
//! - **Kinds**: closed tags for values and types plus runtime type identity
//!   for extension implementations (`kind` module)
//! - **Types**: the static type of every value (`types` module)
//! - **Values**: the owning [`Value`] and the borrowing [`ValueView`], with
//!   inline scalars and shared extension kinds (`values` module)
//! - **Casting**: kind-checked downcasts between values and their
//!   alternatives (`casting` module)
//! - **Serialization**: protobuf wire encoding, JSON projection and `Any`
//!   envelopes (`Serializable`, `json`, `any` modules)
//! - **Factories**: value and type construction with process-local caches
//!   (`value_factory` module)

pub mod any;
pub mod casting;
pub mod json;
pub mod kind;
pub mod time;
pub mod types;
pub mod value_factory;
pub mod values;

mod literal;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(test)]
mod property_tests;

// Re-export main types
pub use any::{make_type_url, make_type_url_with_prefix, Any, TYPE_GOOGLE_APIS_COM_PREFIX};
pub use casting::{cast, instance_of, try_cast, CastFrom};
pub use json::{Json, JsonArray, JsonObject};
pub use kind::{NativeTypeId, TypeKind, ValueKind};
pub use types::{
    ListType, MapType, OpaqueType, OptionalType, StructType, Type, TypeFactory,
};
pub use value_factory::{ValueFactory, ValueManager};
pub use values::{
    check_key, AttributeTrail, BoolValue, BytesValue, BytesValueView, DoubleValue,
    DurationValue, ErrorValue, ErrorValueView, FunctionResult, IntValue, ListValue,
    ListValueBuilder, ListValueInterface, ListValueIterator, ListValueView, MapValue,
    MapValueBuilder, MapValueInterface, MapValueView, NullValue, OpaqueValue,
    OpaqueValueInterface, OpaqueValueView, OptionalValue, OptionalValueView, Serializable,
    StringValue, StringValueView, StructValue, StructValueInterface, StructValueView,
    TimestampValue, TypeValue, TypeValueView, UintValue, UnknownValue, UnknownValueView, Value,
    ValueIterator, ValueView,
};

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Canonical classification of a [`ValueError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Bad input: out-of-range index, invalid map key, bad number
    InvalidArgument,
    /// The operation is not valid for the value in its current form
    FailedPrecondition,
    /// The implementation does not support the operation
    Unimplemented,
    /// A lookup did not find its key or field
    NotFound,
    /// An entry already exists
    AlreadyExists,
    /// Anything else
    Unknown,
}

impl ErrorCode {
    /// The canonical upper-case name of the code
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::Unimplemented => "UNIMPLEMENTED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during value operations
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq, Hash)]
pub enum ValueError {
    /// Bad input: out-of-range index, invalid key, malformed number
    #[error("INVALID_ARGUMENT: {message}")]
    InvalidArgument {
        /// Description of the failure
        message: String,
    },

    /// The value cannot undergo the operation in its current form
    #[error("FAILED_PRECONDITION: {message}")]
    FailedPrecondition {
        /// Description of the failure
        message: String,
    },

    /// The implementation does not support the operation
    #[error("UNIMPLEMENTED: {message}")]
    Unimplemented {
        /// Description of the failure
        message: String,
    },

    /// A key or field lookup found nothing
    #[error("NOT_FOUND: {message}")]
    NotFound {
        /// Description of the failure
        message: String,
    },

    /// An entry with the same key already exists
    #[error("ALREADY_EXISTS: {message}")]
    AlreadyExists {
        /// Description of the failure
        message: String,
    },

    /// Any other failure
    #[error("UNKNOWN: {message}")]
    Unknown {
        /// Description of the failure
        message: String,
    },
}

impl ValueError {
    /// An `InvalidArgument` error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ValueError::InvalidArgument {
            message: message.into(),
        }
    }

    /// A `FailedPrecondition` error
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        ValueError::FailedPrecondition {
            message: message.into(),
        }
    }

    /// An `Unimplemented` error
    pub fn unimplemented(message: impl Into<String>) -> Self {
        ValueError::Unimplemented {
            message: message.into(),
        }
    }

    /// A `NotFound` error
    pub fn not_found(message: impl Into<String>) -> Self {
        ValueError::NotFound {
            message: message.into(),
        }
    }

    /// An `AlreadyExists` error
    pub fn already_exists(message: impl Into<String>) -> Self {
        ValueError::AlreadyExists {
            message: message.into(),
        }
    }

    /// An `Unknown` error
    pub fn unknown(message: impl Into<String>) -> Self {
        ValueError::Unknown {
            message: message.into(),
        }
    }

    /// The error's classification
    pub fn code(&self) -> ErrorCode {
        match self {
            ValueError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            ValueError::FailedPrecondition { .. } => ErrorCode::FailedPrecondition,
            ValueError::Unimplemented { .. } => ErrorCode::Unimplemented,
            ValueError::NotFound { .. } => ErrorCode::NotFound,
            ValueError::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            ValueError::Unknown { .. } => ErrorCode::Unknown,
        }
    }

    /// The message without the code prefix
    pub fn message(&self) -> &str {
        match self {
            ValueError::InvalidArgument { message }
            | ValueError::FailedPrecondition { message }
            | ValueError::Unimplemented { message }
            | ValueError::NotFound { message }
            | ValueError::AlreadyExists { message }
            | ValueError::Unknown { message } => message,
        }
    }

    /// Error returned by every serialization entry point of a value that
    /// must never reach a wire boundary
    pub(crate) fn unserializable(type_name: &str) -> Self {
        tracing::debug!(type_name, "refusing to serialize diagnostic value");
        ValueError::failed_precondition(format!("{type_name} is unserializable"))
    }

    /// Error returned by JSON conversion of a value with no JSON form
    pub(crate) fn not_convertible_to_json(type_name: &str) -> Self {
        tracing::debug!(type_name, "refusing to convert diagnostic value to JSON");
        ValueError::failed_precondition(format!("{type_name} is not convertable to JSON"))
    }
}
