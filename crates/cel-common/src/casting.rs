//! Kind-checked downcasts
//!
//! [`instance_of`] asks whether a value (or view) holds a given alternative,
//! [`cast`] extracts it and treats a mismatch as a bug, and [`try_cast`]
//! extracts it if present. Casting a `Value` yields owning alternatives and
//! casting a `ValueView` yields view alternatives.
//!
//! ```
//! use cel_common::{cast, instance_of, IntValue, Value};
//!
//! let value = Value::from(7i64);
//! assert!(instance_of::<IntValue, _>(&value));
//! assert_eq!(cast::<IntValue, _>(&value).native_value(), 7);
//! ```

use crate::kind::ValueKind;
use crate::values::{
    BoolValue, BytesValue, BytesValueView, DoubleValue, DurationValue, ErrorValue, ErrorValueView,
    IntValue, ListValue, ListValueView, MapValue, MapValueView, NullValue, OpaqueValue,
    OpaqueValueView, OptionalValue, OptionalValueView, StringValue, StringValueView, StructValue,
    StructValueView, TimestampValue, TypeValue, TypeValueView, UintValue, UnknownValue,
    UnknownValueView, Value, ValueView,
};

/// A source that casts can inspect
pub trait CastSource {
    /// Kind of the source, used in cast failure messages
    fn source_kind(&self) -> ValueKind;
}

impl CastSource for Value {
    fn source_kind(&self) -> ValueKind {
        self.kind()
    }
}

impl CastSource for ValueView<'_> {
    fn source_kind(&self) -> ValueKind {
        self.kind()
    }
}

impl CastSource for OpaqueValue {
    fn source_kind(&self) -> ValueKind {
        ValueKind::Opaque
    }
}

/// An alternative that can be extracted from `S`
pub trait CastFrom<S: ?Sized>: Sized {
    /// Whether `source` holds a `Self`
    fn instance_of(source: &S) -> bool;

    /// `source` as a `Self`, if it holds one
    fn try_cast_from(source: &S) -> Option<Self>;
}

/// Whether `source` holds the alternative `T`
pub fn instance_of<T: CastFrom<S>, S: ?Sized>(source: &S) -> bool {
    T::instance_of(source)
}

/// Extract the alternative `T` from `source`
///
/// # Panics
///
/// When `source` does not hold `T`; check with [`instance_of`] first or use
/// [`try_cast`].
pub fn cast<T: CastFrom<S>, S: CastSource + ?Sized>(source: &S) -> T {
    match T::try_cast_from(source) {
        Some(alternative) => alternative,
        None => panic!(
            "cannot cast {} value to {}",
            source.source_kind(),
            std::any::type_name::<T>()
        ),
    }
}

/// Extract the alternative `T` from `source`, if it holds one
pub fn try_cast<T: CastFrom<S>, S: ?Sized>(source: &S) -> Option<T> {
    T::try_cast_from(source)
}

impl Value {
    /// Whether the value holds a `T`
    pub fn is<T: CastFrom<Value>>(&self) -> bool {
        instance_of::<T, _>(self)
    }

    /// See [`cast`]
    pub fn cast<T: CastFrom<Value>>(&self) -> T {
        cast::<T, _>(self)
    }

    /// The value as a `T`, if it holds one
    pub fn try_as<T: CastFrom<Value>>(&self) -> Option<T> {
        try_cast::<T, _>(self)
    }
}

impl<'a> ValueView<'a> {
    /// Whether the view holds a `T`
    pub fn is<T: CastFrom<ValueView<'a>>>(&self) -> bool {
        instance_of::<T, _>(self)
    }

    /// See [`cast`]
    pub fn cast<T: CastFrom<ValueView<'a>>>(&self) -> T {
        cast::<T, _>(self)
    }

    /// The view as a `T`, if it holds one
    pub fn try_as<T: CastFrom<ValueView<'a>>>(&self) -> Option<T> {
        try_cast::<T, _>(self)
    }
}

/// Implements casts from `Value` to an owning alternative and from
/// `ValueView` to the matching view alternative
macro_rules! alternative_casts {
    (@owned $variant:ident => $owned:ty) => {
        impl CastFrom<Value> for $owned {
            fn instance_of(source: &Value) -> bool {
                matches!(source, Value::$variant(_))
            }

            fn try_cast_from(source: &Value) -> Option<Self> {
                match source {
                    Value::$variant(alternative) => Some(alternative.clone()),
                    _ => None,
                }
            }
        }
    };
    (@view $variant:ident => $($view:tt)+) => {
        impl<'a> CastFrom<ValueView<'a>> for $($view)+ {
            fn instance_of(source: &ValueView<'a>) -> bool {
                matches!(source, ValueView::$variant(_))
            }

            fn try_cast_from(source: &ValueView<'a>) -> Option<Self> {
                match source {
                    ValueView::$variant(alternative) => Some(*alternative),
                    _ => None,
                }
            }
        }
    };
    (scalar $($variant:ident => $scalar:ident),* $(,)?) => {
        $(
            alternative_casts!(@owned $variant => $scalar);
            alternative_casts!(@view $variant => $scalar);
        )*
    };
    (borrowed $($variant:ident => $owned:ident, $view:ident),* $(,)?) => {
        $(
            alternative_casts!(@owned $variant => $owned);
            alternative_casts!(@view $variant => $view<'a>);
        )*
    };
}

alternative_casts!(scalar
    Null => NullValue,
    Bool => BoolValue,
    Int => IntValue,
    Uint => UintValue,
    Double => DoubleValue,
    Duration => DurationValue,
    Timestamp => TimestampValue,
);

alternative_casts!(borrowed
    String => StringValue, StringValueView,
    Bytes => BytesValue, BytesValueView,
    Error => ErrorValue, ErrorValueView,
    Unknown => UnknownValue, UnknownValueView,
    Type => TypeValue, TypeValueView,
    List => ListValue, ListValueView,
    Map => MapValue, MapValueView,
    Opaque => OpaqueValue, OpaqueValueView,
    Struct => StructValue, StructValueView,
);

impl CastFrom<Value> for OptionalValue {
    fn instance_of(source: &Value) -> bool {
        matches!(source, Value::Opaque(opaque) if OptionalValue::is_optional(opaque))
    }

    fn try_cast_from(source: &Value) -> Option<Self> {
        match source {
            Value::Opaque(opaque) => OptionalValue::from_opaque(opaque),
            _ => None,
        }
    }
}

impl CastFrom<OpaqueValue> for OptionalValue {
    fn instance_of(source: &OpaqueValue) -> bool {
        OptionalValue::is_optional(source)
    }

    fn try_cast_from(source: &OpaqueValue) -> Option<Self> {
        OptionalValue::from_opaque(source)
    }
}

impl<'a> CastFrom<ValueView<'a>> for OptionalValueView<'a> {
    fn instance_of(source: &ValueView<'a>) -> bool {
        matches!(source, ValueView::Opaque(opaque) if OptionalValue::is_optional(opaque))
    }

    fn try_cast_from(source: &ValueView<'a>) -> Option<Self> {
        match source {
            ValueView::Opaque(opaque) => OptionalValueView::from_opaque(opaque.inner()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueError;

    #[test]
    fn test_value_casts() {
        let value = Value::from(true);
        assert!(value.is::<BoolValue>());
        assert!(!value.is::<IntValue>());
        assert!(value.cast::<BoolValue>().native_value());
        assert!(value.try_as::<StringValue>().is_none());
    }

    #[test]
    fn test_view_casts_share_lifetime() {
        let value = Value::from("hello");
        let view = value.as_view();
        let string: StringValueView<'_> = view.cast();
        assert_eq!(string.as_str(), "hello");
        assert!(instance_of::<StringValueView<'_>, _>(&view));
        assert!(try_cast::<IntValue, _>(&view).is_none());
    }

    #[test]
    fn test_error_cast() {
        let value = Value::Error(ErrorValue::new(ValueError::not_found("x")));
        assert_eq!(
            cast::<ErrorValue, _>(&value).error().code(),
            crate::ErrorCode::NotFound
        );
    }

    #[test]
    fn test_optional_casts() {
        let value = Value::from(OptionalValue::of(Value::from(1i64)));
        assert!(value.is::<OpaqueValue>());
        assert!(value.is::<OptionalValue>());
        assert!(value.cast::<OptionalValue>().has_value());
        assert!(value.as_view().cast::<OptionalValueView<'_>>().has_value());

        let Value::Opaque(opaque) = &value else {
            panic!("optional is an opaque");
        };
        assert!(instance_of::<OptionalValue, _>(opaque));
        assert!(!Value::from(1i64).is::<OptionalValue>());
    }

    #[test]
    #[should_panic(expected = "cannot cast int value to")]
    fn test_cast_mismatch_panics() {
        let value = Value::from(1i64);
        let _ = cast::<StringValue, _>(&value);
    }
}
