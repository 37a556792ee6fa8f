//! Equality, ordering and hashing
//!
//! Values compare by kind with one exception: int, uint and double compare
//! by mathematical value, so `1 == 1u == 1.0`. Lists compare elementwise and
//! maps by key set and values. Ordering is only defined within a kind (and
//! across numeric kinds). Hashing agrees with equality.

use super::{ListValue, MapValue, Value, ValueView};
use crate::value_factory::ValueManager;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compare an `i64` against an `f64` without losing precision
fn compare_int_double(i: i64, d: f64) -> Option<Ordering> {
    if d.is_nan() {
        return None;
    }
    // 2^63 as a double; every finite double outside [-2^63, 2^63) is out of
    // range for i64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if d >= LIMIT {
        return Some(Ordering::Less);
    }
    if d < -LIMIT {
        return Some(Ordering::Greater);
    }
    let truncated = d.trunc();
    Some(i.cmp(&(truncated as i64)).then_with(|| {
        if d > truncated {
            Ordering::Less
        } else if d < truncated {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

/// Compare a `u64` against an `f64` without losing precision
fn compare_uint_double(u: u64, d: f64) -> Option<Ordering> {
    if d.is_nan() {
        return None;
    }
    const LIMIT: f64 = 18_446_744_073_709_551_616.0;
    if d >= LIMIT {
        return Some(Ordering::Less);
    }
    if d < 0.0 {
        return Some(Ordering::Greater);
    }
    let truncated = d.trunc();
    Some(u.cmp(&(truncated as u64)).then_with(|| {
        if d > truncated {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }))
}

fn compare_int_uint(i: i64, u: u64) -> Ordering {
    if i < 0 {
        Ordering::Less
    } else {
        (i as u64).cmp(&u)
    }
}

fn compare_numbers(a: ValueView<'_>, b: ValueView<'_>) -> Option<Option<Ordering>> {
    use ValueView::{Double, Int, Uint};
    Some(match (a, b) {
        (Int(x), Int(y)) => Some(x.native_value().cmp(&y.native_value())),
        (Uint(x), Uint(y)) => Some(x.native_value().cmp(&y.native_value())),
        (Double(x), Double(y)) => x.native_value().partial_cmp(&y.native_value()),
        (Int(x), Uint(y)) => Some(compare_int_uint(x.native_value(), y.native_value())),
        (Uint(x), Int(y)) => Some(compare_int_uint(y.native_value(), x.native_value()).reverse()),
        (Int(x), Double(y)) => compare_int_double(x.native_value(), y.native_value()),
        (Double(x), Int(y)) => {
            compare_int_double(y.native_value(), x.native_value()).map(Ordering::reverse)
        }
        (Uint(x), Double(y)) => compare_uint_double(x.native_value(), y.native_value()),
        (Double(x), Uint(y)) => {
            compare_uint_double(y.native_value(), x.native_value()).map(Ordering::reverse)
        }
        _ => return None,
    })
}

fn list_equals(a: &ListValue, b: &ListValue) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if a.size() != b.size() {
        return false;
    }
    let factory = ValueManager::shared();
    (0..a.size()).all(|index| match (a.get(factory, index), b.get(factory, index)) {
        (Ok(x), Ok(y)) => view_equals(x.as_view(), y.as_view()),
        _ => false,
    })
}

fn map_equals(a: &MapValue, b: &MapValue) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if a.size() != b.size() {
        return false;
    }
    let factory = ValueManager::shared();
    let mut equal = true;
    let visited = a.for_each(factory, |key, value| {
        equal = matches!(
            b.find(factory, key),
            Ok((theirs, true)) if view_equals(value, theirs.as_view())
        );
        Ok(equal)
    });
    visited.is_ok() && equal
}

pub(crate) fn view_equals(a: ValueView<'_>, b: ValueView<'_>) -> bool {
    if let Some(ordering) = compare_numbers(a, b) {
        return ordering == Some(Ordering::Equal);
    }
    match (a, b) {
        (ValueView::Null(_), ValueView::Null(_)) => true,
        (ValueView::Bool(x), ValueView::Bool(y)) => x == y,
        (ValueView::String(x), ValueView::String(y)) => x == y,
        (ValueView::Bytes(x), ValueView::Bytes(y)) => x == y,
        (ValueView::Duration(x), ValueView::Duration(y)) => x == y,
        (ValueView::Timestamp(x), ValueView::Timestamp(y)) => x == y,
        (ValueView::Type(x), ValueView::Type(y)) => x.native_value() == y.native_value(),
        (ValueView::Error(x), ValueView::Error(y)) => x.inner() == y.inner(),
        (ValueView::Unknown(x), ValueView::Unknown(y)) => x.inner() == y.inner(),
        (ValueView::List(x), ValueView::List(y)) => list_equals(x.inner(), y.inner()),
        (ValueView::Map(x), ValueView::Map(y)) => map_equals(x.inner(), y.inner()),
        (ValueView::Opaque(x), ValueView::Opaque(y)) => x.equals(y.inner()),
        (ValueView::Struct(x), ValueView::Struct(y)) => x.equals(y.inner()),
        _ => false,
    }
}

pub(crate) fn view_compare(a: ValueView<'_>, b: ValueView<'_>) -> Option<Ordering> {
    if let Some(ordering) = compare_numbers(a, b) {
        return ordering;
    }
    match (a, b) {
        (ValueView::Null(_), ValueView::Null(_)) => Some(Ordering::Equal),
        (ValueView::Bool(x), ValueView::Bool(y)) => Some(x.cmp(&y)),
        (ValueView::String(x), ValueView::String(y)) => Some(x.cmp(&y)),
        (ValueView::Bytes(x), ValueView::Bytes(y)) => Some(x.cmp(&y)),
        (ValueView::Duration(x), ValueView::Duration(y)) => Some(x.cmp(&y)),
        (ValueView::Timestamp(x), ValueView::Timestamp(y)) => Some(x.cmp(&y)),
        _ => view_equals(a, b).then_some(Ordering::Equal),
    }
}

/// Stable discriminants so that different kinds rarely collide
mod tag {
    pub const NULL: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const NUMBER: u8 = 2;
    pub const FRACTION: u8 = 3;
    pub const STRING: u8 = 4;
    pub const BYTES: u8 = 5;
    pub const DURATION: u8 = 6;
    pub const TIMESTAMP: u8 = 7;
    pub const TYPE: u8 = 8;
    pub const ERROR: u8 = 9;
    pub const UNKNOWN: u8 = 10;
    pub const LIST: u8 = 11;
    pub const MAP: u8 = 12;
    pub const OPAQUE: u8 = 13;
    pub const STRUCT: u8 = 14;
}

/// Hash a double so that integral doubles hash like the equal integer
fn hash_double<H: Hasher>(d: f64, state: &mut H) {
    // Doubles in this range with no fraction are exact i128 values
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    if d.fract() == 0.0 && d.abs() < LIMIT {
        tag::NUMBER.hash(state);
        (d as i128).hash(state);
    } else {
        tag::FRACTION.hash(state);
        // all NaNs are unequal to everything, collapse them
        if d.is_nan() {
            f64::NAN.to_bits().hash(state);
        } else {
            d.to_bits().hash(state);
        }
    }
}

pub(crate) fn hash_view<H: Hasher>(view: ValueView<'_>, state: &mut H) {
    match view {
        ValueView::Null(_) => tag::NULL.hash(state),
        ValueView::Bool(b) => {
            tag::BOOL.hash(state);
            b.native_value().hash(state);
        }
        ValueView::Int(i) => {
            tag::NUMBER.hash(state);
            i128::from(i.native_value()).hash(state);
        }
        ValueView::Uint(u) => {
            tag::NUMBER.hash(state);
            i128::from(u.native_value()).hash(state);
        }
        ValueView::Double(d) => hash_double(d.native_value(), state),
        ValueView::String(s) => {
            tag::STRING.hash(state);
            s.as_str().hash(state);
        }
        ValueView::Bytes(b) => {
            tag::BYTES.hash(state);
            b.as_bytes().hash(state);
        }
        ValueView::Duration(d) => {
            tag::DURATION.hash(state);
            d.hash(state);
        }
        ValueView::Timestamp(t) => {
            tag::TIMESTAMP.hash(state);
            t.hash(state);
        }
        ValueView::Type(t) => {
            tag::TYPE.hash(state);
            t.native_value().hash(state);
        }
        ValueView::Error(e) => {
            tag::ERROR.hash(state);
            e.inner().hash(state);
        }
        ValueView::Unknown(u) => {
            tag::UNKNOWN.hash(state);
            u.inner().hash(state);
        }
        ValueView::List(list) => {
            tag::LIST.hash(state);
            list.size().hash(state);
            let _ = list.for_each(ValueManager::shared(), |element| {
                hash_view(element, state);
                Ok(true)
            });
        }
        ValueView::Map(map) => {
            tag::MAP.hash(state);
            map.size().hash(state);
            // Entry hashes are combined commutatively so order does not matter
            let mut combined = 0u64;
            let _ = map.for_each(ValueManager::shared(), |key, value| {
                let mut entry = DefaultHasher::new();
                hash_view(key, &mut entry);
                hash_view(value, &mut entry);
                combined = combined.wrapping_add(entry.finish());
                Ok(true)
            });
            combined.hash(state);
        }
        ValueView::Opaque(o) => {
            tag::OPAQUE.hash(state);
            o.native_type_id().hash(state);
            o.interface().hash_contents(state);
        }
        ValueView::Struct(s) => {
            tag::STRUCT.hash(state);
            s.native_type_id().hash(state);
            s.interface().hash_contents(state);
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        view_equals(self.as_view(), other.as_view())
    }
}

impl<'b> PartialEq<ValueView<'b>> for ValueView<'_> {
    fn eq(&self, other: &ValueView<'b>) -> bool {
        view_equals(*self, *other)
    }
}

impl PartialEq<ValueView<'_>> for Value {
    fn eq(&self, other: &ValueView<'_>) -> bool {
        view_equals(self.as_view(), *other)
    }
}

impl PartialEq<Value> for ValueView<'_> {
    fn eq(&self, other: &Value) -> bool {
        view_equals(*self, other.as_view())
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        view_compare(self.as_view(), other.as_view())
    }
}

impl<'b> PartialOrd<ValueView<'b>> for ValueView<'_> {
    fn partial_cmp(&self, other: &ValueView<'b>) -> Option<Ordering> {
        view_compare(*self, *other)
    }
}

impl PartialOrd<ValueView<'_>> for Value {
    fn partial_cmp(&self, other: &ValueView<'_>) -> Option<Ordering> {
        view_compare(self.as_view(), *other)
    }
}

impl PartialOrd<Value> for ValueView<'_> {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        view_compare(*self, other.as_view())
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_view(self.as_view(), state);
    }
}

impl Hash for ValueView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_view(*self, state);
    }
}

impl PartialEq for ListValue {
    fn eq(&self, other: &Self) -> bool {
        list_equals(self, other)
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        map_equals(self, other)
    }
}

/// Generates equality and ordering between values, views and a native
/// literal type
macro_rules! literal_comparisons {
    ($($literal:ty),* $(,)?) => {
        $(
            impl PartialEq<$literal> for Value {
                fn eq(&self, other: &$literal) -> bool {
                    view_equals(self.as_view(), ValueView::from(*other))
                }
            }

            impl PartialEq<Value> for $literal {
                fn eq(&self, other: &Value) -> bool {
                    view_equals(ValueView::from(*self), other.as_view())
                }
            }

            impl PartialEq<$literal> for ValueView<'_> {
                fn eq(&self, other: &$literal) -> bool {
                    view_equals(*self, ValueView::from(*other))
                }
            }

            impl PartialEq<ValueView<'_>> for $literal {
                fn eq(&self, other: &ValueView<'_>) -> bool {
                    view_equals(ValueView::from(*self), *other)
                }
            }

            impl PartialOrd<$literal> for Value {
                fn partial_cmp(&self, other: &$literal) -> Option<Ordering> {
                    view_compare(self.as_view(), ValueView::from(*other))
                }
            }

            impl PartialOrd<Value> for $literal {
                fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
                    view_compare(ValueView::from(*self), other.as_view())
                }
            }

            impl PartialOrd<$literal> for ValueView<'_> {
                fn partial_cmp(&self, other: &$literal) -> Option<Ordering> {
                    view_compare(*self, ValueView::from(*other))
                }
            }

            impl PartialOrd<ValueView<'_>> for $literal {
                fn partial_cmp(&self, other: &ValueView<'_>) -> Option<Ordering> {
                    view_compare(ValueView::from(*self), *other)
                }
            }
        )*
    };
}

literal_comparisons!(bool, i64, u64, f64);

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        view_equals(self.as_view(), ValueView::from(*other))
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        view_equals(self.as_view(), ValueView::from(other))
    }
}

impl PartialEq<&str> for ValueView<'_> {
    fn eq(&self, other: &&str) -> bool {
        view_equals(*self, ValueView::from(*other))
    }
}

impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        view_equals(ValueView::from(*self), other.as_view())
    }
}

impl PartialOrd<&str> for Value {
    fn partial_cmp(&self, other: &&str) -> Option<Ordering> {
        view_compare(self.as_view(), ValueView::from(*other))
    }
}

impl PartialOrd<&str> for ValueView<'_> {
    fn partial_cmp(&self, other: &&str) -> Option<Ordering> {
        view_compare(*self, ValueView::from(*other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListType, MapType, Type};
    use crate::values::{ListValueBuilder, MapValueBuilder};
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_numeric_equality_across_kinds() {
        assert_eq!(Value::from(1i64), Value::from(1u64));
        assert_eq!(Value::from(1i64), Value::from(1.0));
        assert_eq!(Value::from(1u64), Value::from(1.0));
        assert_ne!(Value::from(-1i64), Value::from(u64::MAX));
        assert_ne!(Value::from(1i64), Value::from(1.5));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::from(i64::MAX), Value::from(9_223_372_036_854_775_808.0));
    }

    #[test]
    fn test_numeric_ordering_across_kinds() {
        assert!(Value::from(-1i64) < Value::from(0u64));
        assert!(Value::from(2u64) > Value::from(1.5));
        assert!(Value::from(1.5) < Value::from(2i64));
        assert!(Value::from(u64::MAX) < Value::from(1e20));
        assert_eq!(Value::from(1.0).partial_cmp(&Value::from(f64::NAN)), None);
    }

    #[test]
    fn test_cross_kind_is_unequal_and_unordered() {
        assert_ne!(Value::from(true), Value::from(1i64));
        assert_ne!(Value::from("1"), Value::from(1i64));
        assert_eq!(Value::from(true).partial_cmp(&Value::from("x")), None);
    }

    #[test]
    fn test_literal_comparisons() {
        let value = Value::from(true);
        assert_eq!(value, true);
        assert_eq!(value.as_view(), true);
        assert_eq!(true, value);
        assert_eq!(Value::from(3i64), 3.0);
        assert_eq!(Value::from("abc"), "abc");
        assert!(Value::from(2i64) > 1u64);
        assert!(Value::from("a") < "b");
    }

    #[test]
    fn test_hash_agrees_with_equality() {
        assert_eq!(hash_of(&Value::from(1i64)), hash_of(&Value::from(1u64)));
        assert_eq!(hash_of(&Value::from(1i64)), hash_of(&Value::from(1.0)));
        assert_eq!(hash_of(&Value::from(0.0)), hash_of(&Value::from(-0.0)));
        assert_eq!(hash_of(&Value::from("x")), hash_of(&Value::from("x")));
    }

    #[test]
    fn test_list_equality() {
        let mut a = ListValueBuilder::new(ListType::default());
        a.add(Value::from(1i64)).unwrap();
        a.add(Value::from("two")).unwrap();
        let mut b = ListValueBuilder::new(ListType::default());
        b.add(Value::from(1.0)).unwrap();
        b.add(Value::from("two")).unwrap();
        let (a, b) = (Value::List(a.build()), Value::List(b.build()));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.partial_cmp(&b), Some(Ordering::Equal));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let mut a = MapValueBuilder::new(MapType::new(Type::String, Type::Int));
        a.put(Value::from("x"), Value::from(1i64)).unwrap();
        a.put(Value::from("y"), Value::from(2i64)).unwrap();
        let mut b = MapValueBuilder::new(MapType::new(Type::String, Type::Int));
        b.put(Value::from("y"), Value::from(2i64)).unwrap();
        b.put(Value::from("x"), Value::from(1i64)).unwrap();
        let (a, b) = (Value::Map(a.build()), Value::Map(b.build()));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let mut c = MapValueBuilder::new(MapType::new(Type::String, Type::Int));
        c.put(Value::from("x"), Value::from(1i64)).unwrap();
        c.put(Value::from("z"), Value::from(2i64)).unwrap();
        assert_ne!(a, Value::Map(c.build()));
    }
}
