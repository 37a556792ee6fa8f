//! The CEL type model
//!
//! Every value has a [`Type`]. Primitive types are unit variants; list, map,
//! struct and opaque types carry their parameters behind shared pointers so
//! cloning a type is cheap. Types compare structurally.

use crate::kind::TypeKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A CEL type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `null_type`
    Null,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `uint`
    Uint,
    /// `double`
    Double,
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// `google.protobuf.Duration`
    Duration,
    /// `google.protobuf.Timestamp`
    Timestamp,
    /// The type of unknown values
    Unknown,
    /// `type`
    Type,
    /// The type of error values
    Error,
    /// `google.protobuf.Any`
    Any,
    /// `dyn`
    Dyn,
    /// `google.protobuf.BoolValue`
    BoolWrapper,
    /// `google.protobuf.Int64Value`
    IntWrapper,
    /// `google.protobuf.UInt64Value`
    UintWrapper,
    /// `google.protobuf.DoubleValue`
    DoubleWrapper,
    /// `google.protobuf.StringValue`
    StringWrapper,
    /// `google.protobuf.BytesValue`
    BytesWrapper,
    /// `list(E)`
    List(ListType),
    /// `map(K, V)`
    Map(MapType),
    /// A named message type
    Struct(StructType),
    /// A named opaque type, optionals included
    Opaque(OpaqueType),
}

impl Type {
    /// Which alternative this type holds
    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Null => TypeKind::Null,
            Type::Bool => TypeKind::Bool,
            Type::Int => TypeKind::Int,
            Type::Uint => TypeKind::Uint,
            Type::Double => TypeKind::Double,
            Type::String => TypeKind::String,
            Type::Bytes => TypeKind::Bytes,
            Type::Duration => TypeKind::Duration,
            Type::Timestamp => TypeKind::Timestamp,
            Type::Unknown => TypeKind::Unknown,
            Type::Type => TypeKind::Type,
            Type::Error => TypeKind::Error,
            Type::Any => TypeKind::Any,
            Type::Dyn => TypeKind::Dyn,
            Type::BoolWrapper => TypeKind::BoolWrapper,
            Type::IntWrapper => TypeKind::IntWrapper,
            Type::UintWrapper => TypeKind::UintWrapper,
            Type::DoubleWrapper => TypeKind::DoubleWrapper,
            Type::StringWrapper => TypeKind::StringWrapper,
            Type::BytesWrapper => TypeKind::BytesWrapper,
            Type::List(_) => TypeKind::List,
            Type::Map(_) => TypeKind::Map,
            Type::Struct(_) => TypeKind::Struct,
            Type::Opaque(_) => TypeKind::Opaque,
        }
    }

    /// The type's name: the kind name for primitives, the declared name for
    /// struct and opaque types
    pub fn name(&self) -> &str {
        match self {
            Type::Struct(t) => t.name(),
            Type::Opaque(t) => t.name(),
            other => other.kind().name(),
        }
    }

    /// Type parameters, in declaration order
    pub fn parameters(&self) -> Vec<Type> {
        match self {
            Type::List(t) => vec![t.element().clone()],
            Type::Map(t) => vec![t.key().clone(), t.value().clone()],
            Type::Opaque(t) => t.parameters().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Render the type, with parameters, e.g. `map<string, dyn>`
    pub fn debug_string(&self) -> String {
        match self {
            Type::List(t) => t.debug_string(),
            Type::Map(t) => t.debug_string(),
            Type::Opaque(t) => t.debug_string(),
            other => other.name().to_string(),
        }
    }

    /// The list type, if this is one
    pub fn as_list(&self) -> Option<&ListType> {
        match self {
            Type::List(t) => Some(t),
            _ => None,
        }
    }

    /// The map type, if this is one
    pub fn as_map(&self) -> Option<&MapType> {
        match self {
            Type::Map(t) => Some(t),
            _ => None,
        }
    }

    /// The struct type, if this is one
    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(t) => Some(t),
            _ => None,
        }
    }

    /// The opaque type, if this is one
    pub fn as_opaque(&self) -> Option<&OpaqueType> {
        match self {
            Type::Opaque(t) => Some(t),
            _ => None,
        }
    }

    /// The optional type this type denotes, if it is one
    pub fn as_optional(&self) -> Option<OptionalType> {
        self.as_opaque().and_then(OptionalType::from_opaque)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

/// `list<E>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListType {
    element: Arc<Type>,
}

impl ListType {
    /// Name of every list type
    pub const NAME: &'static str = "list";

    /// `list(element)`
    pub fn new(element: Type) -> Self {
        ListType {
            element: Arc::new(element),
        }
    }

    /// The element type
    pub fn element(&self) -> &Type {
        &self.element
    }

    /// `list(E)` with the element rendered
    pub fn debug_string(&self) -> String {
        format!("{}<{}>", Self::NAME, self.element.debug_string())
    }
}

impl Default for ListType {
    fn default() -> Self {
        ListType::new(Type::Dyn)
    }
}

/// `map<K, V>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapType {
    key: Arc<Type>,
    value: Arc<Type>,
}

impl MapType {
    /// Name of every map type
    pub const NAME: &'static str = "map";

    /// `map(key, value)`
    pub fn new(key: Type, value: Type) -> Self {
        MapType {
            key: Arc::new(key),
            value: Arc::new(value),
        }
    }

    /// The key type
    pub fn key(&self) -> &Type {
        &self.key
    }

    /// The value type
    pub fn value(&self) -> &Type {
        &self.value
    }

    /// `map(K, V)` with the parameters rendered
    pub fn debug_string(&self) -> String {
        format!(
            "{}<{}, {}>",
            Self::NAME,
            self.key.debug_string(),
            self.value.debug_string()
        )
    }
}

impl Default for MapType {
    fn default() -> Self {
        MapType::new(Type::Dyn, Type::Dyn)
    }
}

/// A message type, known by its fully qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    name: Arc<str>,
}

impl StructType {
    /// The struct type called `name`
    pub fn new(name: &str) -> Self {
        StructType { name: name.into() }
    }

    /// The fully qualified message name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A host-defined type with optional parameters, e.g. `optional_type<int>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpaqueType {
    name: Arc<str>,
    parameters: Arc<[Type]>,
}

impl OpaqueType {
    /// The opaque type `name` with `parameters`
    pub fn new(name: &str, parameters: &[Type]) -> Self {
        OpaqueType {
            name: name.into(),
            parameters: parameters.into(),
        }
    }

    /// The type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type parameters, in order
    pub fn parameters(&self) -> &[Type] {
        &self.parameters
    }

    /// The name followed by the parameters in parentheses
    pub fn debug_string(&self) -> String {
        if self.parameters.is_empty() {
            return self.name.to_string();
        }
        let parameters: Vec<String> = self.parameters.iter().map(Type::debug_string).collect();
        format!("{}<{}>", self.name, parameters.join(", "))
    }
}

/// `optional_type<T>`, an opaque type with one parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionalType(OpaqueType);

impl OptionalType {
    /// Name of every optional type
    pub const NAME: &'static str = "optional_type";

    /// `optional_type(parameter)`
    pub fn new(parameter: Type) -> Self {
        OptionalType(OpaqueType::new(Self::NAME, &[parameter]))
    }

    /// Reinterpret an opaque type, when it is an optional type
    pub fn from_opaque(opaque: &OpaqueType) -> Option<Self> {
        (opaque.name() == Self::NAME && opaque.parameters().len() == 1)
            .then(|| OptionalType(opaque.clone()))
    }

    /// The type of the held value
    pub fn parameter(&self) -> &Type {
        &self.0.parameters()[0]
    }

    /// The optional type as the opaque type it is
    pub fn as_opaque(&self) -> &OpaqueType {
        &self.0
    }

    /// `optional_type(T)` with the parameter rendered
    pub fn debug_string(&self) -> String {
        self.0.debug_string()
    }
}

impl Default for OptionalType {
    fn default() -> Self {
        OptionalType::new(Type::Dyn)
    }
}

impl From<ListType> for Type {
    fn from(t: ListType) -> Self {
        Type::List(t)
    }
}

impl From<MapType> for Type {
    fn from(t: MapType) -> Self {
        Type::Map(t)
    }
}

impl From<StructType> for Type {
    fn from(t: StructType) -> Self {
        Type::Struct(t)
    }
}

impl From<OpaqueType> for Type {
    fn from(t: OpaqueType) -> Self {
        Type::Opaque(t)
    }
}

impl From<OptionalType> for OpaqueType {
    fn from(t: OptionalType) -> Self {
        t.0
    }
}

impl From<OptionalType> for Type {
    fn from(t: OptionalType) -> Self {
        Type::Opaque(t.0)
    }
}

/// Types with no parameters that commonly appear as type arguments
const CACHED_ELEMENT_TYPES: [Type; 18] = [
    Type::Any,
    Type::Bool,
    Type::BoolWrapper,
    Type::Bytes,
    Type::BytesWrapper,
    Type::Double,
    Type::DoubleWrapper,
    Type::Duration,
    Type::Dyn,
    Type::Error,
    Type::Int,
    Type::IntWrapper,
    Type::String,
    Type::StringWrapper,
    Type::Timestamp,
    Type::Type,
    Type::Uint,
    Type::UintWrapper,
];

const CACHED_MAP_KEY_TYPES: [Type; 5] = [Type::Bool, Type::Int, Type::Uint, Type::String, Type::Dyn];

/// Process-wide cache of the parameterized types most programs use
///
/// Built once on first use and immutable afterwards.
#[derive(Debug)]
pub(crate) struct ProcessLocalTypeCache {
    list_types: HashMap<Type, ListType>,
    map_types: HashMap<(Type, Type), MapType>,
    optional_types: HashMap<Type, OptionalType>,
    dyn_list_type: ListType,
    dyn_dyn_map_type: MapType,
    string_dyn_map_type: MapType,
    dyn_optional_type: OptionalType,
}

static TYPE_CACHE: Lazy<ProcessLocalTypeCache> = Lazy::new(ProcessLocalTypeCache::new);

impl ProcessLocalTypeCache {
    pub(crate) fn get() -> &'static ProcessLocalTypeCache {
        &TYPE_CACHE
    }

    fn new() -> Self {
        tracing::trace!("initialising process-local type cache");
        let list_types: HashMap<Type, ListType> = CACHED_ELEMENT_TYPES
            .iter()
            .map(|t| (t.clone(), ListType::new(t.clone())))
            .collect();
        let mut map_types = HashMap::new();
        for key in &CACHED_MAP_KEY_TYPES {
            for value in &CACHED_ELEMENT_TYPES {
                map_types.insert(
                    (key.clone(), value.clone()),
                    MapType::new(key.clone(), value.clone()),
                );
            }
        }
        let mut optional_types: HashMap<Type, OptionalType> = CACHED_ELEMENT_TYPES
            .iter()
            .map(|t| (t.clone(), OptionalType::new(t.clone())))
            .collect();
        for list_type in list_types.values() {
            let parameter = Type::List(list_type.clone());
            optional_types.insert(parameter.clone(), OptionalType::new(parameter));
        }
        for map_type in map_types.values() {
            let parameter = Type::Map(map_type.clone());
            optional_types.insert(parameter.clone(), OptionalType::new(parameter));
        }
        let dyn_list_type = list_types[&Type::Dyn].clone();
        let dyn_dyn_map_type = map_types[&(Type::Dyn, Type::Dyn)].clone();
        let string_dyn_map_type = map_types[&(Type::String, Type::Dyn)].clone();
        let dyn_optional_type = optional_types[&Type::Dyn].clone();
        ProcessLocalTypeCache {
            list_types,
            map_types,
            optional_types,
            dyn_list_type,
            dyn_dyn_map_type,
            string_dyn_map_type,
            dyn_optional_type,
        }
    }

    pub(crate) fn find_list_type(&self, element: &Type) -> Option<ListType> {
        self.list_types.get(element).cloned()
    }

    pub(crate) fn find_map_type(&self, key: &Type, value: &Type) -> Option<MapType> {
        self.map_types.get(&(key.clone(), value.clone())).cloned()
    }

    pub(crate) fn find_optional_type(&self, parameter: &Type) -> Option<OptionalType> {
        self.optional_types.get(parameter).cloned()
    }

    pub(crate) fn list_types(&self) -> impl Iterator<Item = &ListType> {
        self.list_types.values()
    }

    pub(crate) fn map_types(&self) -> impl Iterator<Item = &MapType> {
        self.map_types.values()
    }

    pub(crate) fn optional_types(&self) -> impl Iterator<Item = &OptionalType> {
        self.optional_types.values()
    }
}

/// Construction of parameterized types
///
/// The public methods consult the process-local cache first and fall back
/// to the `*_impl` hooks, which implementations override to intern or
/// otherwise manage the types they create.
pub trait TypeFactory: Send + Sync {
    /// `list(element)`, from the cache when possible
    fn create_list_type(&self, element: Type) -> ListType {
        ProcessLocalTypeCache::get()
            .find_list_type(&element)
            .unwrap_or_else(|| self.create_list_type_impl(element))
    }

    /// `map(key, value)`, from the cache when possible
    fn create_map_type(&self, key: Type, value: Type) -> MapType {
        ProcessLocalTypeCache::get()
            .find_map_type(&key, &value)
            .unwrap_or_else(|| self.create_map_type_impl(key, value))
    }

    /// The struct type called `name`
    fn create_struct_type(&self, name: &str) -> StructType {
        self.create_struct_type_impl(name)
    }

    /// The opaque type `name` with `parameters`, from the cache when possible
    fn create_opaque_type(&self, name: &str, parameters: &[Type]) -> OpaqueType {
        if name == OptionalType::NAME && parameters.len() == 1 {
            if let Some(optional) = ProcessLocalTypeCache::get().find_optional_type(&parameters[0]) {
                return optional.into();
            }
        }
        self.create_opaque_type_impl(name, parameters)
    }

    /// `optional_type(parameter)`, from the cache when possible
    fn create_optional_type(&self, parameter: Type) -> OptionalType {
        let opaque = self.create_opaque_type(OptionalType::NAME, std::slice::from_ref(&parameter));
        OptionalType::from_opaque(&opaque).unwrap_or_else(|| OptionalType::new(parameter))
    }

    /// `list<dyn>`
    fn get_dyn_list_type(&self) -> ListType {
        ProcessLocalTypeCache::get().dyn_list_type.clone()
    }

    /// `map<dyn, dyn>`
    fn get_dyn_dyn_map_type(&self) -> MapType {
        ProcessLocalTypeCache::get().dyn_dyn_map_type.clone()
    }

    /// `map<string, dyn>`
    fn get_string_dyn_map_type(&self) -> MapType {
        ProcessLocalTypeCache::get().string_dyn_map_type.clone()
    }

    /// `optional_type<dyn>`
    fn get_dyn_optional_type(&self) -> OptionalType {
        ProcessLocalTypeCache::get().dyn_optional_type.clone()
    }

    /// Build a list type the cache does not hold
    fn create_list_type_impl(&self, element: Type) -> ListType {
        ListType::new(element)
    }

    /// Build a map type the cache does not hold
    fn create_map_type_impl(&self, key: Type, value: Type) -> MapType {
        MapType::new(key, value)
    }

    /// Build a struct type
    fn create_struct_type_impl(&self, name: &str) -> StructType {
        StructType::new(name)
    }

    /// Build an opaque type the cache does not hold
    fn create_opaque_type_impl(&self, name: &str, parameters: &[Type]) -> OpaqueType {
        OpaqueType::new(name, parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainTypeFactory;

    impl TypeFactory for PlainTypeFactory {}

    #[test]
    fn test_type_names() {
        assert_eq!(Type::Bool.name(), "bool");
        assert_eq!(Type::Null.name(), "null_type");
        assert_eq!(Type::Duration.name(), "google.protobuf.Duration");
        assert_eq!(Type::Dyn.name(), "dyn");
        assert_eq!(Type::from(ListType::new(Type::Bool)).name(), "list");
        assert_eq!(Type::from(StructType::new("test.Message")).name(), "test.Message");
    }

    #[test]
    fn test_type_debug_strings() {
        assert_eq!(ListType::new(Type::Bool).debug_string(), "list<bool>");
        assert_eq!(
            MapType::new(Type::String, Type::Dyn).debug_string(),
            "map<string, dyn>"
        );
        assert_eq!(OptionalType::new(Type::Bool).debug_string(), "optional_type<bool>");
        assert_eq!(
            Type::from(ListType::new(MapType::new(Type::Int, Type::Double).into())).to_string(),
            "list<map<int, double>>"
        );
        assert_eq!(OpaqueType::new("custom", &[]).debug_string(), "custom");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(ListType::new(Type::Int), ListType::new(Type::Int));
        assert_ne!(ListType::new(Type::Int), ListType::new(Type::Uint));
        assert_eq!(
            Type::from(OptionalType::new(Type::Int)),
            Type::Opaque(OpaqueType::new("optional_type", &[Type::Int]))
        );
        assert_eq!(
            Type::Opaque(OpaqueType::new("optional_type", &[Type::Int])).as_optional(),
            Some(OptionalType::new(Type::Int))
        );
        assert_eq!(OpaqueType::new("other", &[Type::Int]).name(), "other");
    }

    #[test]
    fn test_parameters() {
        assert_eq!(Type::from(MapType::default()).parameters(), vec![Type::Dyn, Type::Dyn]);
        assert_eq!(Type::from(OptionalType::new(Type::Bool)).parameters(), vec![Type::Bool]);
        assert!(Type::Int.parameters().is_empty());
    }

    #[test]
    fn test_factory_uses_cache() {
        let factory = PlainTypeFactory;
        assert_eq!(factory.get_dyn_list_type(), ListType::new(Type::Dyn));
        assert_eq!(factory.get_dyn_dyn_map_type(), MapType::new(Type::Dyn, Type::Dyn));
        assert_eq!(factory.get_string_dyn_map_type(), MapType::new(Type::String, Type::Dyn));
        assert_eq!(factory.get_dyn_optional_type(), OptionalType::new(Type::Dyn));
        assert_eq!(factory.create_list_type(Type::Int), ListType::new(Type::Int));
        let nested = ListType::new(ListType::new(Type::Int).into());
        assert_eq!(factory.create_list_type(nested.clone().into()).element(), &Type::List(nested));
        assert_eq!(
            factory.create_optional_type(Type::String).parameter(),
            &Type::String
        );
        assert_eq!(factory.create_struct_type("a.B").name(), "a.B");
    }
}
