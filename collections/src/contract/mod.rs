//! Runtime type contracts for generic collections
//!
//! A contract pairs a key type and a value type, each written as a token
//! (`int`, `string`, `instance_of_Entity`, ...). Generic collections hold a
//! [`Checked`] contract and assert every inserted or produced key/value
//! against it; plain collections use the zero-sized [`Unchecked`] policy.

use std::fmt;
use std::rc::Rc;

use crate::error::{CollectionError, Result};
use crate::value::Value;

mod registry;

#[cfg(test)]
mod tests;

pub use registry::{BUILTIN_TYPES, TypeRegistry};

/// Prefix of tokens naming a type or interface, e.g. `instance_of_Entity`
pub const INSTANCE_OF_PREFIX: &str = "instance_of_";

/// Token families, used to restrict which tokens a contract slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    String,
    Int,
    Float,
    Bool,
    Array,
    Object,
    InstanceOf,
}

/// List positions are always integers
pub const LIST_KEY_KINDS: &[TypeKind] = &[TypeKind::Int];

/// Map keys are limited to scalars
pub const MAP_KEY_KINDS: &[TypeKind] = &[
    TypeKind::Int,
    TypeKind::String,
    TypeKind::Float,
    TypeKind::Bool,
];

pub const VALUE_KINDS: &[TypeKind] = &[
    TypeKind::String,
    TypeKind::Int,
    TypeKind::Float,
    TypeKind::Bool,
    TypeKind::Array,
    TypeKind::Object,
    TypeKind::InstanceOf,
];

impl TypeKind {
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::String => "string",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::Bool => "bool",
            TypeKind::Array => "array",
            TypeKind::Object => "object",
            TypeKind::InstanceOf => "instance_of_*",
        }
    }
}

/// A single declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    String,
    Int,
    Float,
    Bool,
    /// Native arrays and dicts
    Array,
    /// Any object value
    Object,
    /// Object that is (or implements) the named type
    InstanceOf(Rc<str>),
}

impl TypeSpec {
    /// Parse a type token, resolving `instance_of_` names against `registry`
    pub fn parse(token: &str, registry: &TypeRegistry) -> Result<Self> {
        match token {
            "string" => Ok(TypeSpec::String),
            "int" => Ok(TypeSpec::Int),
            "float" => Ok(TypeSpec::Float),
            "bool" => Ok(TypeSpec::Bool),
            "array" => Ok(TypeSpec::Array),
            "object" => Ok(TypeSpec::Object),
            _ => match token.strip_prefix(INSTANCE_OF_PREFIX) {
                Some(name) => Self::instance_of(name, registry),
                None => Err(CollectionError::declaration(token, "unknown type")),
            },
        }
    }

    pub fn instance_of(name: &str, registry: &TypeRegistry) -> Result<Self> {
        if name.is_empty() {
            return Err(CollectionError::declaration(
                INSTANCE_OF_PREFIX,
                "missing type name",
            ));
        }
        if !registry.contains(name) {
            return Err(CollectionError::declaration(
                format!("{INSTANCE_OF_PREFIX}{name}"),
                format!("type or interface `{name}` does not exist"),
            ));
        }
        Ok(TypeSpec::InstanceOf(Rc::from(name)))
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeSpec::String => TypeKind::String,
            TypeSpec::Int => TypeKind::Int,
            TypeSpec::Float => TypeKind::Float,
            TypeSpec::Bool => TypeKind::Bool,
            TypeSpec::Array => TypeKind::Array,
            TypeSpec::Object => TypeKind::Object,
            TypeSpec::InstanceOf(_) => TypeKind::InstanceOf,
        }
    }

    /// Exact kind match; `instance_of` is a polymorphic is-a check
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeSpec::String, Value::String(_)) => true,
            (TypeSpec::Int, Value::Int(_)) => true,
            (TypeSpec::Float, Value::Float(_)) => true,
            (TypeSpec::Bool, Value::Bool(_)) => true,
            (TypeSpec::Array, Value::Array(_) | Value::Dict(_)) => true,
            (TypeSpec::Object, Value::Object(_)) => true,
            (TypeSpec::InstanceOf(name), Value::Object(object)) => object.is_instance_of(name),
            _ => false,
        }
    }

    fn ensure_permitted(&self, allowed: &[TypeKind]) -> Result<()> {
        if allowed.contains(&self.kind()) {
            return Ok(());
        }
        let names: Vec<&str> = allowed.iter().map(|kind| kind.name()).collect();
        Err(CollectionError::declaration(
            self.to_string(),
            format!("not permitted here; allowed: {}", names.join(", ")),
        ))
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::InstanceOf(name) => write!(f, "{INSTANCE_OF_PREFIX}{name}"),
            other => f.write_str(other.kind().name()),
        }
    }
}

/// Declared key type and value type of a generic collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeContract {
    key: TypeSpec,
    value: TypeSpec,
}

impl TypeContract {
    pub fn new(
        key_token: &str,
        value_token: &str,
        allowed_keys: &[TypeKind],
        allowed_values: &[TypeKind],
        registry: &TypeRegistry,
    ) -> Result<Self> {
        let key = TypeSpec::parse(key_token, registry)?;
        let value = TypeSpec::parse(value_token, registry)?;
        Self::from_specs(key, value, allowed_keys, allowed_values)
    }

    pub fn from_specs(
        key: TypeSpec,
        value: TypeSpec,
        allowed_keys: &[TypeKind],
        allowed_values: &[TypeKind],
    ) -> Result<Self> {
        key.ensure_permitted(allowed_keys)?;
        value.ensure_permitted(allowed_values)?;
        Ok(Self { key, value })
    }

    /// Contract of a list: `int` positions, any permitted value type
    pub fn for_list(value_token: &str, registry: &TypeRegistry) -> Result<Self> {
        Self::new("int", value_token, LIST_KEY_KINDS, VALUE_KINDS, registry)
    }

    pub fn for_map(key_token: &str, value_token: &str, registry: &TypeRegistry) -> Result<Self> {
        Self::new(key_token, value_token, MAP_KEY_KINDS, VALUE_KINDS, registry)
    }

    pub fn key_type(&self) -> &TypeSpec {
        &self.key
    }

    pub fn value_type(&self) -> &TypeSpec {
        &self.value
    }

    pub fn assert_key(&self, key: &Value) -> Result<()> {
        assert_spec(&self.key, key)
    }

    pub fn assert_value(&self, value: &Value) -> Result<()> {
        assert_spec(&self.value, value)
    }

    /// Same key type, new value type
    pub fn with_value_type(&self, value: TypeSpec) -> Self {
        Self {
            key: self.key.clone(),
            value,
        }
    }
}

fn assert_spec(spec: &TypeSpec, value: &Value) -> Result<()> {
    if spec.accepts(value) {
        return Ok(());
    }
    tracing::debug!(expected = %spec, actual = value.type_name(), "type contract rejected value");
    Err(CollectionError::type_mismatch(value, spec.to_string()))
}

impl fmt::Display for TypeContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.key, self.value)
    }
}

/// Checking policy a collection is parameterised over
pub trait Contract: Clone + fmt::Debug + 'static {
    fn check_key(&self, key: &Value) -> Result<()>;

    fn check_value(&self, value: &Value) -> Result<()>;

    /// The declared contract, `None` for plain collections
    fn declaration(&self) -> Option<&TypeContract>;

    fn is_generic(&self) -> bool {
        self.declaration().is_some()
    }
}

/// Policy of plain collections: accepts any value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unchecked;

impl Contract for Unchecked {
    fn check_key(&self, _key: &Value) -> Result<()> {
        Ok(())
    }

    fn check_value(&self, _value: &Value) -> Result<()> {
        Ok(())
    }

    fn declaration(&self) -> Option<&TypeContract> {
        None
    }
}

/// Policy of generic collections; shared read-only between clones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checked(Rc<TypeContract>);

impl Checked {
    pub fn new(contract: TypeContract) -> Self {
        Checked(Rc::new(contract))
    }

    pub fn contract(&self) -> &TypeContract {
        &self.0
    }

    /// Contract for a `map_to` result; the receiver is left untouched
    pub fn retyped(&self, value: TypeSpec) -> Self {
        Checked::new(self.0.with_value_type(value))
    }

    /// Reject contracts whose key type is not in `allowed`
    pub(crate) fn require_key_kinds(self, allowed: &[TypeKind]) -> Result<Self> {
        self.0.key.ensure_permitted(allowed)?;
        Ok(self)
    }
}

impl Contract for Checked {
    fn check_key(&self, key: &Value) -> Result<()> {
        self.0.assert_key(key)
    }

    fn check_value(&self, value: &Value) -> Result<()> {
        self.0.assert_value(value)
    }

    fn declaration(&self) -> Option<&TypeContract> {
        Some(&self.0)
    }
}
