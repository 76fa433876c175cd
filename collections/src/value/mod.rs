use im_rc::Vector;
use ordered_float::OrderedFloat;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::{CollectionError, Result};


/// A value of a user-defined (or collection) type stored inside [`Value`]
///
/// `is_instance_of` is the polymorphic check behind `instance_of_<Name>`
/// contracts: implementors answer for their own name and for every
/// interface they want to be seen as.
pub trait Object: fmt::Debug {
    fn type_name(&self) -> &str;

    fn is_instance_of(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }

    fn as_any(&self) -> &dyn Any;

    /// Native array/dict form used by `to_array`; `None` keeps the object as-is
    fn export(&self) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Runtime value held by every collection
#[derive(Clone, Debug)]
pub enum Value {
    /// Absence of a value
    Null,

    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit float with a total order so it can be hashed and sorted
    Float(OrderedFloat<f64>),

    String(Rc<str>),

    /// Native ordered array
    Array(Vector<Value>),

    /// Native insertion-ordered associative array
    Dict(Vector<(Value, Value)>),

    /// Instance of a named type, compared by identity
    Object(Rc<dyn Object>),
}

impl Value {
    pub fn object<T: Object + 'static>(object: T) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn array<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Value::Array(values.into_iter().collect())
    }

    pub fn dict<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
        Value::Dict(entries.into_iter().collect())
    }

    /// Runtime kind name used in type errors
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::Object(object) => object.type_name(),
        }
    }

    /// Scalars are the only values allowed as map keys
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vector<Value>> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<dyn Object>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the concrete type behind an `Object` value
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    /// Total order for comparable values
    /// Int and Float compare numerically; other cross-kind pairs are rejected.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => Ok(OrderedFloat(*a as f64).cmp(b)),
            (Value::Float(a), Value::Int(b)) => Ok(a.cmp(&OrderedFloat(*b as f64))),
            (Value::Float(a), Value::Float(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        unequal => return Ok(unequal),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(CollectionError::type_mismatch(other, self.type_name())),
        }
    }

    /// String form without quoting, used when joining values
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Recursively convert nested collections into native arrays and dicts
    ///
    /// Precondition: the value graph is acyclic. Crate collections cannot
    /// contain themselves; a user `Object` whose `export` reaches itself
    /// recurses without bound.
    pub fn export(&self) -> Result<Value> {
        match self {
            Value::Array(values) => values
                .iter()
                .map(Value::export)
                .collect::<Result<Vector<_>>>()
                .map(Value::Array),
            Value::Dict(entries) => entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), value.export()?)))
                .collect::<Result<Vector<_>>>()
                .map(Value::Dict),
            Value::Object(object) => Ok(object.export()?.unwrap_or_else(|| self.clone())),
            scalar => Ok(scalar.clone()),
        }
    }

    /// Elements of an array, the values of a dict, or the exported elements of a collection
    pub(crate) fn flatten_elements(&self) -> Result<Vector<Value>> {
        match self {
            Value::Array(values) => Ok(values.clone()),
            Value::Dict(entries) => Ok(entries.iter().map(|(_, v)| v.clone()).collect()),
            Value::Object(object) => match object.export()? {
                Some(exported @ (Value::Array(_) | Value::Dict(_))) => {
                    exported.flatten_elements()
                }
                _ => Err(CollectionError::InvalidArgument(format!(
                    "{} cannot be flattened",
                    object.type_name()
                ))),
            },
            other => Err(CollectionError::InvalidArgument(format!(
                "{} {other} cannot be flattened",
                other.type_name()
            ))),
        }
    }
}

/// Structural equality; Int and Float never compare equal to each other
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            // Objects compare by identity
            (Value::Object(a), Value::Object(b)) => object_ptr(a) == object_ptr(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(n) => n.hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(values) => {
                values.len().hash(state);
                for value in values {
                    value.hash(state);
                }
            }
            Value::Dict(entries) => {
                entries.len().hash(state);
                for (key, value) in entries {
                    key.hash(state);
                    value.hash(state);
                }
            }
            Value::Object(object) => std::ptr::hash(object_ptr(object), state),
        }
    }
}

fn object_ptr(object: &Rc<dyn Object>) -> *const () {
    Rc::as_ptr(object) as *const ()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => {
                // Keep floats visibly distinct from ints
                if n.0.is_finite() && n.0.fract() == 0.0 {
                    write!(f, "{:.1}", n.0)
                } else {
                    write!(f, "{}", n.0)
                }
            }
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Object(object) => write!(f, "<{}>", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(OrderedFloat(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(Vector::from(values))
    }
}

impl From<Vector<Value>> for Value {
    fn from(values: Vector<Value>) -> Self {
        Value::Array(values)
    }
}
