//! Operations shared by the mutable and immutable forms of each collection

use im_rc::Vector;

use crate::aggregate::{self, Extremum, Sum};
use crate::error::{CollectionError, Result};
use crate::list::{ImmutableList, List};
use crate::map::{ImmutableMap, Map};
use crate::seq::Seq;
use crate::value::Value;

/// Behaviour every list and map has
pub trait Collection {
    fn count(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }

    /// Whether any element (map: any value) equals `value`
    fn contains(&self, value: &Value) -> Result<bool>;

    /// Native array or dict, with nested collections exported recursively
    fn to_array(&self) -> Result<Value>;
}

/// Read operations of `List` and `ImmutableList`
///
/// Mutable lists collapse their pending stages before any of these run.
pub trait ListView: Collection {
    /// Current elements; cheap to clone
    fn snapshot(&self) -> Result<Vector<Value>>;

    fn to_vec(&self) -> Result<Vec<Value>> {
        Ok(self.snapshot()?.into_iter().collect())
    }

    fn get(&self, index: usize) -> Result<Option<Value>> {
        Ok(self.snapshot()?.get(index).cloned())
    }

    fn first(&self) -> Result<Option<Value>> {
        Ok(self.snapshot()?.front().cloned())
    }

    fn first_by(&self, predicate: impl Fn(&Value) -> bool) -> Result<Option<Value>> {
        Ok(self.snapshot()?.into_iter().find(|value| predicate(value)))
    }

    fn last(&self) -> Result<Option<Value>> {
        Ok(self.snapshot()?.back().cloned())
    }

    fn contains_by(&self, predicate: impl Fn(&Value) -> bool) -> Result<bool> {
        Ok(self.snapshot()?.iter().any(predicate))
    }

    fn each(&self, mut visitor: impl FnMut(&Value)) -> Result<()> {
        self.snapshot()?.iter().for_each(|value| visitor(value));
        Ok(())
    }

    fn reduce(&self, reducer: impl Fn(Value, &Value) -> Value, initial: Value) -> Result<Value> {
        Ok(self.snapshot()?.iter().fold(initial, reducer))
    }

    fn sum(&self) -> Result<Value> {
        aggregate::sum(&self.snapshot()?)
    }

    fn sum_by(&self, selector: impl Fn(&Value) -> Value) -> Result<Value> {
        let mut sum = Sum::default();
        for value in &self.snapshot()? {
            sum.add(&selector(value))?;
        }
        Ok(sum.total())
    }

    fn min(&self) -> Result<Option<Value>> {
        aggregate::extremum(Extremum::min(), &self.snapshot()?, Value::clone)
    }

    fn max(&self) -> Result<Option<Value>> {
        aggregate::extremum(Extremum::max(), &self.snapshot()?, Value::clone)
    }

    fn min_by(&self, key: impl Fn(&Value) -> Value) -> Result<Option<Value>> {
        aggregate::extremum(Extremum::min(), &self.snapshot()?, key)
    }

    fn max_by(&self, key: impl Fn(&Value) -> Value) -> Result<Option<Value>> {
        aggregate::extremum(Extremum::max(), &self.snapshot()?, key)
    }

    fn implode(&self, separator: &str) -> Result<String> {
        Ok(aggregate::implode(&self.snapshot()?, separator))
    }

    /// Number of elements per key, keys in order of first appearance
    fn count_by(&self, key: impl Fn(&Value) -> Value) -> Result<Map> {
        aggregate::count_by(&self.snapshot()?, key).map(Map::from_store)
    }

    /// Elements per key as arrays, keys in order of first appearance
    fn group_by(&self, key: impl Fn(&Value) -> Value) -> Result<Map> {
        aggregate::group_by(&self.snapshot()?, key).map(Map::from_store)
    }

    /// Restartable sequence over the current elements
    fn to_seq(&self) -> Result<Seq> {
        Ok(Seq::from(self.snapshot()?))
    }
}

/// Read operations of `Map` and `ImmutableMap`
///
/// Callbacks receive the key first, then the value.
pub trait MapView: Collection {
    /// Current entries in insertion order
    fn entries(&self) -> Result<Vec<(Value, Value)>>;

    /// Value under `key`; generic maps reject keys of the wrong type
    fn get_or_none(&self, key: &Value) -> Result<Option<Value>>;

    fn get(&self, key: &Value) -> Result<Value> {
        self.get_or_none(key)?
            .ok_or_else(|| CollectionError::UndefinedKey(key.to_string()))
    }

    fn contains_key(&self, key: &Value) -> Result<bool> {
        Ok(self.get_or_none(key)?.is_some())
    }

    /// First value whose entry satisfies `predicate`
    fn find(&self, predicate: impl Fn(&Value, &Value) -> bool) -> Result<Option<Value>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|(key, value)| predicate(key, value))
            .map(|(_, value)| value))
    }

    /// First key whose entry satisfies `predicate`
    fn find_key(&self, predicate: impl Fn(&Value, &Value) -> bool) -> Result<Option<Value>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|(key, value)| predicate(key, value))
            .map(|(key, _)| key))
    }

    fn keys(&self) -> Result<List> {
        Ok(List::from_vector(
            self.entries()?.into_iter().map(|(key, _)| key).collect(),
        ))
    }

    fn values(&self) -> Result<List> {
        Ok(List::from_vector(
            self.entries()?.into_iter().map(|(_, value)| value).collect(),
        ))
    }

    /// Entries as `[key, value]` arrays
    fn pairs(&self) -> Result<List> {
        Ok(List::from_vector(
            self.entries()?.into_iter().map(pair).collect(),
        ))
    }

    fn contains_by(&self, predicate: impl Fn(&Value, &Value) -> bool) -> Result<bool> {
        Ok(self
            .entries()?
            .iter()
            .any(|(key, value)| predicate(key, value)))
    }

    fn each(&self, mut visitor: impl FnMut(&Value, &Value)) -> Result<()> {
        for (key, value) in self.entries()? {
            visitor(&key, &value);
        }
        Ok(())
    }

    fn reduce(
        &self,
        reducer: impl Fn(Value, &Value, &Value) -> Value,
        initial: Value,
    ) -> Result<Value> {
        Ok(self
            .entries()?
            .iter()
            .fold(initial, |acc, (key, value)| reducer(acc, key, value)))
    }

    /// Restartable sequence of `[key, value]` arrays
    fn to_seq(&self) -> Result<Seq> {
        let pairs: Vector<Value> = self.entries()?.into_iter().map(pair).collect();
        Ok(Seq::from(pairs))
    }
}

pub(crate) fn pair((key, value): (Value, Value)) -> Value {
    Value::array([key, value])
}

/// Construction from plain values
///
/// Generic collections implement this by failing with
/// `UnsupportedOperation`: they need a declared type.
pub trait FromValues: Sized {
    fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Result<Self>;

    fn of<V: Into<Value>, const N: usize>(values: [V; N]) -> Result<Self> {
        Self::from_values(values.into_iter().map(Into::into))
    }

    /// Build from `source` through a `creator` that yields the values
    fn create<S, I, F>(source: S, creator: F) -> Result<Self>
    where
        F: FnOnce(S) -> I,
        I: IntoIterator<Item = Value>,
    {
        Self::from_values(creator(source))
    }
}

/// Construction of maps from key/value pairs
pub trait FromPairs: Sized {
    fn from_pairs<I: IntoIterator<Item = (Value, Value)>>(pairs: I) -> Result<Self>;
}

/// Nested arrays become mutable lists and nested dicts mutable maps
pub(crate) fn nest_mutable(value: Value) -> Result<Value> {
    match value {
        Value::Array(values) => Ok(Value::object(List::from_recursive(values)?)),
        Value::Dict(entries) => Ok(Value::object(Map::from_recursive(entries)?)),
        other => Ok(other),
    }
}

/// Nested arrays become immutable lists and nested dicts immutable maps
pub(crate) fn nest_immutable(value: Value) -> Result<Value> {
    match value {
        Value::Array(values) => Ok(Value::object(ImmutableList::from_recursive(values)?)),
        Value::Dict(entries) => Ok(Value::object(ImmutableMap::from_recursive(entries)?)),
        other => Ok(other),
    }
}

pub(crate) fn untyped_construction(type_name: &str, entry_point: &str) -> CollectionError {
    CollectionError::UnsupportedOperation(format!(
        "{type_name} requires a declared type; construct it with {entry_point}"
    ))
}
