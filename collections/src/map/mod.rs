//! Insertion-ordered key/value maps
//!
//! [`Map`] defers `map`/`filter` like [`crate::List`] does; callbacks
//! receive the key and the value and only the value is replaced.
//! [`ImmutableMap`] is the copy-on-write form.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::contract::{
    Checked, Contract, MAP_KEY_KINDS, TypeContract, TypeRegistry, TypeSpec, Unchecked,
};
use crate::error::{CollectionError, Result};
use crate::pipeline::{CollapseGuard, Pipeline, Stage};
use crate::store::OrderedStore;
use crate::traits::{Collection, FromPairs, MapView, nest_mutable, untyped_construction};
use crate::value::{Object, Value};

mod immutable;

#[cfg(test)]
mod tests;

pub use immutable::ImmutableMap;

/// Map whose keys and values are checked against declared types
pub type GenericMap = Map<Checked>;

/// Immutable map whose keys and values are checked against declared types
pub type ImmutableGenericMap = ImmutableMap<Checked>;

/// A key and its value
pub type Entry = (Value, Value);

#[derive(Clone)]
struct MapState<C> {
    store: OrderedStore,
    pipeline: Pipeline<Entry, C>,
}

/// Mutable map with a deferred pipeline
pub struct Map<C: Contract = Unchecked> {
    state: RefCell<MapState<C>>,
    collapsing: Cell<bool>,
    contract: C,
}

impl Map {
    pub fn new() -> Self {
        Self::from_store(OrderedStore::default())
    }

    pub(crate) fn from_store(store: OrderedStore) -> Self {
        Self::assemble(store, Unchecked)
    }

    /// Map over the entries of a native dict
    pub fn from_dict(dict: &Value) -> Result<Self> {
        match dict {
            Value::Dict(entries) => Self::from_pairs(entries.iter().cloned()),
            other => Err(CollectionError::type_mismatch(other, "dict")),
        }
    }

    /// Nested arrays become lists and nested dicts maps, at every depth
    pub fn from_recursive<I: IntoIterator<Item = Entry>>(pairs: I) -> Result<Self> {
        let nested = pairs
            .into_iter()
            .map(|(key, value)| Ok((key, nest_mutable(value)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::from_pairs(nested)
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl FromPairs for Map {
    fn from_pairs<I: IntoIterator<Item = Entry>>(pairs: I) -> Result<Self> {
        OrderedStore::from_entries(pairs).map(Self::from_store)
    }
}

impl FromPairs for GenericMap {
    fn from_pairs<I: IntoIterator<Item = Entry>>(_pairs: I) -> Result<Self> {
        Err(untyped_construction(
            "GenericMap",
            "GenericMap::of_types or GenericMap::from_typed",
        ))
    }
}

impl GenericMap {
    pub fn of_types(key_token: &str, value_token: &str) -> Result<Self> {
        Self::from_typed(key_token, value_token, [])
    }

    pub fn from_typed<I>(key_token: &str, value_token: &str, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = Entry>,
    {
        let contract = TypeContract::for_map(key_token, value_token, &TypeRegistry::default())?;
        Self::with_contract(contract, pairs)
    }

    /// Map over a contract parsed against any registry; keys must be scalar types
    pub fn with_contract<I>(contract: TypeContract, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = Entry>,
    {
        let contract = Checked::new(contract).require_key_kinds(MAP_KEY_KINDS)?;
        let store = checked_entries(&contract, pairs)?;
        Ok(Self::assemble(store, contract))
    }

    pub fn contract(&self) -> &TypeContract {
        self.contract.contract()
    }

    /// Queue a value transform producing `value_type` values
    pub fn map_to<F>(&self, value_type: TypeSpec, transform: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + 'static,
    {
        let contract = self.contract.retyped(value_type);
        let mut mapped = self.derive(Stage::Map {
            transform: Rc::new(move |(key, value): &Entry| transform(key, value)),
            contract: contract.clone(),
        });
        mapped.contract = contract;
        mapped
    }
}

impl<C: Contract> Map<C> {
    fn assemble(store: OrderedStore, contract: C) -> Self {
        Self {
            state: RefCell::new(MapState {
                store,
                pipeline: Pipeline::default(),
            }),
            collapsing: Cell::new(false),
            contract,
        }
    }

    fn type_label(&self) -> &'static str {
        if self.contract.is_generic() {
            "GenericMap"
        } else {
            "Map"
        }
    }

    fn collapse(&self) -> Result<()> {
        let (entries, pipeline) = {
            let state = self.state.borrow();
            if state.pipeline.is_empty() {
                return Ok(());
            }
            (state.store.to_entries(), state.pipeline.clone())
        };

        let collapsed = {
            let _guard = CollapseGuard::enter(&self.collapsing, self.type_label())?;
            pipeline.collapse(entries)?
        };
        let store = OrderedStore::from_entries(collapsed)?;

        let mut state = self.state.borrow_mut();
        state.store = store;
        state.pipeline.clear();
        Ok(())
    }

    fn store(&self) -> Result<OrderedStore> {
        self.collapse()?;
        Ok(self.state.borrow().store.clone())
    }

    fn store_mut(&mut self) -> Result<&mut OrderedStore> {
        self.collapse()?;
        Ok(&mut self.state.get_mut().store)
    }

    fn derive(&self, stage: Stage<Entry, C>) -> Self {
        let mut derived = self.clone();
        derived.state.get_mut().pipeline.push(stage);
        derived
    }

    pub fn pending_stages(&self) -> Vec<String> {
        self.state.borrow().pipeline.describe()
    }

    /// Insert or overwrite; an existing key keeps its position
    pub fn set(&mut self, key: Value, value: Value) -> Result<&mut Self> {
        self.contract.check_key(&key)?;
        self.contract.check_value(&value)?;
        self.store_mut()?.set(key, value)?;
        Ok(self)
    }

    /// Remove `key`, returning its value when present
    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>> {
        self.contract.check_key(key)?;
        Ok(self.store_mut()?.remove(key))
    }

    pub fn clear(&mut self) -> Result<&mut Self> {
        *self.store_mut()? = OrderedStore::default();
        Ok(self)
    }

    /// Queue a value transform; results must satisfy the map's value type
    pub fn map<F>(&self, transform: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + 'static,
    {
        self.derive(Stage::Map {
            transform: Rc::new(move |(key, value): &Entry| transform(key, value)),
            contract: self.contract.clone(),
        })
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + 'static,
    {
        self.derive(Stage::Filter(Rc::new(move |(key, value): &Entry| {
            predicate(key, value)
        })))
    }

    /// Iterate a snapshot of the collapsed entries
    pub fn iter(&self) -> Result<impl Iterator<Item = Entry> + use<C>> {
        Ok(self.entries()?.into_iter())
    }

    pub fn as_immutable(&self) -> Result<ImmutableMap<C>> {
        Ok(ImmutableMap::assemble(self.store()?, self.contract.clone()))
    }
}

impl<C: Contract> Clone for Map<C> {
    fn clone(&self) -> Self {
        Self {
            state: RefCell::new(self.state.borrow().clone()),
            collapsing: Cell::new(false),
            contract: self.contract.clone(),
        }
    }
}

impl<C: Contract> fmt::Debug for Map<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct(self.type_label())
            .field("entries", &state.store.to_entries())
            .field("pending", &state.pipeline)
            .field("contract", &self.contract.declaration())
            .finish()
    }
}

impl<C: Contract> Collection for Map<C> {
    fn count(&self) -> Result<usize> {
        self.collapse()?;
        Ok(self.state.borrow().store.len())
    }

    fn contains(&self, value: &Value) -> Result<bool> {
        Ok(self.store()?.iter().any(|(_, stored)| stored == value))
    }

    fn to_array(&self) -> Result<Value> {
        self.store()?.export()
    }
}

impl<C: Contract> MapView for Map<C> {
    fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self.store()?.to_entries())
    }

    fn get_or_none(&self, key: &Value) -> Result<Option<Value>> {
        self.contract.check_key(key)?;
        self.collapse()?;
        Ok(self.state.borrow().store.get(key).cloned())
    }
}

impl<C: Contract> Object for Map<C> {
    fn type_name(&self) -> &str {
        self.type_label()
    }

    fn is_instance_of(&self, type_name: &str) -> bool {
        type_name == self.type_label()
            || matches!(type_name, "MapCollection" | "Collection" | "Mutable")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn export(&self) -> Result<Option<Value>> {
        self.to_array().map(Some)
    }
}

/// Check every pair against `contract` before any is stored
pub(crate) fn checked_entries<C, I>(contract: &C, pairs: I) -> Result<OrderedStore>
where
    C: Contract,
    I: IntoIterator<Item = Entry>,
{
    let mut store = OrderedStore::default();
    for (key, value) in pairs {
        contract.check_key(&key)?;
        contract.check_value(&value)?;
        store.set(key, value)?;
    }
    Ok(store)
}
