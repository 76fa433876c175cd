use std::any::Any;
use std::fmt;
use std::ops::Index;

use super::{Entry, Map, checked_entries};
use crate::contract::{
    Checked, Contract, MAP_KEY_KINDS, TypeContract, TypeRegistry, TypeSpec, Unchecked,
};
use crate::error::Result;
use crate::store::OrderedStore;
use crate::traits::{Collection, FromPairs, MapView, nest_immutable, untyped_construction};
use crate::value::{Object, Value};

/// Copy-on-write map
///
/// Every mutator returns a new map; `map`/`filter` run at call time.
#[derive(Clone)]
pub struct ImmutableMap<C: Contract = Unchecked> {
    store: OrderedStore,
    contract: C,
}

impl ImmutableMap {
    pub fn new() -> Self {
        Self::assemble(OrderedStore::default(), Unchecked)
    }

    pub fn from_recursive<I: IntoIterator<Item = Entry>>(pairs: I) -> Result<Self> {
        let nested = pairs
            .into_iter()
            .map(|(key, value)| Ok((key, nest_immutable(value)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::from_pairs(nested)
    }
}

impl Default for ImmutableMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FromPairs for ImmutableMap {
    fn from_pairs<I: IntoIterator<Item = Entry>>(pairs: I) -> Result<Self> {
        OrderedStore::from_entries(pairs).map(|store| Self::assemble(store, Unchecked))
    }
}

impl FromPairs for ImmutableMap<Checked> {
    fn from_pairs<I: IntoIterator<Item = Entry>>(_pairs: I) -> Result<Self> {
        Err(untyped_construction(
            "ImmutableGenericMap",
            "ImmutableGenericMap::of_types or ImmutableGenericMap::from_typed",
        ))
    }
}

impl ImmutableMap<Checked> {
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

    pub fn map_to<F>(&self, value_type: TypeSpec, transform: F) -> Result<Self>
    where
        F: Fn(&Value, &Value) -> Value,
    {
        let contract = self.contract.retyped(value_type);
        let store = checked_entries(&contract, self.transformed(transform))?;
        Ok(Self::assemble(store, contract))
    }
}

impl<C: Contract> ImmutableMap<C> {
    pub(crate) fn assemble(store: OrderedStore, contract: C) -> Self {
        Self { store, contract }
    }

    fn with_store(&self, store: OrderedStore) -> Self {
        Self::assemble(store, self.contract.clone())
    }

    fn type_label(&self) -> &'static str {
        if self.contract.is_generic() {
            "ImmutableGenericMap"
        } else {
            "ImmutableMap"
        }
    }

    fn transformed<'a, F>(&'a self, transform: F) -> impl Iterator<Item = Entry> + 'a
    where
        F: Fn(&Value, &Value) -> Value + 'a,
    {
        self.store
            .iter()
            .map(move |(key, value)| (key.clone(), transform(key, value)))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn set(&self, key: Value, value: Value) -> Result<Self> {
        self.contract.check_key(&key)?;
        self.contract.check_value(&value)?;
        let mut store = self.store.clone();
        store.set(key, value)?;
        Ok(self.with_store(store))
    }

    pub fn remove(&self, key: &Value) -> Result<Self> {
        self.contract.check_key(key)?;
        let mut store = self.store.clone();
        store.remove(key);
        Ok(self.with_store(store))
    }

    pub fn clear(&self) -> Self {
        self.with_store(OrderedStore::default())
    }

    pub fn map<F>(&self, transform: F) -> Result<Self>
    where
        F: Fn(&Value, &Value) -> Value,
    {
        let store = checked_entries(&self.contract, self.transformed(transform))?;
        Ok(self.with_store(store))
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool,
    {
        let rejected: Vec<Value> = self
            .store
            .iter()
            .filter(|(key, value)| !predicate(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        let mut store = self.store.clone();
        for key in &rejected {
            store.remove(key);
        }
        self.with_store(store)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.store.iter()
    }

    pub fn as_mutable(&self) -> Map<C> {
        Map::assemble(self.store.clone(), self.contract.clone())
    }
}

/// Panics when `key` is absent, like `HashMap` indexing
impl<C: Contract> Index<&Value> for ImmutableMap<C> {
    type Output = Value;

    fn index(&self, key: &Value) -> &Value {
        match self.store.get(key) {
            Some(value) => value,
            None => panic!("undefined key {key}"),
        }
    }
}

impl<C: Contract> PartialEq for ImmutableMap<C> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store && self.contract.declaration() == other.contract.declaration()
    }
}

impl<C: Contract> fmt::Debug for ImmutableMap<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.type_label())
            .field("entries", &self.store.to_entries())
            .field("contract", &self.contract.declaration())
            .finish()
    }
}

impl<C: Contract> Collection for ImmutableMap<C> {
    fn count(&self) -> Result<usize> {
        Ok(self.store.len())
    }

    fn contains(&self, value: &Value) -> Result<bool> {
        Ok(self.store.iter().any(|(_, stored)| stored == value))
    }

    fn to_array(&self) -> Result<Value> {
        self.store.export()
    }
}

impl<C: Contract> MapView for ImmutableMap<C> {
    fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self.store.to_entries())
    }

    fn get_or_none(&self, key: &Value) -> Result<Option<Value>> {
        self.contract.check_key(key)?;
        Ok(self.store.get(key).cloned())
    }
}

impl<C: Contract> Object for ImmutableMap<C> {
    fn type_name(&self) -> &str {
        self.type_label()
    }

    fn is_instance_of(&self, type_name: &str) -> bool {
        type_name == self.type_label()
            || matches!(type_name, "MapCollection" | "Collection" | "Immutable")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn export(&self) -> Result<Option<Value>> {
        self.to_array().map(Some)
    }
}
