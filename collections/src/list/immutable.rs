use std::any::Any;
use std::fmt;
use std::ops::Index;

use im_rc::Vector;

use super::{List, checked_values, export_items};
use crate::aggregate;
use crate::contract::{
    Checked, Contract, LIST_KEY_KINDS, TypeContract, TypeRegistry, TypeSpec, Unchecked,
};
use crate::error::{CollectionError, Result};
use crate::traits::{Collection, FromValues, ListView, nest_immutable, untyped_construction};
use crate::value::{Object, Value};

/// Copy-on-write list
///
/// Every mutator returns a new list and leaves the receiver untouched;
/// `map`/`filter`/`take*` are evaluated at call time.
#[derive(Clone)]
pub struct ImmutableList<C: Contract = Unchecked> {
    items: Vector<Value>,
    contract: C,
}

impl ImmutableList {
    pub fn new() -> Self {
        Self::assemble(Vector::new(), Unchecked)
    }

    pub fn from_recursive<I: IntoIterator<Item = Value>>(values: I) -> Result<Self> {
        values
            .into_iter()
            .map(nest_immutable)
            .collect::<Result<Vector<_>>>()
            .map(|items| Self::assemble(items, Unchecked))
    }
}

impl Default for ImmutableList {
    fn default() -> Self {
        Self::new()
    }
}

impl FromValues for ImmutableList {
    fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Result<Self> {
        Ok(Self::assemble(values.into_iter().collect(), Unchecked))
    }
}

impl FromValues for ImmutableList<Checked> {
    fn from_values<I: IntoIterator<Item = Value>>(_values: I) -> Result<Self> {
        Err(untyped_construction(
            "ImmutableGenericList",
            "ImmutableGenericList::of_type or ImmutableGenericList::from_typed",
        ))
    }
}

impl ImmutableList<Checked> {
    pub fn of_type(value_token: &str) -> Result<Self> {
        Self::from_typed(value_token, [])
    }

    pub fn from_typed<I>(value_token: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let contract = TypeContract::for_list(value_token, &TypeRegistry::default())?;
        Self::with_contract(contract, values)
    }

    pub fn with_contract<I>(contract: TypeContract, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let contract = Checked::new(contract).require_key_kinds(LIST_KEY_KINDS)?;
        let items = checked_values(&contract, values)?;
        Ok(Self::assemble(items, contract))
    }

    pub fn contract(&self) -> &TypeContract {
        self.contract.contract()
    }

    /// Transform into a list declaring `value_type`
    pub fn map_to<F>(&self, value_type: TypeSpec, transform: F) -> Result<Self>
    where
        F: Fn(&Value) -> Value,
    {
        let contract = self.contract.retyped(value_type);
        let items = checked_values(&contract, self.items.iter().map(transform))?;
        Ok(Self::assemble(items, contract))
    }
}

impl<C: Contract> ImmutableList<C> {
    pub(crate) fn assemble(items: Vector<Value>, contract: C) -> Self {
        Self { items, contract }
    }

    fn with_items(&self, items: Vector<Value>) -> Self {
        Self::assemble(items, self.contract.clone())
    }

    fn type_label(&self) -> &'static str {
        if self.contract.is_generic() {
            "ImmutableGenericList"
        } else {
            "ImmutableList"
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&self, value: Value) -> Result<Self> {
        self.contract.check_value(&value)?;
        let mut items = self.items.clone();
        items.push_back(value);
        Ok(self.with_items(items))
    }

    pub fn unshift(&self, value: Value) -> Result<Self> {
        self.contract.check_value(&value)?;
        let mut items = self.items.clone();
        items.push_front(value);
        Ok(self.with_items(items))
    }

    pub fn append<I: IntoIterator<Item = Value>>(&self, values: I) -> Result<Self> {
        let mut items = self.items.clone();
        items.append(checked_values(&self.contract, values)?);
        Ok(self.with_items(items))
    }

    pub fn remove_first(&self, value: &Value) -> Self {
        let mut items = self.items.clone();
        if let Some(index) = items.index_of(value) {
            items.remove(index);
        }
        self.with_items(items)
    }

    pub fn remove_all(&self, value: &Value) -> Self {
        let mut items = self.items.clone();
        items.retain(|item| item != value);
        self.with_items(items)
    }

    pub fn clear(&self) -> Self {
        self.with_items(Vector::new())
    }

    pub fn sort(&self) -> Result<Self> {
        aggregate::sort(self.items.clone(), false).map(|items| self.with_items(items.into()))
    }

    pub fn sort_descending(&self) -> Result<Self> {
        aggregate::sort(self.items.clone(), true).map(|items| self.with_items(items.into()))
    }

    pub fn sort_by(&self, key: impl Fn(&Value) -> Value) -> Result<Self> {
        aggregate::sort_by_key(self.items.clone(), key, false)
            .map(|items| self.with_items(items.into()))
    }

    pub fn sort_by_descending(&self, key: impl Fn(&Value) -> Value) -> Result<Self> {
        aggregate::sort_by_key(self.items.clone(), key, true)
            .map(|items| self.with_items(items.into()))
    }

    pub fn unique(&self) -> Self {
        self.unique_by(Value::clone)
    }

    pub fn unique_by(&self, key: impl Fn(&Value) -> Value) -> Self {
        self.with_items(aggregate::unique_by(self.items.clone(), key).into())
    }

    pub fn reverse(&self) -> Self {
        self.with_items(self.items.iter().rev().cloned().collect())
    }

    /// Transform every element now; each result must satisfy the contract
    pub fn map<F>(&self, transform: F) -> Result<Self>
    where
        F: Fn(&Value) -> Value,
    {
        let items = checked_values(&self.contract, self.items.iter().map(transform))?;
        Ok(self.with_items(items))
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool,
    {
        self.with_items(
            self.items
                .iter()
                .filter(|value| predicate(value))
                .cloned()
                .collect(),
        )
    }

    /// The first `n` elements; fails when the list is shorter
    pub fn take(&self, n: usize) -> Result<Self> {
        if self.items.len() < n {
            return Err(CollectionError::OutOfRange(format!(
                "take({n}) found only {} element(s)",
                self.items.len()
            )));
        }
        Ok(self.take_up_to(n))
    }

    pub fn take_up_to(&self, n: usize) -> Self {
        self.with_items(self.items.take(n.min(self.items.len())))
    }

    pub fn take_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool,
    {
        self.with_items(
            self.items
                .iter()
                .take_while(|value| predicate(value))
                .cloned()
                .collect(),
        )
    }

    pub fn iter(&self) -> im_rc::vector::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_mutable(&self) -> List<C> {
        List::assemble(self.items.clone(), self.contract.clone())
    }
}

/// Panics when `index` is out of bounds, like slice indexing
impl<C: Contract> Index<usize> for ImmutableList<C> {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.items[index]
    }
}

impl<C: Contract> PartialEq for ImmutableList<C> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
            && self.contract.declaration() == other.contract.declaration()
    }
}

impl<C: Contract> fmt::Debug for ImmutableList<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.type_label())
            .field("items", &self.items)
            .field("contract", &self.contract.declaration())
            .finish()
    }
}

impl<C: Contract> Collection for ImmutableList<C> {
    fn count(&self) -> Result<usize> {
        Ok(self.items.len())
    }

    fn contains(&self, value: &Value) -> Result<bool> {
        Ok(self.items.contains(value))
    }

    fn to_array(&self) -> Result<Value> {
        export_items(&self.items)
    }
}

impl<C: Contract> ListView for ImmutableList<C> {
    fn snapshot(&self) -> Result<Vector<Value>> {
        Ok(self.items.clone())
    }

    fn get(&self, index: usize) -> Result<Option<Value>> {
        Ok(self.items.get(index).cloned())
    }
}

impl<C: Contract> Object for ImmutableList<C> {
    fn type_name(&self) -> &str {
        self.type_label()
    }

    fn is_instance_of(&self, type_name: &str) -> bool {
        type_name == self.type_label()
            || matches!(type_name, "ListCollection" | "Collection" | "Immutable")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn export(&self) -> Result<Option<Value>> {
        self.to_array().map(Some)
    }
}
