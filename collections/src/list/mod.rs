//! Ordered lists
//!
//! [`List`] queues `map`/`filter`/`take*` calls and applies them in one pass
//! the next time it is observed. [`ImmutableList`] evaluates everything
//! eagerly and returns a new list from every mutator.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use im_rc::Vector;

use crate::aggregate;
use crate::contract::{
    Checked, Contract, LIST_KEY_KINDS, TypeContract, TypeRegistry, TypeSpec, Unchecked,
};
use crate::error::Result;
use crate::pipeline::{CollapseGuard, Pipeline, Stage};
use crate::traits::{Collection, FromValues, ListView, nest_mutable, untyped_construction};
use crate::value::{Object, Value};

mod immutable;


pub use immutable::ImmutableList;

/// List whose elements are checked against a declared type
pub type GenericList = List<Checked>;

/// Immutable list whose elements are checked against a declared type
pub type ImmutableGenericList = ImmutableList<Checked>;

#[derive(Clone)]
struct ListState<C> {
    items: Vector<Value>,
    pipeline: Pipeline<Value, C>,
}

/// Mutable list with a deferred pipeline
///
/// Reads take `&self` and collapse pending stages through interior
/// mutability; structural mutators take `&mut self`. Cloning copies the
/// pending stages, so the clone and the original evolve independently.
pub struct List<C: Contract = Unchecked> {
    state: RefCell<ListState<C>>,
    collapsing: Cell<bool>,
    contract: C,
}

impl List {
    pub fn new() -> Self {
        Self::from_vector(Vector::new())
    }

    pub(crate) fn from_vector(items: Vector<Value>) -> Self {
        Self::assemble(items, Unchecked)
    }

    /// Nested arrays become lists and nested dicts maps, at every depth
    pub fn from_recursive<I: IntoIterator<Item = Value>>(values: I) -> Result<Self> {
        values
            .into_iter()
            .map(nest_mutable)
            .collect::<Result<Vector<_>>>()
            .map(Self::from_vector)
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl FromValues for List {
    fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Result<Self> {
        Ok(Self::from_vector(values.into_iter().collect()))
    }
}

impl FromValues for GenericList {
    fn from_values<I: IntoIterator<Item = Value>>(_values: I) -> Result<Self> {
        Err(untyped_construction(
            "GenericList",
            "GenericList::of_type or GenericList::from_typed",
        ))
    }
}

impl GenericList {
    /// Empty list holding values of the `value_token` type
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

    /// List over a contract parsed against any registry; the key type must be `int`
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

    /// Queue a transform producing `value_type` values
    ///
    /// The result declares `value_type`; the receiver keeps its contract.
    pub fn map_to<F>(&self, value_type: TypeSpec, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        let contract = self.contract.retyped(value_type);
        let mut mapped = self.derive(Stage::Map {
            transform: Rc::new(transform),
            contract: contract.clone(),
        });
        mapped.contract = contract;
        mapped
    }
}

impl<C: Contract> List<C> {
    fn assemble(items: Vector<Value>, contract: C) -> Self {
        Self {
            state: RefCell::new(ListState {
                items,
                pipeline: Pipeline::default(),
            }),
            collapsing: Cell::new(false),
            contract,
        }
    }

    fn type_label(&self) -> &'static str {
        if self.contract.is_generic() {
            "GenericList"
        } else {
            "List"
        }
    }

    /// Apply and clear pending stages; nothing changes on failure
    fn collapse(&self) -> Result<()> {
        let (items, pipeline) = {
            let state = self.state.borrow();
            if state.pipeline.is_empty() {
                return Ok(());
            }
            (state.items.clone(), state.pipeline.clone())
        };

        let collapsed = {
            let _guard = CollapseGuard::enter(&self.collapsing, self.type_label())?;
            pipeline.collapse(items)?
        };

        let mut state = self.state.borrow_mut();
        state.items = Vector::from(collapsed);
        state.pipeline.clear();
        Ok(())
    }

    fn items_mut(&mut self) -> Result<&mut Vector<Value>> {
        self.collapse()?;
        Ok(&mut self.state.get_mut().items)
    }

    fn derive(&self, stage: Stage<Value, C>) -> Self {
        let mut derived = self.clone();
        derived.state.get_mut().pipeline.push(stage);
        derived
    }

    /// Names of the queued stages, oldest first
    pub fn pending_stages(&self) -> Vec<String> {
        self.state.borrow().pipeline.describe()
    }

    pub fn add(&mut self, value: Value) -> Result<&mut Self> {
        self.contract.check_value(&value)?;
        self.items_mut()?.push_back(value);
        Ok(self)
    }

    /// Insert at the front
    pub fn unshift(&mut self, value: Value) -> Result<&mut Self> {
        self.contract.check_value(&value)?;
        self.items_mut()?.push_front(value);
        Ok(self)
    }

    /// Add every value, or none when one of them is rejected
    pub fn append<I: IntoIterator<Item = Value>>(&mut self, values: I) -> Result<&mut Self> {
        let values = checked_values(&self.contract, values)?;
        self.items_mut()?.append(values);
        Ok(self)
    }

    /// Remove and return the first element
    pub fn shift(&mut self) -> Result<Option<Value>> {
        Ok(self.items_mut()?.pop_front())
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Result<Option<Value>> {
        Ok(self.items_mut()?.pop_back())
    }

    /// Remove the first element equal to `value`; reports whether one was found
    pub fn remove_first(&mut self, value: &Value) -> Result<bool> {
        let items = self.items_mut()?;
        match items.index_of(value) {
            Some(index) => {
                items.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every element equal to `value`; returns how many were removed
    pub fn remove_all(&mut self, value: &Value) -> Result<usize> {
        let items = self.items_mut()?;
        let before = items.len();
        items.retain(|item| item != value);
        Ok(before - items.len())
    }

    pub fn clear(&mut self) -> Result<&mut Self> {
        self.items_mut()?.clear();
        Ok(self)
    }

    pub fn sort(&mut self) -> Result<&mut Self> {
        self.reorder(|items| aggregate::sort(items, false))
    }

    pub fn sort_descending(&mut self) -> Result<&mut Self> {
        self.reorder(|items| aggregate::sort(items, true))
    }

    pub fn sort_by(&mut self, key: impl Fn(&Value) -> Value) -> Result<&mut Self> {
        self.reorder(|items| aggregate::sort_by_key(items, key, false))
    }

    pub fn sort_by_descending(&mut self, key: impl Fn(&Value) -> Value) -> Result<&mut Self> {
        self.reorder(|items| aggregate::sort_by_key(items, key, true))
    }

    pub fn unique(&mut self) -> Result<&mut Self> {
        self.reorder(|items| Ok(aggregate::unique_by(items, Value::clone)))
    }

    /// Keep the first element of every key
    pub fn unique_by(&mut self, key: impl Fn(&Value) -> Value) -> Result<&mut Self> {
        self.reorder(|items| Ok(aggregate::unique_by(items, key)))
    }

    pub fn reverse(&mut self) -> Result<&mut Self> {
        self.reorder(|items| Ok(items.into_iter().rev().collect()))
    }

    fn reorder<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(Vector<Value>) -> Result<Vec<Value>>,
    {
        let items = self.items_mut()?;
        *items = Vector::from(f(items.clone())?);
        Ok(self)
    }

    /// Queue a transform; values produced must satisfy the list's contract
    pub fn map<F>(&self, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.derive(Stage::Map {
            transform: Rc::new(transform),
            contract: self.contract.clone(),
        })
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.derive(Stage::Filter(Rc::new(predicate)))
    }

    /// Queue a bound of exactly `n` elements; the collapse fails when fewer arrive
    pub fn take(&self, n: usize) -> Self {
        self.derive(Stage::Take(n))
    }

    pub fn take_up_to(&self, n: usize) -> Self {
        self.derive(Stage::TakeUpTo(n))
    }

    pub fn take_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.derive(Stage::TakeWhile(Rc::new(predicate)))
    }

    /// Iterate a snapshot of the collapsed elements
    pub fn iter(&self) -> Result<impl Iterator<Item = Value> + use<C>> {
        Ok(self.snapshot()?.into_iter())
    }

    pub fn as_immutable(&self) -> Result<ImmutableList<C>> {
        Ok(ImmutableList::assemble(
            self.snapshot()?,
            self.contract.clone(),
        ))
    }
}

impl<C: Contract> Clone for List<C> {
    fn clone(&self) -> Self {
        Self {
            state: RefCell::new(self.state.borrow().clone()),
            collapsing: Cell::new(false),
            contract: self.contract.clone(),
        }
    }
}

impl<C: Contract> fmt::Debug for List<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct(self.type_label())
            .field("items", &state.items)
            .field("pending", &state.pipeline)
            .field("contract", &self.contract.declaration())
            .finish()
    }
}

impl<C: Contract> Collection for List<C> {
    fn count(&self) -> Result<usize> {
        self.collapse()?;
        Ok(self.state.borrow().items.len())
    }

    fn contains(&self, value: &Value) -> Result<bool> {
        Ok(self.snapshot()?.contains(value))
    }

    fn to_array(&self) -> Result<Value> {
        export_items(&self.snapshot()?)
    }
}

impl<C: Contract> ListView for List<C> {
    fn snapshot(&self) -> Result<Vector<Value>> {
        self.collapse()?;
        Ok(self.state.borrow().items.clone())
    }
}

impl<C: Contract> Object for List<C> {
    fn type_name(&self) -> &str {
        self.type_label()
    }

    fn is_instance_of(&self, type_name: &str) -> bool {
        type_name == self.type_label()
            || matches!(type_name, "ListCollection" | "Collection" | "Mutable")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn export(&self) -> Result<Option<Value>> {
        self.to_array().map(Some)
    }
}

/// Check every value against `contract` before any is stored
pub(crate) fn checked_values<C, I>(contract: &C, values: I) -> Result<Vector<Value>>
where
    C: Contract,
    I: IntoIterator<Item = Value>,
{
    values
        .into_iter()
        .map(|value| {
            contract.check_value(&value)?;
            Ok(value)
        })
        .collect()
}

pub(crate) fn export_items(items: &Vector<Value>) -> Result<Value> {
    items
        .iter()
        .map(Value::export)
        .collect::<Result<Vector<_>>>()
        .map(Value::Array)
}
