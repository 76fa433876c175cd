//! Lazy, possibly infinite sequences
//!
//! A [`Seq`] is a source plus a chain of iterator adaptors. Nothing runs
//! until a terminal operator pulls elements. Sources built from a factory
//! restart on every iteration; a wrapped iterator can be walked once.
//!
//! Operators that must see every element (`reverse`, `sort`, `count`, ...)
//! are rejected up front on a sequence known to be infinite. Sequences
//! from `unfold`, `init` or `from*` are never assumed infinite.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::iter;
use std::rc::Rc;

use im_rc::Vector;

use crate::aggregate::{self, Extremum, Sum};
use crate::contract::Unchecked;
use crate::error::{CollectionError, Result};
use crate::list::{ImmutableList, export_items};
use crate::value::{Object, Value};

mod range;


pub use range::{Number, RangeSpec};

/// Iterator produced by one walk over a sequence
pub type SeqIter = Box<dyn Iterator<Item = Result<Value>>>;

type Adaptor = Rc<dyn Fn(SeqIter) -> SeqIter>;

#[derive(Clone)]
enum Source {
    Factory(Rc<dyn Fn() -> SeqIter>),
    OneShot(Rc<RefCell<Option<SeqIter>>>),
}

/// Lazy sequence of values
#[derive(Clone)]
pub struct Seq {
    source: Source,
    adaptor: Adaptor,
    infinite: bool,
}

fn failed(error: CollectionError) -> SeqIter {
    Box::new(iter::once(Err(error)))
}

fn items(values: Vec<Value>) -> SeqIter {
    Box::new(values.into_iter().map(Ok))
}

// Collections and arrays contribute their elements; scalars stand for themselves
fn spread(value: Value) -> Result<Vector<Value>> {
    if value.is_scalar() || value.is_null() {
        return Ok(Vector::unit(value));
    }
    value.flatten_elements()
}

fn spread_all(iter: SeqIter) -> SeqIter {
    Box::new(iter.flat_map(|item| match item.and_then(spread) {
        Ok(values) => Box::new(values.into_iter().map(Ok)) as SeqIter,
        Err(error) => failed(error),
    }))
}

impl Seq {
    fn from_factory(factory: impl Fn() -> SeqIter + 'static, infinite: bool) -> Self {
        Self {
            source: Source::Factory(Rc::new(factory)),
            adaptor: Rc::new(|iter: SeqIter| iter),
            infinite,
        }
    }

    /// Finite, restartable sequence over `values`
    pub fn of<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Self::from(values.into_iter().collect::<Vector<Value>>())
    }

    /// Restartable sequence; `iterable` is cloned for every walk
    #[allow(clippy::should_implement_trait)]
    pub fn from<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = Value> + Clone + 'static,
        I::IntoIter: 'static,
    {
        Self::from_factory(
            move || Box::new(iterable.clone().into_iter().map(Ok)),
            false,
        )
    }

    /// Sequence over an iterator that can only be walked once
    pub fn from_iter_once<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        let iter: SeqIter = Box::new(values.into_iter().map(Ok));
        Self {
            source: Source::OneShot(Rc::new(RefCell::new(Some(iter)))),
            adaptor: Rc::new(|iter: SeqIter| iter),
            infinite: false,
        }
    }

    /// Sequence over `start..end` or `start..step..end`
    pub fn range(spec: &str) -> Result<Self> {
        Ok(Self::range_with(spec.parse()?))
    }

    pub fn range_with(spec: RangeSpec) -> Self {
        Self::from_factory(
            move || Box::new(spec.values().map(Ok)),
            spec.is_infinite(),
        )
    }

    /// 1, 2, 3, ...
    pub fn infinite() -> Self {
        Self::range_with(RangeSpec::unbounded(1))
    }

    /// Elements generated from a state until `step` returns `None`
    pub fn unfold<F>(step: F, seed: Value) -> Self
    where
        F: Fn(&Value) -> Option<(Value, Value)> + 'static,
    {
        let step = Rc::new(step);
        Self::from_factory(
            move || {
                let step = Rc::clone(&step);
                let mut state = Some(seed.clone());
                Box::new(iter::from_fn(move || {
                    let current = state.take()?;
                    let (element, next) = step(&current)?;
                    state = Some(next);
                    Some(Ok(element))
                }))
            },
            false,
        )
    }

    /// `factory` builds a fresh iterator for every walk
    pub fn init<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::from_factory(move || Box::new(factory().into_iter().map(Ok)), false)
    }

    pub fn is_restartable(&self) -> bool {
        matches!(self.source, Source::Factory(_))
    }

    /// Whether the sequence is known never to end
    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    /// Start a walk over the sequence
    ///
    /// A second walk over a one-shot sequence yields a single
    /// `UnsupportedOperation` error.
    pub fn iter(&self) -> SeqIter {
        let source = match &self.source {
            Source::Factory(factory) => factory(),
            Source::OneShot(slot) => match slot.borrow_mut().take() {
                Some(iter) => iter,
                None => {
                    tracing::debug!("one-shot sequence iterated again");
                    failed(CollectionError::UnsupportedOperation(
                        "sequence over a one-shot iterator was already consumed".to_string(),
                    ))
                }
            },
        };
        (self.adaptor)(source)
    }

    fn derive(&self, infinite: bool, adaptor: impl Fn(SeqIter) -> SeqIter + 'static) -> Self {
        let previous = Rc::clone(&self.adaptor);
        Self {
            source: self.source.clone(),
            adaptor: Rc::new(move |iter: SeqIter| adaptor(previous(iter))),
            infinite,
        }
    }

    fn ensure_finite(&self, operation: &str) -> Result<()> {
        if self.infinite {
            tracing::debug!(operation, "rejected operation on infinite sequence");
            return Err(CollectionError::infinite(operation));
        }
        Ok(())
    }

    // Buffers the whole sequence when a walk starts
    fn buffered<F>(&self, operation: &str, rearrange: F) -> Result<Self>
    where
        F: Fn(Vec<Value>) -> Result<Vec<Value>> + 'static,
    {
        self.ensure_finite(operation)?;
        Ok(self.derive(false, move |iter| {
            match iter.collect::<Result<Vec<_>>>().and_then(&rearrange) {
                Ok(values) => items(values),
                Err(error) => failed(error),
            }
        }))
    }

    fn drain(&self, operation: &str) -> Result<Vec<Value>> {
        self.ensure_finite(operation)?;
        self.iter().collect()
    }

    // ========================================================================
    // Lazy operators
    // ========================================================================

    pub fn map<F>(&self, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        let transform = Rc::new(transform);
        self.derive(self.infinite, move |iter| {
            let transform = Rc::clone(&transform);
            Box::new(iter.map(move |item| item.map(|value| transform(&value))))
        })
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);
        self.derive(self.infinite, move |iter| {
            let predicate = Rc::clone(&predicate);
            Box::new(iter.filter(move |item| match item {
                Ok(value) => predicate(value),
                Err(_) => true,
            }))
        })
    }

    /// Exactly `n` elements; a shorter source fails with `OutOfRange`
    /// once it runs dry
    pub fn take(&self, n: usize) -> Self {
        self.derive(false, move |mut iter| {
            let mut taken = 0;
            Box::new(iter::from_fn(move || {
                if taken >= n {
                    return None;
                }
                match iter.next() {
                    Some(Ok(value)) => {
                        taken += 1;
                        Some(Ok(value))
                    }
                    Some(Err(error)) => {
                        taken = n;
                        Some(Err(error))
                    }
                    None => {
                        let found = taken;
                        taken = n;
                        Some(Err(CollectionError::OutOfRange(format!(
                            "take({n}) found only {found} element(s)"
                        ))))
                    }
                }
            }))
        })
    }

    /// At most `n` elements
    pub fn take_up_to(&self, n: usize) -> Self {
        self.derive(false, move |iter| Box::new(iter.take(n)))
    }

    /// Elements up to the first one `predicate` rejects; nothing after it is pulled
    pub fn take_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);
        self.derive(false, move |mut iter| {
            let predicate = Rc::clone(&predicate);
            let mut done = false;
            Box::new(iter::from_fn(move || {
                if done {
                    return None;
                }
                match iter.next()? {
                    Ok(value) if predicate(&value) => Some(Ok(value)),
                    Ok(_) => {
                        done = true;
                        None
                    }
                    Err(error) => {
                        done = true;
                        Some(Err(error))
                    }
                }
            }))
        })
    }

    /// Drop the first `n` elements; a shorter source ends up empty
    pub fn skip(&self, n: usize) -> Self {
        self.derive(self.infinite, move |mut iter| {
            let mut remaining = n;
            Box::new(iter::from_fn(move || {
                loop {
                    let item = iter.next()?;
                    if remaining > 0 && item.is_ok() {
                        remaining -= 1;
                        continue;
                    }
                    return Some(item);
                }
            }))
        })
    }

    pub fn skip_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);
        self.derive(self.infinite, move |mut iter| {
            let predicate = Rc::clone(&predicate);
            let mut skipping = true;
            Box::new(iter::from_fn(move || {
                loop {
                    let item = iter.next()?;
                    if skipping {
                        if matches!(&item, Ok(value) if predicate(value)) {
                            continue;
                        }
                        skipping = false;
                    }
                    return Some(item);
                }
            }))
        })
    }

    /// Map every element to a collection and splice its elements in
    pub fn collect<F>(&self, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.map(transform).concat()
    }

    /// Splice the elements of nested arrays, dicts and collections in
    pub fn concat(&self) -> Self {
        self.derive(self.infinite, spread_all)
    }

    /// This sequence followed by `other`
    pub fn append(&self, other: &Seq) -> Self {
        let other = other.clone();
        let infinite = self.infinite || other.infinite;
        self.derive(infinite, move |iter| {
            let other = other.clone();
            Box::new(iter.chain(iter::once(()).flat_map(move |()| other.iter())))
        })
    }

    /// Consecutive arrays of `size` elements; the last may be shorter
    pub fn chunk_by_size(&self, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(CollectionError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }
        Ok(self.derive(self.infinite, move |mut iter| {
            Box::new(iter::from_fn(move || {
                let mut chunk = Vector::new();
                while chunk.len() < size {
                    match iter.next() {
                        Some(Ok(value)) => chunk.push_back(value),
                        Some(Err(error)) => return Some(Err(error)),
                        None => break,
                    }
                }
                (!chunk.is_empty()).then_some(Ok(Value::Array(chunk)))
            }))
        }))
    }

    /// `parts` arrays of near-equal size, larger ones first; never yields empty arrays
    pub fn split_into(&self, parts: usize) -> Result<Self> {
        if parts == 0 {
            return Err(CollectionError::InvalidArgument(
                "number of parts must be positive".to_string(),
            ));
        }
        self.buffered("split_into", move |values| {
            let base = values.len() / parts;
            let larger = values.len() % parts;
            let mut rest = values.into_iter();
            Ok((0..parts)
                .map(|part| base + usize::from(part < larger))
                .take_while(|&len| len > 0)
                .map(|len| Value::Array(rest.by_ref().take(len).collect()))
                .collect())
        })
    }

    pub fn reverse(&self) -> Result<Self> {
        self.buffered("reverse", |mut values| {
            values.reverse();
            Ok(values)
        })
    }

    /// Stable ascending sort; incomparable elements fail the walk
    pub fn sort(&self) -> Result<Self> {
        self.buffered("sort", |values| aggregate::sort(values, false))
    }

    pub fn sort_by<F>(&self, key: F) -> Result<Self>
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.buffered("sort_by", move |values| {
            aggregate::sort_by_key(values, &key, false)
        })
    }

    // ========================================================================
    // Terminal operators
    // ========================================================================

    pub fn reduce<F>(&self, reducer: F, initial: Value) -> Result<Value>
    where
        F: Fn(Value, &Value) -> Value,
    {
        self.ensure_finite("reduce")?;
        self.iter()
            .try_fold(initial, |acc, item| Ok(reducer(acc, &item?)))
    }

    pub fn to_vec(&self) -> Result<Vec<Value>> {
        self.drain("to_vec")
    }

    /// Native array with nested collections exported
    pub fn to_array(&self) -> Result<Value> {
        export_items(&self.drain("to_array")?.into_iter().collect())
    }

    pub fn to_list(&self) -> Result<ImmutableList> {
        let values = self.drain("to_list")?;
        Ok(ImmutableList::assemble(values.into_iter().collect(), Unchecked))
    }

    pub fn sum(&self) -> Result<Value> {
        aggregate::sum(&self.drain("sum")?)
    }

    pub fn sum_by<F>(&self, selector: F) -> Result<Value>
    where
        F: Fn(&Value) -> Value,
    {
        self.ensure_finite("sum_by")?;
        let mut sum = Sum::default();
        for item in self.iter() {
            sum.add(&selector(&item?))?;
        }
        Ok(sum.total())
    }

    pub fn min(&self) -> Result<Option<Value>> {
        aggregate::extremum(Extremum::min(), &self.drain("min")?, Value::clone)
    }

    pub fn max(&self) -> Result<Option<Value>> {
        aggregate::extremum(Extremum::max(), &self.drain("max")?, Value::clone)
    }

    pub fn min_by<F>(&self, key: F) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> Value,
    {
        aggregate::extremum(Extremum::min(), &self.drain("min_by")?, key)
    }

    pub fn max_by<F>(&self, key: F) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> Value,
    {
        aggregate::extremum(Extremum::max(), &self.drain("max_by")?, key)
    }

    pub fn count(&self) -> Result<usize> {
        self.ensure_finite("count")?;
        self.iter().try_fold(0, |count, item| item.map(|_| count + 1))
    }

    pub fn implode(&self, separator: &str) -> Result<String> {
        Ok(aggregate::implode(&self.drain("implode")?, separator))
    }

    pub fn each<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&Value),
    {
        self.ensure_finite("each")?;
        for item in self.iter() {
            visitor(&item?);
        }
        Ok(())
    }

    /// Stops at the first rejected element; never returns if an infinite
    /// sequence satisfies `predicate` throughout
    pub fn for_all<F>(&self, predicate: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool,
    {
        for item in self.iter() {
            if !predicate(&item?) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn contains(&self, value: &Value) -> Result<bool> {
        self.contains_by(|element| element == value)
    }

    pub fn contains_by<F>(&self, predicate: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool,
    {
        for item in self.iter() {
            if predicate(&item?) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn first(&self) -> Result<Option<Value>> {
        self.iter().next().transpose()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.first()?.is_none())
    }
}

impl fmt::Debug for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seq")
            .field("restartable", &self.is_restartable())
            .field("infinite", &self.infinite)
            .finish_non_exhaustive()
    }
}

impl Object for Seq {
    fn type_name(&self) -> &str {
        "Seq"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn export(&self) -> Result<Option<Value>> {
        self.to_array().map(Some)
    }
}
