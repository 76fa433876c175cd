//! Deferred map/filter/take stages of mutable collections
//!
//! Stages are queued in call order and applied element by element in a
//! single traversal when the owning collection is observed. The result is
//! built in a scratch buffer; the caller swaps it in only on success.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::contract::Contract;
use crate::error::{CollectionError, Result};
use crate::value::Value;

pub(crate) type Transform<E> = Rc<dyn Fn(&E) -> Value>;
pub(crate) type Predicate<E> = Rc<dyn Fn(&E) -> bool>;

/// Unit a pipeline streams: a list value, or a map entry whose value is transformed
pub(crate) trait Element: Clone {
    fn set_value(&mut self, value: Value);
}

impl Element for Value {
    fn set_value(&mut self, value: Value) {
        *self = value;
    }
}

impl Element for (Value, Value) {
    fn set_value(&mut self, value: Value) {
        self.1 = value;
    }
}

/// A queued operation
pub(crate) enum Stage<E, C> {
    /// Replace the value; the result must satisfy `contract`
    Map {
        transform: Transform<E>,
        contract: C,
    },
    Filter(Predicate<E>),
    /// Exactly `n` elements, failing the collapse when fewer arrive
    Take(usize),
    TakeUpTo(usize),
    TakeWhile(Predicate<E>),
}

impl<E, C: Clone> Clone for Stage<E, C> {
    fn clone(&self) -> Self {
        match self {
            Stage::Map {
                transform,
                contract,
            } => Stage::Map {
                transform: Rc::clone(transform),
                contract: contract.clone(),
            },
            Stage::Filter(predicate) => Stage::Filter(Rc::clone(predicate)),
            Stage::Take(n) => Stage::Take(*n),
            Stage::TakeUpTo(n) => Stage::TakeUpTo(*n),
            Stage::TakeWhile(predicate) => Stage::TakeWhile(Rc::clone(predicate)),
        }
    }
}

impl<E, C> fmt::Debug for Stage<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Map { .. } => write!(f, "Map"),
            Stage::Filter(_) => write!(f, "Filter"),
            Stage::Take(n) => write!(f, "Take({n})"),
            Stage::TakeUpTo(n) => write!(f, "TakeUpTo({n})"),
            Stage::TakeWhile(_) => write!(f, "TakeWhile"),
        }
    }
}

pub(crate) struct Pipeline<E, C> {
    stages: Vec<Stage<E, C>>,
}

impl<E, C: Clone> Clone for Pipeline<E, C> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}

impl<E, C> fmt::Debug for Pipeline<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stages.iter()).finish()
    }
}

impl<E, C> Default for Pipeline<E, C> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<E: Element, C: Contract> Pipeline<E, C> {
    pub(crate) fn push(&mut self, stage: Stage<E, C>) {
        self.stages.push(stage);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.stages.clear();
    }

    pub(crate) fn describe(&self) -> Vec<String> {
        self.stages.iter().map(|stage| format!("{stage:?}")).collect()
    }

    /// Apply every stage to every element in one pass
    pub(crate) fn collapse<I>(&self, items: I) -> Result<Vec<E>>
    where
        I: IntoIterator<Item = E>,
    {
        let mut taken = vec![0usize; self.stages.len()];
        let mut closed: Vec<bool> = self
            .stages
            .iter()
            .map(|stage| matches!(stage, Stage::Take(0) | Stage::TakeUpTo(0)))
            .collect();
        let mut output = Vec::new();
        let mut consumed = 0usize;

        'elements: for mut element in items {
            if self.exhausted(&taken, &closed) {
                break;
            }
            consumed += 1;

            for (index, stage) in self.stages.iter().enumerate() {
                if closed[index] {
                    continue 'elements;
                }
                match stage {
                    Stage::Map {
                        transform,
                        contract,
                    } => {
                        let value = transform(&element);
                        contract.check_value(&value)?;
                        element.set_value(value);
                    }
                    Stage::Filter(predicate) => {
                        if !predicate(&element) {
                            continue 'elements;
                        }
                    }
                    Stage::Take(limit) | Stage::TakeUpTo(limit) => {
                        taken[index] += 1;
                        if taken[index] >= *limit {
                            closed[index] = true;
                        }
                    }
                    Stage::TakeWhile(predicate) => {
                        if !predicate(&element) {
                            closed[index] = true;
                            continue 'elements;
                        }
                    }
                }
            }

            output.push(element);
        }

        for (index, stage) in self.stages.iter().enumerate() {
            if let Stage::Take(limit) = stage
                && taken[index] < *limit
            {
                return Err(CollectionError::OutOfRange(format!(
                    "take({limit}) found only {} element(s)",
                    taken[index]
                )));
            }
        }

        tracing::trace!(
            stages = self.stages.len(),
            consumed,
            produced = output.len(),
            "collapsed deferred pipeline"
        );
        Ok(output)
    }

    /// No further element can reach the output, and no earlier strict
    /// `Take` is still waiting to be satisfied
    fn exhausted(&self, taken: &[usize], closed: &[bool]) -> bool {
        for (index, stage) in self.stages.iter().enumerate() {
            if closed[index] {
                return true;
            }
            if let Stage::Take(limit) = stage
                && taken[index] < *limit
            {
                return false;
            }
        }
        false
    }
}

/// Marks a collection as collapsing for as long as it is alive
///
/// A queued callback that observes its own collection would otherwise
/// start a nested collapse of the same pipeline.
pub(crate) struct CollapseGuard<'a>(&'a Cell<bool>);

impl<'a> CollapseGuard<'a> {
    pub(crate) fn enter(flag: &'a Cell<bool>, owner: &str) -> Result<Self> {
        if flag.replace(true) {
            return Err(CollectionError::LogicViolation(format!(
                "{owner} was observed from inside one of its own pending callbacks"
            )));
        }
        Ok(Self(flag))
    }
}

impl Drop for CollapseGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
