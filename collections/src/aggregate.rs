//! Terminal helpers shared by lists, maps and sequences

use std::cmp::Ordering;
use std::collections::HashSet;

use im_rc::Vector;

use crate::error::{CollectionError, Result};
use crate::store::OrderedStore;
use crate::value::Value;

// ============================================================================
// Aggregation
// ============================================================================

/// Running numeric total
///
/// Stays an integer until a float is added (or the integer total overflows),
/// then continues as a float.
#[derive(Debug, Default)]
pub(crate) struct Sum {
    int: i64,
    float: Option<f64>,
}

impl Sum {
    pub(crate) fn add(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Int(n) => match self.float.as_mut() {
                Some(total) => *total += *n as f64,
                None => match self.int.checked_add(*n) {
                    Some(total) => self.int = total,
                    None => self.float = Some(self.int as f64 + *n as f64),
                },
            },
            Value::Float(n) => {
                *self.float.get_or_insert(self.int as f64) += n.0;
            }
            other => return Err(CollectionError::type_mismatch(other, "int|float")),
        }
        Ok(())
    }

    pub(crate) fn total(self) -> Value {
        match self.float {
            Some(total) => Value::from(total),
            None => Value::Int(self.int),
        }
    }
}

/// sum(values) → Int | Float
/// Empty input sums to `0`.
pub(crate) fn sum<'a, I>(values: I) -> Result<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut sum = Sum::default();
    for value in values {
        sum.add(value)?;
    }
    Ok(sum.total())
}

/// Smallest or largest element by a key; ties keep the earliest element
#[derive(Debug)]
pub(crate) struct Extremum {
    wanted: Ordering,
    best: Option<(Value, Value)>,
}

impl Extremum {
    pub(crate) fn min() -> Self {
        Self {
            wanted: Ordering::Less,
            best: None,
        }
    }

    pub(crate) fn max() -> Self {
        Self {
            wanted: Ordering::Greater,
            best: None,
        }
    }

    pub(crate) fn offer(&mut self, element: Value, key: Value) -> Result<()> {
        let replace = match &self.best {
            None => true,
            Some((best_key, _)) => key.compare(best_key)? == self.wanted,
        };
        if replace {
            self.best = Some((key, element));
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Option<Value> {
        self.best.map(|(_, element)| element)
    }
}

/// min/max(values, key) → element | None
pub(crate) fn extremum<'a, I, F>(mut extremum: Extremum, values: I, key: F) -> Result<Option<Value>>
where
    I: IntoIterator<Item = &'a Value>,
    F: Fn(&Value) -> Value,
{
    for value in values {
        extremum.offer(value.clone(), key(value))?;
    }
    Ok(extremum.finish())
}

/// implode(values, separator) → String
/// Strings are joined unquoted; null joins as an empty string.
pub(crate) fn implode<'a, I>(values: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a Value>,
{
    values
        .into_iter()
        .map(Value::to_plain_string)
        .collect::<Vec<_>>()
        .join(separator)
}

// ============================================================================
// Ordering
// ============================================================================

/// Stable sort by a key; incomparable keys fail the whole sort
pub(crate) fn sort_by_key<I, F>(values: I, key: F, descending: bool) -> Result<Vec<Value>>
where
    I: IntoIterator<Item = Value>,
    F: Fn(&Value) -> Value,
{
    let keyed: Vec<(Value, Value)> = values
        .into_iter()
        .map(|value| (key(&value), value))
        .collect();

    let sorted = merge_sort(keyed, &mut |a: &(Value, Value), b: &(Value, Value)| {
        let ordering = a.0.compare(&b.0)?;
        Ok(if descending {
            ordering.reverse()
        } else {
            ordering
        })
    })?;

    Ok(sorted.into_iter().map(|(_, value)| value).collect())
}

pub(crate) fn sort<I>(values: I, descending: bool) -> Result<Vec<Value>>
where
    I: IntoIterator<Item = Value>,
{
    sort_by_key(values, Value::clone, descending)
}

// Stable merge sort; stops at the first failed comparison
fn merge_sort<T, F>(mut items: Vec<T>, compare: &mut F) -> Result<Vec<T>>
where
    F: FnMut(&T, &T) -> Result<Ordering>,
{
    if items.len() <= 1 {
        return Ok(items);
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let from_right = compare(r, l)? == Ordering::Less;
        let next = if from_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);

    Ok(merged)
}

/// unique_by(values, key) → values
/// Keeps the first element of every key.
pub(crate) fn unique_by<I, F>(values: I, key: F) -> Vec<Value>
where
    I: IntoIterator<Item = Value>,
    F: Fn(&Value) -> Value,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(key(value)))
        .collect()
}

// ============================================================================
// Grouping
// ============================================================================

/// group_by(values, key) → {key: [values]}
/// Groups appear in order of their first member.
pub(crate) fn group_by<'a, I, F>(values: I, key: F) -> Result<OrderedStore>
where
    I: IntoIterator<Item = &'a Value>,
    F: Fn(&Value) -> Value,
{
    let mut groups = OrderedStore::default();
    for value in values {
        let group = key(value);
        let mut members = match groups.get(&group) {
            Some(Value::Array(members)) => members.clone(),
            _ => Vector::new(),
        };
        members.push_back(value.clone());
        groups.set(group, Value::Array(members))?;
    }
    Ok(groups)
}

/// count_by(values, key) → {key: count}
pub(crate) fn count_by<'a, I, F>(values: I, key: F) -> Result<OrderedStore>
where
    I: IntoIterator<Item = &'a Value>,
    F: Fn(&Value) -> Value,
{
    let mut counts = OrderedStore::default();
    for value in values {
        let group = key(value);
        let count = counts.get(&group).and_then(Value::as_int).unwrap_or(0);
        counts.set(group, Value::Int(count + 1))?;
    }
    Ok(counts)
}
