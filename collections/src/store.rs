use im_rc::{HashMap, Vector};

use crate::error::{CollectionError, Result};
use crate::value::Value;

/// Insertion-ordered key/value storage backing every map
///
/// Keys are restricted to scalars. Setting an existing key replaces its
/// value and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OrderedStore {
    order: Vector<Value>,
    entries: HashMap<Value, Value>,
}

impl OrderedStore {
    pub(crate) fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut store = Self::default();
        for (key, value) in entries {
            store.set(key, value)?;
        }
        Ok(store)
    }

    fn ensure_key(key: &Value) -> Result<()> {
        if key.is_scalar() {
            Ok(())
        } else {
            Err(CollectionError::type_mismatch(key, "int|string|float|bool"))
        }
    }

    pub(crate) fn set(&mut self, key: Value, value: Value) -> Result<()> {
        Self::ensure_key(&key)?;
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        Ok(())
    }

    pub(crate) fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub(crate) fn remove(&mut self, key: &Value) -> Option<Value> {
        let removed = self.entries.remove(key)?;
        if let Some(position) = self.order.index_of(key) {
            self.order.remove(position);
        }
        Some(removed)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|value| (key, value)))
    }

    pub(crate) fn to_entries(&self) -> Vec<(Value, Value)> {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Native dict with nested collections exported
    pub(crate) fn export(&self) -> Result<Value> {
        self.iter()
            .map(|(key, value)| Ok((key.clone(), value.export()?)))
            .collect::<Result<Vector<_>>>()
            .map(Value::Dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(&str, i64)]) -> OrderedStore {
        OrderedStore::from_entries(
            entries
                .iter()
                .map(|(key, value)| (Value::from(*key), Value::Int(*value))),
        )
        .unwrap()
    }

    fn keys(store: &OrderedStore) -> Vec<Value> {
        store.iter().map(|(key, _)| key.clone()).collect()
    }

    #[test]
    fn keeps_insertion_order() {
        let store = store(&[("b", 1), ("a", 2), ("c", 3)]);

        assert_eq!(
            keys(&store),
            vec![Value::from("b"), Value::from("a"), Value::from("c")]
        );
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut store = store(&[("a", 1), ("b", 2)]);
        store.set(Value::from("a"), Value::Int(9)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.to_entries(),
            vec![
                (Value::from("a"), Value::Int(9)),
                (Value::from("b"), Value::Int(2)),
            ]
        );
    }

    #[test]
    fn remove_drops_key_from_order() {
        let mut store = store(&[("a", 1), ("b", 2)]);

        assert_eq!(store.remove(&Value::from("a")), Some(Value::Int(1)));
        assert_eq!(store.remove(&Value::from("a")), None);
        assert_eq!(keys(&store), vec![Value::from("b")]);
    }

    #[test]
    fn rejects_non_scalar_keys() {
        let mut store = OrderedStore::default();

        assert!(store.set(Value::array([]), Value::Null).unwrap_err().is_invalid_type());
        assert!(store.set(Value::Null, Value::Null).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn int_and_float_keys_are_distinct() {
        let mut store = OrderedStore::default();
        store.set(Value::Int(1), Value::from("int")).unwrap();
        store.set(Value::from(1.0), Value::from("float")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&Value::Int(1)), Some(&Value::from("int")));
    }
}
