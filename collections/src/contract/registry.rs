use std::collections::HashSet;

/// Names of the types and interfaces the crate's own collections answer to
pub const BUILTIN_TYPES: &[&str] = &[
    "Collection",
    "ListCollection",
    "MapCollection",
    "Mutable",
    "Immutable",
    "List",
    "GenericList",
    "ImmutableList",
    "ImmutableGenericList",
    "Map",
    "GenericMap",
    "ImmutableMap",
    "ImmutableGenericMap",
    "Seq",
];

/// Set of type and interface names an `instance_of_<Name>` token may refer to
///
/// Registration only makes a name declarable; whether a value *is* an
/// instance is decided by [`crate::Object::is_instance_of`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    names: HashSet<String>,
}

impl TypeRegistry {
    /// Registry without even the builtin collection names
    pub fn empty() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>) -> &mut Self {
        self.names.insert(name.into());
        self
    }

    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        self.register(name);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            names: BUILTIN_TYPES.iter().map(|name| name.to_string()).collect(),
        }
    }
}
