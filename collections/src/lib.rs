//! Runtime-typed functional collections
//!
//! - [`List`] and [`Map`] queue `map`/`filter`/`take*` as a deferred
//!   pipeline and run it in one pass the first time the collection is
//!   observed or mutated.
//! - [`ImmutableList`] and [`ImmutableMap`] return a new collection from
//!   every mutator and share structure with their source.
//! - [`GenericList`], [`GenericMap`] and their immutable forms check every
//!   key and value against a declared [`TypeContract`].
//! - [`Seq`] is a lazy, possibly infinite sequence.
//!
//! ```
//! use funcollect::prelude::*;
//!
//! let names = GenericList::from_typed("string", ["key", "key2", "key3"].map(Value::from))?;
//! let tagged = names
//!     .filter(|v| v.as_str() != Some("key"))
//!     .map(|v| Value::from(format!("{}_", v.to_plain_string())));
//!
//! assert_eq!(tagged.to_vec()?, vec![Value::from("key2_"), Value::from("key3_")]);
//! assert!(tagged.clone().add(Value::Int(1)).is_err());
//! # Ok::<(), CollectionError>(())
//! ```

pub mod contract;
pub mod error;
pub mod list;
pub mod map;
pub mod seq;
pub mod traits;
pub mod value;

mod aggregate;
mod pipeline;
mod store;

pub use contract::{Checked, Contract, TypeContract, TypeKind, TypeRegistry, TypeSpec, Unchecked};
pub use error::{CollectionError, Result};
pub use list::{GenericList, ImmutableGenericList, ImmutableList, List};
pub use map::{Entry, GenericMap, ImmutableGenericMap, ImmutableMap, Map};
pub use seq::{Number, RangeSpec, Seq};
pub use traits::{Collection, FromPairs, FromValues, ListView, MapView};
pub use value::{Object, Value};

/// Types and traits most callers need
pub mod prelude {
    pub use crate::contract::{TypeContract, TypeRegistry, TypeSpec};
    pub use crate::error::{CollectionError, Result};
    pub use crate::list::{GenericList, ImmutableGenericList, ImmutableList, List};
    pub use crate::map::{GenericMap, ImmutableGenericMap, ImmutableMap, Map};
    pub use crate::seq::{RangeSpec, Seq};
    pub use crate::traits::{Collection, FromPairs, FromValues, ListView, MapView};
    pub use crate::value::{Object, Value};
}
