//! Key-value datastore contract for tierds.
//!
//! This crate defines the interface every storage backend implements, so
//! that backends can be swapped, stacked and composed without the caller
//! knowing which one it is talking to.
//!
//! # Core Types
//!
//! - [`Key`] -- cleaned hierarchical path (`/users/alice`)
//! - [`Value`] -- opaque payload, a reference-counted [`bytes::Bytes`]
//! - [`Query`] / [`QueryResults`] -- enumeration by prefix, order and limit
//!
//! # Storage Backends
//!
//! All backends implement the [`Datastore`] trait, and hand out
//! [`Transaction`]s for buffered batches:
//!
//! - [`MemoryDatastore`] -- `BTreeMap`-based store for tests, caches and embedding
//!
//! # Contract
//!
//! 1. Keys and values pass through unmodified.
//! 2. `get` of an absent key is [`DatastoreError::NotFound`]; `has` is `Ok(false)`.
//! 3. Deleting an absent key succeeds.
//! 4. Transaction mutations are invisible until `commit` succeeds.
//! 5. A transaction commits at most once.

pub mod error;
pub mod key;
pub mod memory;
pub mod query;
pub mod traits;

pub use error::{DatastoreError, Result, TierErrors};
pub use key::Key;
pub use memory::{MemoryDatastore, MemoryTransaction};
pub use query::{Entry, Order, Query, QueryResults};
pub use traits::{Datastore, Transaction, TxnState};

/// Opaque stored payload.
pub type Value = bytes::Bytes;
