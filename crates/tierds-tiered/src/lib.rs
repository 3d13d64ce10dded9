//! Tiered composition of datastores.
//!
//! [`TieredDatastore`] stacks independent backends, for example an in-memory
//! cache, a local disk store and a remote durable store, behind a single
//! [`Datastore`](tierds_datastore::Datastore):
//!
//! - **Mutations** write through to every tier concurrently.
//! - **Reads** try tiers in order and stop at the first satisfactory answer.
//! - **Queries** go to the last, most complete tier only.
//! - **Transactions** ([`TieredTransaction`]) apply each operation to every
//!   tier in lockstep, stopping at the first failure.
//!
//! A `TieredDatastore` is itself a `Datastore`, so stacks nest.
//!
//! # Partial failure
//!
//! Nothing here is atomic across tiers. A failed write-through reports every
//! failing tier by index, and every other tier keeps the mutation. A failed
//! transaction commit leaves earlier tiers committed. Callers that need
//! all-or-nothing semantics must reconcile tiers themselves.
//!
//! # Modules
//!
//! - [`config`] -- [`TieredConfig`] construction settings
//! - [`store`] -- [`TieredDatastore`]
//! - [`transaction`] -- [`TieredTransaction`]

pub mod config;
pub mod store;
pub mod transaction;

#[cfg(test)]
mod test_support;

pub use config::TieredConfig;
pub use store::TieredDatastore;
pub use transaction::TieredTransaction;
