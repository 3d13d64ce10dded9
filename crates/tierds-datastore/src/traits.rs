use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::key::Key;
use crate::query::{Query, QueryResults};
use crate::Value;

/// Key-value datastore.
///
/// All implementations must satisfy these invariants:
/// - Keys and values are opaque: the store never rewrites them.
/// - `get` on an absent key returns [`DatastoreError::NotFound`].
/// - `has` on an absent key returns `Ok(false)`, never an error.
/// - `delete` of an absent key succeeds.
/// - Each backend owns its internal concurrency control; callers may share a
///   datastore across tasks.
///
/// [`DatastoreError::NotFound`]: crate::DatastoreError::NotFound
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &Key, value: Value) -> Result<()>;

    /// Retrieve the value stored under `key`.
    async fn get(&self, key: &Key) -> Result<Value>;

    /// Check whether `key` maps to a value.
    async fn has(&self, key: &Key) -> Result<bool>;

    /// Remove the value stored under `key`.
    async fn delete(&self, key: &Key) -> Result<()>;

    /// Enumerate entries matching `query`.
    async fn query(&self, query: &Query) -> Result<QueryResults>;

    /// Start a batch of buffered mutations.
    ///
    /// Nothing is visible in the store until [`Transaction::commit`] succeeds.
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;
}

/// A batch of mutations against one datastore.
#[async_trait]
pub trait Transaction: Send {
    async fn put(&mut self, key: &Key, value: Value) -> Result<()>;

    async fn delete(&mut self, key: &Key) -> Result<()>;

    /// Apply every buffered mutation. A transaction commits at most once.
    async fn commit(&mut self) -> Result<()>;
}

/// Lifecycle of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnState {
    /// Accepting puts and deletes.
    Open,
    /// Commit succeeded. Terminal.
    Committed,
    /// An operation returned an error. Terminal.
    Failed,
}

impl TxnState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for TxnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Committed => write!(f, "committed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[async_trait]
impl<D: Datastore + ?Sized> Datastore for Arc<D> {
    async fn put(&self, key: &Key, value: Value) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn get(&self, key: &Key) -> Result<Value> {
        (**self).get(key).await
    }

    async fn has(&self, key: &Key) -> Result<bool> {
        (**self).has(key).await
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        (**self).delete(key).await
    }

    async fn query(&self, query: &Query) -> Result<QueryResults> {
        (**self).query(query).await
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        (**self).begin_transaction().await
    }
}

#[async_trait]
impl<D: Datastore + ?Sized> Datastore for Box<D> {
    async fn put(&self, key: &Key, value: Value) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn get(&self, key: &Key) -> Result<Value> {
        (**self).get(key).await
    }

    async fn has(&self, key: &Key) -> Result<bool> {
        (**self).has(key).await
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        (**self).delete(key).await
    }

    async fn query(&self, query: &Query) -> Result<QueryResults> {
        (**self).query(query).await
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        (**self).begin_transaction().await
    }
}

#[async_trait]
impl<T: Transaction + ?Sized> Transaction for Box<T> {
    async fn put(&mut self, key: &Key, value: Value) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        (**self).delete(key).await
    }

    async fn commit(&mut self) -> Result<()> {
        (**self).commit().await
    }
}
