use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DatastoreError, Result};
use crate::key::Key;
use crate::query::{Query, QueryResults};
use crate::traits::{Datastore, Transaction, TxnState};
use crate::Value;

type Entries = BTreeMap<Key, Value>;

/// In-memory, `BTreeMap`-based datastore.
///
/// Intended for tests, caches and embedding. Entries live behind a shared
/// `RwLock`; cloning the store yields another handle onto the same entries.
#[derive(Clone, Default)]
pub struct MemoryDatastore {
    entries: Arc<RwLock<Entries>>,
}

impl MemoryDatastore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries from the store.
    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Result<Vec<Key>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Entries>> {
        self.entries
            .read()
            .map_err(|e| DatastoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Entries>> {
        write_entries(&self.entries)
    }
}

fn write_entries(entries: &RwLock<Entries>) -> Result<RwLockWriteGuard<'_, Entries>> {
    entries
        .write()
        .map_err(|e| DatastoreError::Backend(format!("lock poisoned: {e}")))
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn put(&self, key: &Key, value: Value) -> Result<()> {
        self.write()?.insert(key.clone(), value);
        Ok(())
    }

    async fn get(&self, key: &Key) -> Result<Value> {
        self.read()?
            .get(key)
            .cloned()
            .ok_or_else(|| DatastoreError::NotFound(key.clone()))
    }

    async fn has(&self, key: &Key) -> Result<bool> {
        Ok(self.read()?.contains_key(key))
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<QueryResults> {
        let map = self.read()?;
        Ok(query.apply(map.iter().map(|(k, v)| (k.clone(), v.clone()))))
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTransaction::new(Arc::clone(&self.entries))))
    }
}

impl std::fmt::Debug for MemoryDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDatastore")
            .field("entry_count", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// MemoryTransaction
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
    Put(Key, Value),
    Delete(Key),
}

/// Buffered batch against a [`MemoryDatastore`].
///
/// Operations are recorded in order and applied under a single write lock on
/// commit, so readers never observe a half-applied batch.
#[derive(Debug)]
pub struct MemoryTransaction {
    entries: Arc<RwLock<Entries>>,
    ops: Vec<Op>,
    state: TxnState,
}

impl MemoryTransaction {
    fn new(entries: Arc<RwLock<Entries>>) -> Self {
        Self {
            entries,
            ops: Vec::new(),
            state: TxnState::Open,
        }
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    /// Number of buffered operations.
    pub fn pending(&self) -> usize {
        self.ops.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(DatastoreError::TransactionClosed(self.state))
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn put(&mut self, key: &Key, value: Value) -> Result<()> {
        self.ensure_open()?;
        self.ops.push(Op::Put(key.clone(), value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.ensure_open()?;
        self.ops.push(Op::Delete(key.clone()));
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut map = match write_entries(&self.entries) {
            Ok(map) => map,
            Err(e) => {
                self.state = TxnState::Failed;
                return Err(e);
            }
        };
        let count = self.ops.len();
        for op in self.ops.drain(..) {
            match op {
                Op::Put(key, value) => {
                    map.insert(key, value);
                }
                Op::Delete(key) => {
                    map.remove(&key);
                }
            }
        }
        self.state = TxnState::Committed;
        debug!(ops = count, "memory transaction committed");
        Ok(())
    }
}
