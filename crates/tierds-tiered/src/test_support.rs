//! Instrumented backend for exercising tier composition.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tierds_datastore::{
    Datastore, DatastoreError, Key, MemoryDatastore, Query, QueryResults, Result, Transaction,
    Value,
};
use tokio::sync::Barrier;

/// Shared, ordered record of calls across several instrumented tiers.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// A [`MemoryDatastore`] that logs every call as `"{label}:{op}"`, can fail
/// chosen operations, and can panic when touched at all.
#[derive(Clone)]
pub struct Instrumented {
    pub label: &'static str,
    pub inner: MemoryDatastore,
    journal: Journal,
    failing: HashSet<&'static str>,
    panic_on_touch: bool,
    put_barrier: Option<Arc<Barrier>>,
}

impl Instrumented {
    pub fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            inner: MemoryDatastore::new(),
            journal: Arc::clone(journal),
            failing: HashSet::new(),
            panic_on_touch: false,
            put_barrier: None,
        }
    }

    /// Fail `op` (`put`, `get`, `has`, `delete`, `query`, `begin`,
    /// `txn_put`, `txn_delete`, `commit`) with a backend error.
    pub fn failing(mut self, op: &'static str) -> Self {
        self.failing.insert(op);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_touch = true;
        self
    }

    /// Make `put` wait on `barrier` before writing.
    pub fn with_put_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.put_barrier = Some(barrier);
        self
    }

    pub fn shared(self) -> Arc<dyn Datastore> {
        Arc::new(self)
    }

    fn touch(&self, op: &'static str) -> Result<()> {
        record(&self.journal, self.label, op);
        if self.panic_on_touch {
            panic!("tier {} must not be touched ({op})", self.label);
        }
        check(&self.failing, self.label, op)
    }
}

fn record(journal: &Journal, label: &str, op: &str) {
    journal.lock().unwrap().push(format!("{label}:{op}"));
}

fn check(failing: &HashSet<&'static str>, label: &str, op: &str) -> Result<()> {
    if failing.contains(op) {
        Err(DatastoreError::Backend(format!("{label} {op} failed")))
    } else {
        Ok(())
    }
}

#[async_trait]
impl Datastore for Instrumented {
    async fn put(&self, key: &Key, value: Value) -> Result<()> {
        if let Some(barrier) = &self.put_barrier {
            barrier.wait().await;
        }
        self.touch("put")?;
        self.inner.put(key, value).await
    }

    async fn get(&self, key: &Key) -> Result<Value> {
        self.touch("get")?;
        self.inner.get(key).await
    }

    async fn has(&self, key: &Key) -> Result<bool> {
        self.touch("has")?;
        self.inner.has(key).await
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.touch("delete")?;
        self.inner.delete(key).await
    }

    async fn query(&self, query: &Query) -> Result<QueryResults> {
        self.touch("query")?;
        self.inner.query(query).await
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        self.touch("begin")?;
        let inner = self.inner.begin_transaction().await?;
        Ok(Box::new(InstrumentedTransaction {
            label: self.label,
            inner,
            journal: Arc::clone(&self.journal),
            failing: self.failing.clone(),
        }))
    }
}

struct InstrumentedTransaction {
    label: &'static str,
    inner: Box<dyn Transaction>,
    journal: Journal,
    failing: HashSet<&'static str>,
}

impl InstrumentedTransaction {
    fn touch(&self, op: &'static str) -> Result<()> {
        record(&self.journal, self.label, op);
        check(&self.failing, self.label, op)
    }
}

#[async_trait]
impl Transaction for InstrumentedTransaction {
    async fn put(&mut self, key: &Key, value: Value) -> Result<()> {
        self.touch("txn_put")?;
        self.inner.put(key, value).await
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.touch("txn_delete")?;
        self.inner.delete(key).await
    }

    async fn commit(&mut self) -> Result<()> {
        self.touch("commit")?;
        self.inner.commit().await
    }
}
