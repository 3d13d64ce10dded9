use async_trait::async_trait;
use tierds_datastore::{DatastoreError, Key, Result, Transaction, TxnState, Value};
use tracing::{debug, warn};

/// A batch spanning every tier of a [`TieredDatastore`].
///
/// Holds one backend transaction per tier, in tier order. Every operation is
/// applied to the handles sequentially and stops at the first tier that
/// fails. There is no cross-tier rollback: when tier `k` fails, tiers
/// `0..k` have already applied the operation and tiers after `k` were never
/// asked. After any failure the transaction is [`TxnState::Failed`] and
/// rejects further use.
///
/// [`TieredDatastore`]: crate::TieredDatastore
pub struct TieredTransaction {
    handles: Vec<Box<dyn Transaction>>,
    state: TxnState,
    store: String,
}

impl TieredTransaction {
    pub(crate) fn new(handles: Vec<Box<dyn Transaction>>, store: String) -> Self {
        Self {
            handles,
            state: TxnState::Open,
            store,
        }
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    /// Number of per-tier handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(DatastoreError::TransactionClosed(self.state))
        }
    }

    fn fail(&mut self, op: &'static str, index: usize, error: DatastoreError) -> DatastoreError {
        warn!(store = %self.store, tier = index, op, error = %error, "transaction aborted");
        self.state = TxnState::Failed;
        error.at_tier(index)
    }
}

#[async_trait]
impl Transaction for TieredTransaction {
    async fn put(&mut self, key: &Key, value: Value) -> Result<()> {
        self.ensure_open()?;
        for index in 0..self.handles.len() {
            let result = self.handles[index].put(key, value.clone()).await;
            if let Err(e) = result {
                return Err(self.fail("put", index, e));
            }
        }
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.ensure_open()?;
        for index in 0..self.handles.len() {
            let result = self.handles[index].delete(key).await;
            if let Err(e) = result {
                return Err(self.fail("delete", index, e));
            }
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        for index in 0..self.handles.len() {
            let result = self.handles[index].commit().await;
            if let Err(e) = result {
                return Err(self.fail("commit", index, e));
            }
        }
        self.state = TxnState::Committed;
        debug!(store = %self.store, tiers = self.handles.len(), "transaction committed");
        Ok(())
    }
}

impl std::fmt::Debug for TieredTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredTransaction")
            .field("store", &self.store)
            .field("state", &self.state)
            .field("tier_count", &self.handles.len())
            .finish()
    }
}
