//! The tiered datastore.
//!
//! A [`TieredDatastore`] composes an ordered list of backends ("tiers") into
//! one [`Datastore`]. Order carries two meanings:
//!
//! - Index `0` is tried first for reads (`get`, `has`). Put the cheapest,
//!   least complete tier here, e.g. an in-memory cache.
//! - The last index is the most complete tier. It alone answers `query`
//!   and is the final fallback for reads.
//!
//! # Per-operation policy
//!
//! | Operation | Policy |
//! |---|---|
//! | `put`, `delete` | write-through to every tier concurrently |
//! | `get` | sequential fallback, first success wins |
//! | `has` | sequential fallback, first `Ok(true)` wins |
//! | `query` | last tier only |
//! | `begin_transaction` | one handle per tier, in order |
//!
//! # Partial failure
//!
//! Write-through is **not** all-or-nothing. `Ok(())` means every tier
//! confirmed the mutation. `Err(DatastoreError::WriteThrough(_))` means at
//! least one tier failed; every tier absent from the error completed the
//! mutation and keeps it. Nothing is rolled back, and later reads may see the
//! new value or the old one depending on which tier answers.

use std::sync::Arc;

use async_trait::async_trait;
use tierds_datastore::{
    Datastore, DatastoreError, Key, Query, QueryResults, Result, TierErrors, Transaction, Value,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::TieredConfig;
use crate::transaction::TieredTransaction;

/// Ordered composition of datastores. See the [module docs](self).
pub struct TieredDatastore {
    tiers: Vec<Arc<dyn Datastore>>,
    config: TieredConfig,
}

impl TieredDatastore {
    /// Compose `tiers`, first-tried first, most complete last.
    ///
    /// An empty list is accepted; reads then fail with
    /// [`DatastoreError::NoBackendsConfigured`].
    pub fn new(tiers: Vec<Arc<dyn Datastore>>) -> Self {
        Self {
            tiers,
            config: TieredConfig::default(),
        }
    }

    /// Compose `tiers`, rejecting an empty list up front.
    pub fn try_new(tiers: Vec<Arc<dyn Datastore>>) -> Result<Self> {
        Self::with_config(tiers, TieredConfig::fail_fast())
    }

    /// Compose `tiers` with explicit settings.
    pub fn with_config(tiers: Vec<Arc<dyn Datastore>>, config: TieredConfig) -> Result<Self> {
        if tiers.is_empty() && !config.allow_empty {
            return Err(DatastoreError::NoBackendsConfigured);
        }
        debug!(store = %config.name, tiers = tiers.len(), "tiered datastore created");
        Ok(Self { tiers, config })
    }

    pub fn config(&self) -> &TieredConfig {
        &self.config
    }

    /// The tiers, in read order.
    pub fn tiers(&self) -> &[Arc<dyn Datastore>] {
        &self.tiers
    }

    pub fn tier(&self, index: usize) -> Option<&Arc<dyn Datastore>> {
        self.tiers.get(index)
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Start a transaction spanning every tier, keeping the concrete type.
    ///
    /// Handles are opened in tier order. If any tier cannot open one, the
    /// error is returned tagged with that tier and no transaction is produced.
    pub async fn begin(&self) -> Result<TieredTransaction> {
        let mut handles = Vec::with_capacity(self.tiers.len());
        for (index, tier) in self.tiers.iter().enumerate() {
            let handle = tier.begin_transaction().await.map_err(|e| {
                warn!(store = %self.config.name, tier = index, error = %e, "begin transaction failed");
                e.at_tier(index)
            })?;
            handles.push(handle);
        }
        debug!(store = %self.config.name, tiers = handles.len(), "transaction started");
        Ok(TieredTransaction::new(handles, self.config.name.clone()))
    }

    /// Wait for every spawned tier task and aggregate the failures.
    ///
    /// Handles are awaited in tier order, but the tasks were all spawned up
    /// front, so they run concurrently and each runs to completion
    /// regardless of the others.
    async fn join_write_through(
        &self,
        op: &'static str,
        key: &Key,
        handles: Vec<JoinHandle<Result<()>>>,
    ) -> Result<()> {
        let mut errors = TierErrors::new();
        for (index, handle) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(DatastoreError::TaskFailed(e.to_string())),
            };
            if let Err(e) = outcome {
                warn!(store = %self.config.name, tier = index, op, key = %key, error = %e, "write-through failed on tier");
                errors.push(index, e);
            }
        }
        if errors.is_empty() {
            debug!(store = %self.config.name, op, key = %key, tiers = self.tiers.len(), "write-through complete");
        }
        errors.into_result()
    }
}

#[async_trait]
impl Datastore for TieredDatastore {
    /// Write `value` to every tier concurrently.
    ///
    /// Succeeds only if every tier succeeds. On failure, tiers not named in
    /// the returned [`DatastoreError::WriteThrough`] still hold the value.
    async fn put(&self, key: &Key, value: Value) -> Result<()> {
        let handles = self
            .tiers
            .iter()
            .map(|tier| {
                let tier = Arc::clone(tier);
                let key = key.clone();
                let value = value.clone();
                tokio::spawn(async move { tier.put(&key, value).await })
            })
            .collect();
        self.join_write_through("put", key, handles).await
    }

    /// Read from the first tier that answers without error.
    ///
    /// When every tier fails, the last tier's error is returned.
    async fn get(&self, key: &Key) -> Result<Value> {
        let mut last = DatastoreError::NoBackendsConfigured;
        for (index, tier) in self.tiers.iter().enumerate() {
            match tier.get(key).await {
                Ok(value) => {
                    debug!(store = %self.config.name, tier = index, key = %key, "get served");
                    return Ok(value);
                }
                Err(e) => {
                    debug!(store = %self.config.name, tier = index, key = %key, error = %e, "get fell through");
                    last = e.at_tier(index);
                }
            }
        }
        Err(last)
    }

    /// Stops at the first tier reporting `Ok(true)`.
    ///
    /// `Ok(false)` from an early tier is not trusted; the scan continues and
    /// the final tier's answer, error or not, is returned as-is.
    async fn has(&self, key: &Key) -> Result<bool> {
        let mut result = Err(DatastoreError::NoBackendsConfigured);
        for (index, tier) in self.tiers.iter().enumerate() {
            result = tier.has(key).await.map_err(|e| e.at_tier(index));
            if matches!(result, Ok(true)) {
                debug!(store = %self.config.name, tier = index, key = %key, "has confirmed");
                break;
            }
        }
        result
    }

    /// Remove `key` from every tier concurrently. Same partial-failure
    /// semantics as [`put`](Self::put).
    async fn delete(&self, key: &Key) -> Result<()> {
        let handles = self
            .tiers
            .iter()
            .map(|tier| {
                let tier = Arc::clone(tier);
                let key = key.clone();
                tokio::spawn(async move { tier.delete(&key).await })
            })
            .collect();
        self.join_write_through("delete", key, handles).await
    }

    /// Answered by the last, most complete tier only. Entries held solely by
    /// earlier tiers are not visible here.
    async fn query(&self, query: &Query) -> Result<QueryResults> {
        let index = self
            .tiers
            .len()
            .checked_sub(1)
            .ok_or(DatastoreError::NoBackendsConfigured)?;
        self.tiers[index]
            .query(query)
            .await
            .map_err(|e| e.at_tier(index))
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(self.begin().await?))
    }
}

impl std::fmt::Debug for TieredDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredDatastore")
            .field("name", &self.config.name)
            .field("tier_count", &self.tiers.len())
            .finish()
    }
}
