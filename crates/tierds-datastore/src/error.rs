use std::fmt;

use crate::key::Key;
use crate::traits::TxnState;

/// Errors from datastore operations.
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    /// No value is stored under the requested key.
    #[error("key not found: {0}")]
    NotFound(Key),

    /// A tiered store was asked to serve a read with zero tiers.
    #[error("no backends configured")]
    NoBackendsConfigured,

    /// A backend operation failed on a specific tier.
    #[error("tier {index}: {source}")]
    Tier {
        index: usize,
        #[source]
        source: Box<DatastoreError>,
    },

    /// One or more tiers failed during a concurrent write-through.
    ///
    /// Tiers not listed here completed the mutation and retain it.
    #[error("write-through failed: {0}")]
    WriteThrough(TierErrors),

    /// The transaction has already been committed or has failed.
    #[error("transaction is {0}")]
    TransactionClosed(TxnState),

    /// Free-form failure reported by a backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// A fan-out task panicked or was cancelled before it reported.
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from an underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatastoreError {
    /// Tag this error with the tier that produced it.
    pub fn at_tier(self, index: usize) -> Self {
        Self::Tier {
            index,
            source: Box::new(self),
        }
    }

    /// Returns `true` if this error means "the key is absent".
    ///
    /// Sees through tier tagging, and through write-through aggregates where
    /// every failing tier reported a missing key.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Tier { source, .. } => source.is_not_found(),
            Self::WriteThrough(errors) => {
                !errors.is_empty() && errors.iter().all(|(_, e)| e.is_not_found())
            }
            _ => false,
        }
    }

    /// The tier index this error originated from, if it was tagged.
    pub fn tier_index(&self) -> Option<usize> {
        match self {
            Self::Tier { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The innermost error, with all tier tags removed.
    pub fn root_cause(&self) -> &DatastoreError {
        match self {
            Self::Tier { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Per-tier failures collected from a concurrent write-through.
///
/// Entries are kept sorted by tier index, so the first entry is always the
/// lowest failing tier regardless of which task finished first.
#[derive(Debug, Default)]
pub struct TierErrors {
    errors: Vec<(usize, DatastoreError)>,
}

impl TierErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `index`, keeping entries ordered by tier.
    pub fn push(&mut self, index: usize, error: DatastoreError) {
        let pos = self.errors.partition_point(|(i, _)| *i <= index);
        self.errors.insert(pos, (index, error));
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Indices of the tiers that failed, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.errors.iter().map(|(i, _)| *i).collect()
    }

    /// The error reported by tier `index`, if it failed.
    pub fn get(&self, index: usize) -> Option<&DatastoreError> {
        self.errors
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, DatastoreError)> {
        self.errors.iter()
    }

    /// Convert into a result: `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DatastoreError::WriteThrough(self))
        }
    }
}

impl fmt::Display for TierErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tier(s) failed", self.errors.len())?;
        for (index, error) in &self.errors {
            write!(f, "; tier {index}: {error}")?;
        }
        Ok(())
    }
}

impl IntoIterator for TierErrors {
    type Item = (usize, DatastoreError);
    type IntoIter = std::vec::IntoIter<(usize, DatastoreError)>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Result alias for datastore operations.
pub type Result<T> = std::result::Result<T, DatastoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_tag_preserves_not_found() {
        let err = DatastoreError::NotFound(Key::new("/a")).at_tier(2);
        assert!(err.is_not_found());
        assert_eq!(err.tier_index(), Some(2));
        assert!(matches!(err.root_cause(), DatastoreError::NotFound(_)));
    }

    #[test]
    fn nested_tier_tags_resolve_root_cause() {
        let err = DatastoreError::Backend("disk full".into())
            .at_tier(0)
            .at_tier(1);
        assert_eq!(err.tier_index(), Some(1));
        assert!(matches!(err.root_cause(), DatastoreError::Backend(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn tier_errors_sorted_by_index() {
        let mut errors = TierErrors::new();
        errors.push(3, DatastoreError::Backend("c".into()));
        errors.push(0, DatastoreError::Backend("a".into()));
        errors.push(1, DatastoreError::Backend("b".into()));
        assert_eq!(errors.indices(), vec![0, 1, 3]);
        assert!(errors.get(1).is_some());
        assert!(errors.get(2).is_none());
    }

    #[test]
    fn tier_errors_display_lists_every_tier() {
        let mut errors = TierErrors::new();
        errors.push(1, DatastoreError::Backend("remote down".into()));
        errors.push(0, DatastoreError::Backend("cache full".into()));
        let msg = DatastoreError::WriteThrough(errors).to_string();
        assert!(msg.contains("2 tier(s) failed"));
        assert!(msg.contains("tier 0: backend error: cache full"));
        assert!(msg.contains("tier 1: backend error: remote down"));
    }

    #[test]
    fn empty_tier_errors_is_ok() {
        assert!(TierErrors::new().into_result().is_ok());
    }

    #[test]
    fn write_through_not_found_requires_all_tiers() {
        let mut errors = TierErrors::new();
        errors.push(0, DatastoreError::NotFound(Key::new("/k")));
        errors.push(1, DatastoreError::Backend("x".into()));
        assert!(!DatastoreError::WriteThrough(errors).is_not_found());
    }

    #[test]
    fn closed_transaction_display() {
        let err = DatastoreError::TransactionClosed(TxnState::Committed);
        assert_eq!(err.to_string(), "transaction is committed");
    }
}
