//! Query descriptions and results.
//!
//! A [`Query`] describes an enumeration over a datastore: which keys to
//! include (by prefix), in which order, and how many. Backends with a native
//! query engine translate it; the rest can hand their entries to
//! [`Query::apply`].

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::Value;

/// Result ordering for a query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Whatever order the backend produces.
    #[default]
    Unordered,
    KeyAscending,
    KeyDescending,
}

/// An enumeration request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Only keys equal to or below this key are returned.
    pub prefix: Option<Key>,
    /// Maximum number of entries returned, applied after `offset`.
    pub limit: Option<usize>,
    /// Number of matching entries skipped.
    pub offset: usize,
    /// Return keys without values.
    pub keys_only: bool,
    pub order: Order,
}

impl Query {
    /// A query matching every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// A query matching `prefix` and everything below it.
    pub fn prefix(prefix: impl Into<Key>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Returns `true` if `key` falls under this query's prefix.
    pub fn matches(&self, key: &Key) -> bool {
        match &self.prefix {
            None => true,
            Some(prefix) => prefix == key || prefix.is_ancestor_of(key),
        }
    }

    /// Evaluate this query over an in-process entry source.
    ///
    /// Filtering happens before ordering; offset and limit apply to the
    /// ordered sequence.
    pub fn apply<I>(&self, entries: I) -> QueryResults
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        let mut matched: Vec<(Key, Value)> = entries
            .into_iter()
            .filter(|(k, _)| self.matches(k))
            .collect();

        match self.order {
            Order::Unordered => {}
            Order::KeyAscending => matched.sort_by(|(a, _), (b, _)| a.cmp(b)),
            Order::KeyDescending => matched.sort_by(|(a, _), (b, _)| b.cmp(a)),
        }

        let limit = self.limit.unwrap_or(usize::MAX);
        let entries = matched
            .into_iter()
            .skip(self.offset)
            .take(limit)
            .map(|(key, value)| Entry {
                key,
                value: (!self.keys_only).then_some(value),
            })
            .collect();
        QueryResults::new(entries)
    }
}

/// A single query result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,
    /// `None` when the query was keys-only.
    pub value: Option<Value>,
}

/// The ordered entries produced by a query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryResults {
    entries: Vec<Entry>,
}

impl QueryResults {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl IntoIterator for QueryResults {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResults {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
