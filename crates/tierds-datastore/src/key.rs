//! Hierarchical datastore keys.
//!
//! A [`Key`] is a slash-separated path such as `/users/alice/profile`. Keys
//! are cleaned on construction:
//! - Always anchored at `/`
//! - No trailing `/` (except the root key itself)
//! - Repeated slashes collapse to one
//! - `.` segments are dropped, `..` segments pop a parent (never above root)

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cleaned, hierarchical datastore key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Build a key from any path-like string, cleaning it.
    ///
    /// # Examples
    ///
    /// ```
    /// use tierds_datastore::Key;
    ///
    /// assert_eq!(Key::new("a//b/").as_str(), "/a/b");
    /// assert_eq!(Key::new("/a/./b/../c").as_str(), "/a/c");
    /// assert_eq!(Key::new("").as_str(), "/");
    /// ```
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(clean(path.as_ref()))
    }

    /// Build a key without cleaning. The caller guarantees `path` is clean.
    pub fn raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The root key `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments, outermost first. The root key has none.
    pub fn namespaces(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Last path segment, or `""` for the root key.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// The enclosing key. The root is its own parent.
    pub fn parent(&self) -> Key {
        match self.0.rfind('/') {
            Some(0) | None => Key::root(),
            Some(pos) => Key(self.0[..pos].to_string()),
        }
    }

    /// Append `name` (which may itself contain `/`) below this key.
    pub fn child(&self, name: impl AsRef<str>) -> Key {
        Key::new(format!("{}/{}", self.0, name.as_ref()))
    }

    /// Returns `true` if `other` lies strictly below this key.
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Returns `true` if this key lies strictly below `other`.
    pub fn is_descendant_of(&self, other: &Key) -> bool {
        other.is_ancestor_of(self)
    }
}

fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::new(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::new(s)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}
