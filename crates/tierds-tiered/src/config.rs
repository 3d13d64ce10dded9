use serde::{Deserialize, Serialize};
use tierds_datastore::{DatastoreError, Result};

/// Construction-time settings for a [`TieredDatastore`].
///
/// [`TieredDatastore`]: crate::TieredDatastore
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieredConfig {
    /// Label attached to every log event from this store.
    pub name: String,
    /// Accept an empty tier list at construction. When `false`, construction
    /// fails with `NoBackendsConfigured` instead of failing on first read.
    pub allow_empty: bool,
}

impl Default for TieredConfig {
    fn default() -> Self {
        Self {
            name: "tiered".to_string(),
            allow_empty: true,
        }
    }
}

impl TieredConfig {
    /// Default settings, but rejecting an empty tier list.
    pub fn fail_fast() -> Self {
        Self {
            allow_empty: false,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parse settings from a TOML document. Missing fields take defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| DatastoreError::Serialization(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| DatastoreError::Serialization(e.to_string()))
    }
}
