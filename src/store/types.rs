use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::ops::Bound;

use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

/// Cells of one column family, keyed by column key.
pub type Cells = BTreeMap<SmolStr, Vec<u8>>;

const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Configuration for [`crate::store::RedbStore::open_with_config`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of cells kept in the LRU read cache.
    ///
    /// Evicted cells stay on disk and are re-read on the next access.
    pub cache_capacity: NonZeroUsize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),
    /// A counter cell does not hold an 8-byte integer.
    #[error("corrupt counter cell '{key}': {len} bytes")]
    Corrupt { key: String, len: usize },
    #[error("counter `{key}` overflows")]
    Overflow { key: String },
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        StoreError::Redb(e.into())
    }
}

/// Inclusive range of column keys. An open end is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeyRange {
    pub start: Option<SmolStr>,
    pub end: Option<SmolStr>,
}

impl KeyRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: impl Into<SmolStr>, end: impl Into<SmolStr>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    pub fn starting_at(start: impl Into<SmolStr>) -> Self {
        Self {
            start: Some(start.into()),
            end: None,
        }
    }

    pub fn up_to(end: impl Into<SmolStr>) -> Self {
        Self {
            start: None,
            end: Some(end.into()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.start.as_deref().is_none_or(|s| key >= s) && self.end.as_deref().is_none_or(|e| key <= e)
    }

    /// A range whose start sorts after its end.
    pub fn is_inverted(&self) -> bool {
        matches!((&self.start, &self.end), (Some(s), Some(e)) if s > e)
    }

    pub fn bounds(&self) -> (Bound<&str>, Bound<&str>) {
        (
            self.start.as_deref().map_or(Bound::Unbounded, Bound::Included),
            self.end.as_deref().map_or(Bound::Unbounded, Bound::Included),
        )
    }
}

/// Everything one family has to push to the store for one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyDelta {
    pub family: SmolStr,
    /// Encoded cells to write.
    pub puts: BTreeMap<SmolStr, Vec<u8>>,
    pub deletes: BTreeSet<SmolStr>,
    /// Counter deltas added to the stored value.
    pub increments: BTreeMap<SmolStr, i64>,
}

impl FamilyDelta {
    pub fn new(family: impl Into<SmolStr>) -> Self {
        Self {
            family: family.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty() && self.increments.is_empty()
    }

    /// Every key this delta touches.
    pub fn keys(&self) -> impl Iterator<Item = &SmolStr> {
        self.puts
            .keys()
            .chain(self.deletes.iter())
            .chain(self.increments.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_range_is_inclusive() {
        let range = KeyRange::between("b", "d");
        assert!(range.contains("b"));
        assert!(range.contains("c"));
        assert!(range.contains("d"));
        assert!(!range.contains("a"));
        assert!(!range.contains("da"));
        assert!(KeyRange::all().contains("anything"));
        assert!(KeyRange::starting_at("m").contains("z"));
        assert!(!KeyRange::up_to("m").contains("z"));
        assert!(KeyRange::between("z", "a").is_inverted());
    }

    #[test]
    fn config_loads_from_json() {
        let config: StoreConfig = serde_json::from_str(r#"{"cache_capacity": 64}"#).unwrap();
        assert_eq!(config.cache_capacity.get(), 64);
        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.cache_capacity.get(), 10_000);
        assert!(serde_json::from_str::<StoreConfig>(r#"{"cache_capacity": 0}"#).is_err());
    }
}
