use std::collections::BTreeSet;

use smol_str::SmolStr;
use tracing::debug;

use super::{ChangeKind, ColumnFamily};
use crate::error::{CacheError, IncrementError};
use crate::schema::Element;
use crate::store::FamilyDelta;
use crate::value::Number;

impl<T: Element> ColumnFamily<T> {
    /// Keys with a pending set or delete. Always empty for counter families.
    pub fn changed_key_set(&self) -> BTreeSet<SmolStr> {
        self.changes
            .as_ref()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Keys with a pending delta. Always empty for ordinary families.
    pub fn incremented_key_set(&self) -> BTreeSet<SmolStr> {
        self.increments
            .as_ref()
            .map(|i| i.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_changed(&self) -> bool {
        self.changes.as_ref().is_some_and(|c| !c.is_empty())
            || self.increments.as_ref().is_some_and(|i| !i.is_empty())
    }

    pub fn change(&self, key: &str) -> Option<ChangeKind> {
        self.changes.as_ref()?.get(key).copied()
    }

    /// A pending set, or any pending increment, for `key`.
    pub fn was_changed(&self, key: &str) -> bool {
        self.change(key) == Some(ChangeKind::Set) || self.get_increment(key).is_some()
    }

    pub fn was_deleted(&self, key: &str) -> bool {
        self.change(key) == Some(ChangeKind::Delete)
    }

    pub fn get_increment(&self, key: &str) -> Option<Number> {
        self.increments.as_ref()?.get(key).copied()
    }

    /// Forgets every pending change. Called once they reached the store.
    pub fn clear_changes(&mut self) {
        if let Some(changes) = self.changes.as_mut() {
            changes.clear();
        }
        if let Some(increments) = self.increments.as_mut() {
            increments.clear();
        }
    }

    /// Pending changes in store form: set elements encoded, deletes, and
    /// counter deltas.
    pub fn delta(&self) -> Result<FamilyDelta, CacheError> {
        let mut delta = FamilyDelta::new(self.name.clone());

        for (key, kind) in self.changes.iter().flatten() {
            match kind {
                ChangeKind::Set => {
                    if let Some(element) = self.materialized.get(key) {
                        delta.puts.insert(key.clone(), self.codec.encode(element)?);
                    }
                }
                ChangeKind::Delete => {
                    delta.deletes.insert(key.clone());
                }
            }
        }

        for (key, by) in self.increments.iter().flatten() {
            let by = by.as_i64().ok_or_else(|| IncrementError::Overflow {
                field: key.clone(),
            })?;
            delta.increments.insert(key.clone(), by);
        }
        Ok(delta)
    }

    /// Pushes the pending changes to the owner's store, then clears them.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        let delta = self.delta()?;
        if !delta.is_empty() {
            self.owner
                .store
                .apply(&self.owner.table, &self.owner.row, std::slice::from_ref(&delta))?;
        }
        debug!(
            family = %self.name,
            row = %self.owner.row,
            puts = delta.puts.len(),
            deletes = delta.deletes.len(),
            increments = delta.increments.len(),
            "family flushed"
        );
        self.clear_changes();
        Ok(())
    }
}
