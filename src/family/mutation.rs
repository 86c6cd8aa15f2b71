use std::collections::BTreeSet;

use smol_str::SmolStr;
use tracing::warn;

use super::{ChangeKind, ColumnFamily};
use crate::error::CacheError;
use crate::schema::Element;

impl<T: Element> ColumnFamily<T> {
    /// Materializes `element` under its index and records the change.
    ///
    /// Returns `false`, leaving the family untouched, when the element cannot
    /// be indexed or when no increment can be computed for it. An ordinary
    /// family only records a change if the stored element actually differs.
    pub fn add(&mut self, element: T) -> bool {
        let Some(key) = self.index(&element) else {
            return false;
        };

        if self.counter.is_some() {
            return self.add_counter(key, element);
        }

        let changed = self.materialized.get(&key) != Some(&element);
        self.materialized.insert(key.clone(), element);
        if changed {
            if let Some(changes) = self.changes.as_mut() {
                changes.insert(key, ChangeKind::Set);
            }
        }
        true
    }

    fn add_counter(&mut self, key: SmolStr, element: T) -> bool {
        let Some(counter) = &self.counter else {
            return false;
        };
        let read = |e: &T| {
            T::schema()
                .read(e, &counter.name)
                .ok()
                .and_then(|v| v.as_number())
        };

        let new = read(&element);
        let old = self.materialized.get(&key).and_then(read);
        let pending = self.get_increment(&key);

        match self
            .incrementer
            .compute_delta(&counter.name, counter.mode, new, old, pending)
        {
            Ok(delta) => {
                self.materialized.insert(key.clone(), element);
                if let Some(increments) = self.increments.as_mut() {
                    increments.insert(key, delta);
                }
                true
            }
            Err(e) => {
                warn!(family = %self.name, key = %key, error = %e, "increment rejected");
                false
            }
        }
    }

    /// Adds every element, stopping at the first one [`add`](Self::add)
    /// rejects.
    pub fn add_all(&mut self, elements: impl IntoIterator<Item = T>) -> bool {
        elements.into_iter().all(|e| self.add(e))
    }

    /// Removes the element with `element`'s index. See
    /// [`remove_key`](Self::remove_key).
    pub fn remove(&mut self, element: &T) -> Result<bool, CacheError> {
        self.check_removable()?;
        match self.index(element) {
            Some(key) => self.remove_key(&key),
            None => Ok(false),
        }
    }

    /// Evicts `key` and records its deletion, replacing any pending set.
    /// Returns whether the key was materialized.
    pub fn remove_key(&mut self, key: &str) -> Result<bool, CacheError> {
        self.check_removable()?;
        let was_present = self.materialized.remove(key).is_some();
        if let Some(changes) = self.changes.as_mut() {
            changes.insert(SmolStr::from(key), ChangeKind::Delete);
        }
        Ok(was_present)
    }

    /// Returns whether any of `elements` was materialized.
    pub fn remove_all<'a>(
        &mut self,
        elements: impl IntoIterator<Item = &'a T>,
    ) -> Result<bool, CacheError> {
        self.check_removable()?;
        let mut removed = false;
        for element in elements {
            removed |= self.remove(element)?;
        }
        Ok(removed)
    }

    /// Removes every materialized element whose index is not among those of
    /// `keep`. Returns whether anything was removed.
    pub fn retain_all<'a>(
        &mut self,
        keep: impl IntoIterator<Item = &'a T>,
    ) -> Result<bool, CacheError> {
        self.check_removable()?;
        let keep: BTreeSet<SmolStr> = keep.into_iter().filter_map(|e| self.index(e)).collect();
        let doomed: Vec<SmolStr> = self
            .materialized
            .keys()
            .filter(|k| !keep.contains(*k))
            .cloned()
            .collect();
        for key in &doomed {
            self.remove_key(key)?;
        }
        Ok(!doomed.is_empty())
    }

    /// Removes every materialized element.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.check_removable()?;
        let keys: Vec<SmolStr> = self.materialized.keys().cloned().collect();
        for key in &keys {
            self.remove_key(key)?;
        }
        Ok(())
    }

    fn check_removable(&self) -> Result<(), CacheError> {
        if self.is_append_only() {
            return Err(CacheError::InvalidOperation {
                family: self.name.clone(),
            });
        }
        Ok(())
    }
}

