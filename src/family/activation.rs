use std::collections::BTreeMap;

use smol_str::SmolStr;
use tracing::{debug, error};

use super::ColumnFamily;
use crate::error::CacheError;
use crate::schema::Element;
use crate::store::{Cells, KeyRange};

impl<T: Element> ColumnFamily<T> {
    /// Replaces the whole local state with the family as currently stored.
    pub fn activate(&mut self) -> Result<(), CacheError> {
        let cells = self
            .owner
            .store
            .get_family(&self.owner.table, &self.owner.row, &self.name)?;
        self.rebuild(&cells)
    }

    /// Like [`activate`](Self::activate), limited to keys inside `range`.
    pub fn activate_range(&mut self, range: &KeyRange) -> Result<(), CacheError> {
        let cells =
            self.owner
                .store
                .get_range(&self.owner.table, &self.owner.row, &self.name, range)?;
        self.rebuild(&cells)
    }

    pub fn activate_between(
        &mut self,
        from: impl Into<SmolStr>,
        to: impl Into<SmolStr>,
    ) -> Result<(), CacheError> {
        self.activate_range(&KeyRange::between(from, to))
    }

    /// Rebuilds the materialized view from raw cells, dropping every pending
    /// change. On a decode error the previous state is kept.
    pub fn rebuild(&mut self, raw: &Cells) -> Result<(), CacheError> {
        let mut materialized = BTreeMap::new();
        for (key, bytes) in raw {
            materialized.insert(key.clone(), self.decode_cell(key, bytes)?);
        }

        self.materialized = materialized;
        self.clear_changes();
        self.activated = true;
        debug!(
            family = %self.name,
            row = %self.owner.row,
            entries = self.materialized.len(),
            "family rebuilt"
        );
        Ok(())
    }

    /// Decodes one stored cell. Counter cells only hold the number; the
    /// element is rebuilt from the key and that number.
    fn decode_cell(&self, key: &str, bytes: &[u8]) -> Result<T, CacheError> {
        let Some(counter) = &self.counter else {
            return Ok(self.codec.decode(bytes)?);
        };
        let number = self.codec.decode_number(counter.kind, bytes)?;
        let number = self.codec.number_to_string(number);
        let separator = T::schema().separator();
        let composite = if counter.index_first {
            format!("{key}{separator}{number}")
        } else {
            format!("{number}{separator}{key}")
        };
        Ok(self.codec.decode_composite(&composite)?)
    }

    /// The element under `key`, read from the store when not materialized.
    ///
    /// Keys deleted locally are reported absent without asking the store. A
    /// fetched element is materialized only if its own index is `key`.
    pub fn get_from_store(&mut self, key: &str) -> Result<Option<&T>, CacheError> {
        if self.materialized.contains_key(key) {
            return Ok(self.materialized.get(key));
        }
        if self.was_deleted(key) {
            return Ok(None);
        }

        let fetched = self
            .owner
            .store
            .get_entry(&self.owner.table, &self.owner.row, &self.name, key)?;
        let Some(bytes) = fetched else {
            return Ok(None);
        };
        let element = self.decode_cell(key, &bytes)?;

        let found = self.index(&element).unwrap_or_default();
        if found.as_str() != key {
            error!(
                table = %self.owner.table,
                row = %self.owner.row,
                family = %self.name,
                requested = key,
                found = %found,
                "stored element does not match its key"
            );
            return Err(CacheError::ConsistencyViolation {
                table: self.owner.table.clone(),
                row: self.owner.row.clone(),
                family: self.name.clone(),
                requested: key.into(),
                found,
            });
        }

        if let Some(changes) = self.changes.as_mut() {
            changes.remove(key);
        }
        let element: &T = self.materialized.entry(found).or_insert(element);
        Ok(Some(element))
    }

    /// Whether `element`'s key is materialized or present in the store.
    pub fn contains_in_store(&mut self, element: &T) -> Result<bool, CacheError> {
        let Some(key) = self.index(element) else {
            return Ok(false);
        };
        Ok(self.get_from_store(&key)?.is_some())
    }

    /// Asks the store whether this family holds no cell at all.
    pub fn is_empty_in_store(&self) -> Result<bool, CacheError> {
        let exists = self
            .owner
            .store
            .exists(&self.owner.table, &self.owner.row, &self.name)?;
        Ok(!exists)
    }
}
