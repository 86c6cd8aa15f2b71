use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use smol_str::SmolStr;
use tracing::debug;

use super::{Cells, FamilyDelta, KeyRange, Store, StoreError, add_to_counter};

type FamilyKey = (SmolStr, SmolStr, SmolStr);

/// In-process store. Reads are counted so callers can check how often a
/// cache went to the store.
#[derive(Default)]
pub struct MemoryStore {
    families: RwLock<BTreeMap<FamilyKey, Cells>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one cell directly.
    pub fn put(&self, table: &str, row: &str, family: &str, key: &str, value: Vec<u8>) {
        self.families
            .write()
            .entry(family_key(table, row, family))
            .or_default()
            .insert(key.into(), value);
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn count_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }
}

fn family_key(table: &str, row: &str, family: &str) -> FamilyKey {
    (table.into(), row.into(), family.into())
}

impl Store for MemoryStore {
    fn get_range(
        &self,
        table: &str,
        row: &str,
        family: &str,
        range: &KeyRange,
    ) -> Result<Cells, StoreError> {
        self.count_read();
        if range.is_inverted() {
            return Ok(Cells::new());
        }
        let families = self.families.read();
        let Some(cells) = families.get(&family_key(table, row, family)) else {
            return Ok(Cells::new());
        };
        Ok(cells
            .range::<str, _>(range.bounds())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn get_entry(
        &self,
        table: &str,
        row: &str,
        family: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.count_read();
        Ok(self
            .families
            .read()
            .get(&family_key(table, row, family))
            .and_then(|cells| cells.get(key).cloned()))
    }

    fn exists(&self, table: &str, row: &str, family: &str) -> Result<bool, StoreError> {
        self.count_read();
        Ok(self
            .families
            .read()
            .get(&family_key(table, row, family))
            .is_some_and(|cells| !cells.is_empty()))
    }

    fn apply(&self, table: &str, row: &str, deltas: &[FamilyDelta]) -> Result<(), StoreError> {
        let mut families = self.families.write();
        // validate counters first so a corrupt cell leaves the row untouched
        let mut counters = Vec::new();
        for delta in deltas {
            let cells = families.get(&family_key(table, row, &delta.family));
            for (key, by) in &delta.increments {
                let current = cells.and_then(|c| c.get(key)).map(Vec::as_slice);
                counters.push((delta.family.clone(), key.clone(), add_to_counter(key, current, *by)?));
            }
        }

        for delta in deltas {
            let cells = families
                .entry(family_key(table, row, &delta.family))
                .or_default();
            for key in &delta.deletes {
                cells.remove(key);
            }
            for (key, bytes) in &delta.puts {
                cells.insert(key.clone(), bytes.clone());
            }
        }
        for (family, key, bytes) in counters {
            families
                .entry(family_key(table, row, &family))
                .or_default()
                .insert(key, bytes.to_vec());
        }
        debug!(table, row, families = deltas.len(), "applied deltas");
        Ok(())
    }
}
