use std::path::Path;

use lru::LruCache;
use parking_lot::Mutex;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use smol_str::SmolStr;
use tracing::debug;

use super::{Cells, FamilyDelta, KeyRange, Store, StoreConfig, StoreError, add_to_counter};

// Key: (table, row, family, column key)
// Value: encoded cell
const CELLS_TABLE: TableDefinition<(&str, &str, &str, &str), &[u8]> =
    TableDefinition::new("cells");

type CellKey = (SmolStr, SmolStr, SmolStr, SmolStr);

/// Embedded store on a single redb table, with an LRU cache in front of
/// single-cell reads.
pub struct RedbStore {
    db: Database,
    cache: Mutex<LruCache<CellKey, Vec<u8>>>,
}

impl RedbStore {
    /// Open or create the database at `path` with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_config(path, StoreConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self, StoreError> {
        let db = Database::create(path)?;

        // Create the table up front so read transactions can always open it
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CELLS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            cache: Mutex::new(LruCache::new(config.cache_capacity)),
        })
    }

    /// Number of cells currently held by the read cache.
    pub fn cached_cells(&self) -> usize {
        self.cache.lock().len()
    }
}

fn cell_key(table: &str, row: &str, family: &str, key: &str) -> CellKey {
    (table.into(), row.into(), family.into(), key.into())
}

impl Store for RedbStore {
    fn get_range(
        &self,
        table: &str,
        row: &str,
        family: &str,
        range: &KeyRange,
    ) -> Result<Cells, StoreError> {
        let mut cells = Cells::new();
        if range.is_inverted() {
            return Ok(cells);
        }
        let read_txn = self.db.begin_read()?;
        let cells_table = read_txn.open_table(CELLS_TABLE)?;

        let start = range.start.as_deref().unwrap_or("");
        for entry in cells_table.range((table, row, family, start)..)? {
            let (k, v) = entry?;
            let (t, r, f, key) = k.value();
            if (t, r, f) != (table, row, family) {
                break;
            }
            if range.end.as_deref().is_some_and(|end| key > end) {
                break;
            }
            cells.insert(key.into(), v.value().to_vec());
        }
        Ok(cells)
    }

    fn get_entry(
        &self,
        table: &str,
        row: &str,
        family: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let cache_key = cell_key(table, row, family, key);
        if let Some(hit) = self.cache.lock().get(&cache_key) {
            return Ok(Some(hit.clone()));
        }

        let read_txn = self.db.begin_read()?;
        let cells_table = read_txn.open_table(CELLS_TABLE)?;
        let Some(access) = cells_table.get((table, row, family, key))? else {
            return Ok(None);
        };
        let bytes = access.value().to_vec();
        self.cache.lock().put(cache_key, bytes.clone());
        Ok(Some(bytes))
    }

    fn exists(&self, table: &str, row: &str, family: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let cells_table = read_txn.open_table(CELLS_TABLE)?;
        let Some(first) = cells_table.range((table, row, family, "")..)?.next() else {
            return Ok(false);
        };
        let (k, _) = first?;
        let (t, r, f, _) = k.value();
        Ok((t, r, f) == (table, row, family))
    }

    fn apply(&self, table: &str, row: &str, deltas: &[FamilyDelta]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut cells_table = write_txn.open_table(CELLS_TABLE)?;
            for delta in deltas {
                let family = delta.family.as_str();
                for key in &delta.deletes {
                    cells_table.remove((table, row, family, key.as_str()))?;
                }
                for (key, bytes) in &delta.puts {
                    cells_table.insert((table, row, family, key.as_str()), bytes.as_slice())?;
                }
                for (key, by) in &delta.increments {
                    let cell = (table, row, family, key.as_str());
                    let current = cells_table.get(cell)?.map(|access| access.value().to_vec());
                    let next = add_to_counter(key, current.as_deref(), *by)?;
                    cells_table.insert(cell, next.as_slice())?;
                }
            }
        }
        write_txn.commit()?;

        let mut cache = self.cache.lock();
        for delta in deltas {
            for key in delta.keys() {
                cache.pop(&cell_key(table, row, &delta.family, key));
            }
        }
        debug!(table, row, families = deltas.len(), "committed deltas");
        Ok(())
    }
}
