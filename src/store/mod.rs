//! Wide-column store access.
//!
//! A cell is addressed by `(table, row, family, key)`. Families are sorted
//! by key, which is what makes range activation possible.

pub mod memory;
pub mod redb_store;
pub mod types;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use types::{Cells, FamilyDelta, KeyRange, StoreConfig, StoreError};

pub trait Store: Send + Sync {
    /// Every cell of one family of one row.
    fn get_family(&self, table: &str, row: &str, family: &str) -> Result<Cells, StoreError> {
        self.get_range(table, row, family, &KeyRange::all())
    }

    /// Cells whose key falls inside `range`.
    fn get_range(
        &self,
        table: &str,
        row: &str,
        family: &str,
        range: &KeyRange,
    ) -> Result<Cells, StoreError>;

    fn get_entry(
        &self,
        table: &str,
        row: &str,
        family: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError>;

    /// Whether the family holds at least one cell.
    fn exists(&self, table: &str, row: &str, family: &str) -> Result<bool, StoreError>;

    /// Writes the deltas of one row atomically.
    fn apply(&self, table: &str, row: &str, deltas: &[FamilyDelta]) -> Result<(), StoreError>;
}

/// Adds `delta` to a counter cell. A missing cell counts as zero; leaving the
/// `i64` range is an error.
pub(crate) fn add_to_counter(key: &str, current: Option<&[u8]>, delta: i64) -> Result<[u8; 8], StoreError> {
    let current = match current {
        None => 0,
        Some(bytes) => {
            let raw: [u8; 8] = bytes.try_into().map_err(|_| StoreError::Corrupt {
                key: key.to_owned(),
                len: bytes.len(),
            })?;
            i64::from_le_bytes(raw)
        }
    };
    let next = current.checked_add(delta).ok_or_else(|| StoreError::Overflow {
        key: key.to_owned(),
    })?;
    Ok(next.to_le_bytes())
}
