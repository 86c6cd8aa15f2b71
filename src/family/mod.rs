//! Column family cache.
//!
//! A [`ColumnFamily`] mirrors one column family of one stored row. Entries
//! are materialized from the store on activation; local mutations are
//! applied to the materialized map right away and recorded on the side, so
//! that only the delta has to be pushed back.
//!
//! ```text
//!   activate ──► Store::get_family ──► rebuild ──► materialized
//!                                                     │
//!   add / remove ─────────────────────────────────────┤
//!                                                     ▼
//!                                         changes | increments
//!                                                     │
//!   flush ◄── delta() ◄───────────────────────────────┘
//! ```

mod activation;
mod builder;
mod changes;
mod mutation;

pub use builder::FamilyBuilder;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::codec::{Codec, index_of};
use crate::increment::Incrementer;
use crate::schema::{Element, IncrementMode};
use crate::store::Store;
use crate::value::{Number, ValueKind};

/// Pending effect of a local mutation on one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Delete,
}

/// Mutation policy of a family, loadable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FamilyOptions {
    /// Entries can be added but never removed.
    pub append_only: bool,
    /// Entries are counters; the store holds deltas, not values.
    pub incrementing: bool,
}

/// The stored row a family belongs to.
#[derive(Clone)]
pub struct RowHandle {
    table: SmolStr,
    row: SmolStr,
    store: Arc<dyn Store>,
}

impl RowHandle {
    pub fn new(table: impl Into<SmolStr>, row: impl Into<SmolStr>, store: Arc<dyn Store>) -> Self {
        Self {
            table: table.into(),
            row: row.into(),
            store,
        }
    }

    pub fn table(&self) -> &SmolStr {
        &self.table
    }

    pub fn row(&self) -> &SmolStr {
        &self.row
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}

impl std::fmt::Debug for RowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowHandle")
            .field("table", &self.table)
            .field("row", &self.row)
            .finish_non_exhaustive()
    }
}

/// The numeric field of an incrementing family.
#[derive(Debug, Clone)]
struct CounterField {
    name: SmolStr,
    kind: ValueKind,
    mode: IncrementMode,
    /// The index field comes first in the composite key.
    index_first: bool,
}

pub struct ColumnFamily<T: Element> {
    name: SmolStr,
    property: Option<SmolStr>,
    owner: RowHandle,
    index: SmolStr,
    append_only: bool,
    counter: Option<CounterField>,
    materialized: BTreeMap<SmolStr, T>,
    // exactly one of `changes` / `increments` is Some
    changes: Option<BTreeMap<SmolStr, ChangeKind>>,
    increments: Option<BTreeMap<SmolStr, Number>>,
    activated: bool,
    codec: Arc<dyn Codec<T>>,
    incrementer: Arc<dyn Incrementer>,
}

impl<T: Element> ColumnFamily<T> {
    pub fn builder(name: impl Into<SmolStr>, owner: RowHandle) -> FamilyBuilder<T> {
        FamilyBuilder::new(name.into(), owner)
    }

    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    /// The element property this family backs; `None` for system families.
    pub fn property(&self) -> Option<&SmolStr> {
        self.property.as_ref()
    }

    pub fn owner(&self) -> &RowHandle {
        &self.owner
    }

    pub fn index_field(&self) -> &SmolStr {
        &self.index
    }

    pub fn is_incrementing(&self) -> bool {
        self.counter.is_some()
    }

    /// Counter families never accept removal either.
    pub fn is_append_only(&self) -> bool {
        self.append_only || self.is_incrementing()
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Key of `element` in this family, if its index field renders to one.
    pub fn index(&self, element: &T) -> Option<SmolStr> {
        index_of(element, &self.index)
    }

    // ── Materialized view ──

    pub fn len(&self) -> usize {
        self.materialized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materialized.is_empty()
    }

    /// Whether an element with the same index is materialized.
    pub fn contains(&self, element: &T) -> bool {
        self.index(element)
            .is_some_and(|key| self.materialized.contains_key(&key))
    }

    pub fn contains_all<'a>(&self, elements: impl IntoIterator<Item = &'a T>) -> bool {
        elements.into_iter().all(|e| self.contains(e))
    }

    /// Materialized elements in key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.materialized.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SmolStr> {
        self.materialized.keys()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.materialized.values().cloned().collect()
    }

    /// The materialized element under `key`. Never reads the store.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.materialized.get(key)
    }
}

impl<'a, T: Element> IntoIterator for &'a ColumnFamily<T> {
    type Item = &'a T;
    type IntoIter = std::collections::btree_map::Values<'a, SmolStr, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.materialized.values()
    }
}

impl<T: Element> std::fmt::Debug for ColumnFamily<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnFamily")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("index", &self.index)
            .field("activated", &self.activated)
            .field("materialized", &self.materialized)
            .field("changes", &self.changes)
            .field("increments", &self.increments)
            .finish()
    }
}
