//! Maps element fields onto sparse column families of a wide-column store.
//!
//! A [`ColumnFamily`] caches one family of one stored row and tracks local
//! edits so that only the delta goes back to the [`Store`]. Element fields
//! are reached through per-field accessor chains built once per type by its
//! [`Schema`].

pub mod accessor;
pub mod codec;
pub mod error;
pub mod family;
pub mod increment;
pub mod record;
pub mod schema;
pub mod store;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use accessor::{MultiplePropertyAccessor, PropertyAccessor};
pub use codec::{Codec, RecordCodec};
pub use error::{
    AccessError, CacheError, CodecError, ConfigError, IncrementError, Operation, RecordError,
};
pub use family::{ChangeKind, ColumnFamily, FamilyBuilder, FamilyOptions, RowHandle};
pub use increment::{DefaultIncrements, Incrementer};
pub use schema::{Element, FieldDescriptor, IncrementMode, Schema, Visibility};
pub use store::{FamilyDelta, KeyRange, MemoryStore, RedbStore, Store, StoreConfig, StoreError};
pub use value::{FieldMap, Number, Value, ValueKind};
