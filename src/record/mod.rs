//! Binary format of a stored element.
//!
//! Scalars are stored as native bytes, arrays and objects as CBOR. Fields
//! are located through an index sorted by the xxh64 hash of their name.
//!
//! ```text
//!  ┌──────────────────────────────────────────────┐
//!  │ Header (20 bytes)                            │
//!  │   field_count: u32 (LE)                      │
//!  │   _reserved:   [u8; 16]                      │
//!  ├──────────────────────────────────────────────┤
//!  │ Index (20 bytes × field_count)               │
//!  │   name_hash:   u64 (LE)    ← sorted          │
//!  │   data_offset: u32 (LE)                      │
//!  │   data_length: u32 (LE)                      │
//!  │   type_tag:    u8                            │
//!  │   _padding:    [u8; 3]                       │
//!  ├──────────────────────────────────────────────┤
//!  │ Data (variable)                              │
//!  └──────────────────────────────────────────────┘
//! ```

mod reader;
mod writer;

pub use reader::{FieldRef, RecordReader};
pub use writer::{encode_fields, encode_fields_into};

use xxhash_rust::const_xxh64::xxh64;

// ─── Type Tags ──────────────────────────────────────────────────────────────
pub const TAG_NULL: u8 = 0;
pub const TAG_BOOL: u8 = 1;
pub const TAG_I64: u8 = 2;
pub const TAG_F64: u8 = 3;
pub const TAG_STR: u8 = 4;
pub const TAG_NESTED_CBOR: u8 = 5;
pub const TAG_U64: u8 = 6;

pub const HEADER_SIZE: usize = 20;
pub const INDEX_ENTRY_SIZE: usize = 20;
/// Elements are small; the index is sorted on the stack.
pub const MAX_FIELDS: usize = 32;

#[inline]
pub(crate) fn name_hash(name: &str) -> u64 {
    xxh64(name.as_bytes(), 0)
}
