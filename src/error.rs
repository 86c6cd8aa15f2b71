// ─── Error ──────────────────────────────────────────────────────────────────
use smol_str::SmolStr;
use thiserror::Error;

use crate::store::StoreError;
use crate::value::ValueKind;

/// Failures of the binary record format.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid buffer structure")]
    InvalidBuffer,
    #[error("record exceeds the 32-field limit")]
    TooManyFields,
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("CBOR error: {0}")]
    CborError(String),
    #[error("Unknown type tag: {0}")]
    UnknownTypeTag(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Read => "read",
            Operation::Write => "write",
        })
    }
}

/// Failures while reading or writing an element field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccessError {
    #[error("access denied: cannot {operation} field `{field}`")]
    AccessDenied { field: SmolStr, operation: Operation },
    #[error("no accessor candidate for field `{field}`")]
    NoCandidates { field: SmolStr },
    #[error("field `{field}` is read-only")]
    ReadOnly { field: SmolStr },
    #[error("field `{field}` expects {expected:?}")]
    TypeMismatch { field: SmolStr, expected: ValueKind },
    #[error("unknown field `{field}` on `{element}`")]
    UnknownField { element: SmolStr, field: SmolStr },
    #[error("accessor for `{field}` failed: {reason}")]
    Failed { field: SmolStr, reason: String },
}

/// Invalid column family setup. Raised once, at construction.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` is not a persisted field of `{element}`")]
    UnknownIndex { element: SmolStr, field: SmolStr },
    #[error("persisting elements such as `{element}` cannot be incrementing in family `{family}`")]
    PersistingElement { element: SmolStr, family: SmolStr },
    #[error(
        "an incrementing family needs elements with an index and exactly one value field; `{element}` has {count} value fields"
    )]
    IncrementFieldCount { element: SmolStr, count: usize },
    #[error("field `{field}` of kind {kind:?} cannot be incremented")]
    NotIncrementable { field: SmolStr, kind: ValueKind },
    #[error("field `{field}` of `{element}` has no key order")]
    MissingKeyOrder { element: SmolStr, field: SmolStr },
}

/// Failures of the value codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("cannot parse `{text}` as {kind:?} for field `{field}`")]
    Parse { field: SmolStr, kind: ValueKind, text: String },
    #[error("composite key `{text}` has {actual} parts, expected {expected}")]
    PartCount { text: String, expected: usize, actual: usize },
    #[error("cannot decode a {kind:?} number from {len} bytes")]
    Number { kind: ValueKind, len: usize },
}

/// Reasons a numeric delta cannot be computed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IncrementError {
    #[error("incrementing field `{field}` has no value")]
    MissingValue { field: SmolStr },
    #[error("field `{field}` may only move {allowed}, got delta {delta}")]
    WrongDirection { field: SmolStr, allowed: &'static str, delta: i128 },
    #[error("increment of `{field}` overflows")]
    Overflow { field: SmolStr },
    #[error("{kind:?} values cannot be incremented")]
    Unsupported { kind: ValueKind },
}

/// Errors surfaced by a column family cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("family `{family}` does not accept removal")]
    InvalidOperation { family: SmolStr },
    #[error(
        "found element with key `{found}` under `{requested}` (row '{table}'/'{row}'/'{family}')"
    )]
    ConsistencyViolation {
        table: SmolStr,
        row: SmolStr,
        family: SmolStr,
        requested: SmolStr,
        found: SmolStr,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Increment(#[from] IncrementError),
}
