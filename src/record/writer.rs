use arrayvec::ArrayVec;

use super::{
    HEADER_SIZE, INDEX_ENTRY_SIZE, MAX_FIELDS, TAG_BOOL, TAG_F64, TAG_I64, TAG_NESTED_CBOR,
    TAG_NULL, TAG_STR, TAG_U64, name_hash,
};
use crate::error::RecordError;
use crate::value::{FieldMap, Number, Value};

/// Encodes `fields` into a fresh buffer.
pub fn encode_fields(fields: &FieldMap) -> Result<Vec<u8>, RecordError> {
    let mut buf = Vec::new();
    encode_fields_into(fields, &mut buf)?;
    Ok(buf)
}

/// Encodes `fields` into `buf`, replacing its contents but keeping its
/// capacity. Returns the field count.
pub fn encode_fields_into(fields: &FieldMap, buf: &mut Vec<u8>) -> Result<usize, RecordError> {
    let mut sorted: ArrayVec<(u64, &Value), MAX_FIELDS> = ArrayVec::new();
    for (name, value) in fields {
        sorted
            .try_push((name_hash(name), value))
            .map_err(|_| RecordError::TooManyFields)?;
    }
    sorted.sort_unstable_by_key(|(hash, _)| *hash);

    let count = sorted.len();
    let data_start = HEADER_SIZE + count * INDEX_ENTRY_SIZE;
    buf.clear();
    buf.reserve(data_start + count * 16);
    buf.resize(data_start, 0);
    buf[0..4].copy_from_slice(&(count as u32).to_le_bytes());

    for (i, (hash, value)) in sorted.into_iter().enumerate() {
        let offset = buf.len();
        let tag = write_value(buf, value)?;
        let len = buf.len() - offset;

        let at = HEADER_SIZE + i * INDEX_ENTRY_SIZE;
        let entry = &mut buf[at..at + INDEX_ENTRY_SIZE];
        entry[0..8].copy_from_slice(&hash.to_le_bytes());
        entry[8..12].copy_from_slice(&(offset as u32).to_le_bytes());
        entry[12..16].copy_from_slice(&(len as u32).to_le_bytes());
        entry[16] = tag;
    }
    Ok(count)
}

/// Appends the payload of `value`, returning its tag.
fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<u8, RecordError> {
    let tag = match value {
        Value::Null => TAG_NULL,
        Value::Bool(b) => {
            buf.push(u8::from(*b));
            TAG_BOOL
        }
        Value::Number(Number::I64(n)) => {
            buf.extend_from_slice(&n.to_le_bytes());
            TAG_I64
        }
        Value::Number(Number::U64(n)) => {
            buf.extend_from_slice(&n.to_le_bytes());
            TAG_U64
        }
        Value::Number(Number::F64(n)) => {
            buf.extend_from_slice(&n.to_le_bytes());
            TAG_F64
        }
        Value::Str(s) => {
            buf.extend_from_slice(s.as_bytes());
            TAG_STR
        }
        Value::Array(_) | Value::Object(_) => {
            let nested = cbor4ii::serde::to_vec(Vec::new(), value)
                .map_err(|e| RecordError::CborError(e.to_string()))?;
            buf.extend_from_slice(&nested);
            TAG_NESTED_CBOR
        }
    };
    Ok(tag)
}
