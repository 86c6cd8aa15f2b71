use super::{
    HEADER_SIZE, INDEX_ENTRY_SIZE, TAG_BOOL, TAG_F64, TAG_I64, TAG_NESTED_CBOR, TAG_NULL, TAG_STR,
    TAG_U64, name_hash,
};
use crate::error::RecordError;
use crate::value::{Number, Value};

/// Zero-copy view of one field's payload.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub name_hash: u64,
    pub type_tag: u8,
    pub data: &'a [u8],
}

impl FieldRef<'_> {
    /// Decodes the payload according to its tag.
    pub fn decode(&self) -> Result<Value, RecordError> {
        let fixed = |data: &[u8]| -> Result<[u8; 8], RecordError> {
            data.try_into().map_err(|_| RecordError::LengthMismatch {
                expected: 8,
                actual: data.len(),
            })
        };
        Ok(match self.type_tag {
            TAG_NULL => Value::Null,
            TAG_BOOL => Value::Bool(*self.data.first().ok_or(RecordError::InvalidBuffer)? != 0),
            TAG_I64 => Value::Number(Number::I64(i64::from_le_bytes(fixed(self.data)?))),
            TAG_U64 => Value::Number(Number::U64(u64::from_le_bytes(fixed(self.data)?))),
            TAG_F64 => Value::Number(Number::F64(f64::from_le_bytes(fixed(self.data)?))),
            TAG_STR => Value::from(
                std::str::from_utf8(self.data).map_err(|_| RecordError::InvalidBuffer)?,
            ),
            TAG_NESTED_CBOR => {
                let nested: serde_json::Value = cbor4ii::serde::from_slice(self.data)
                    .map_err(|e| RecordError::CborError(e.to_string()))?;
                Value::from(nested)
            }
            tag => return Err(RecordError::UnknownTypeTag(tag)),
        })
    }
}

/// Reader over an encoded record. Nothing is decoded until a field is asked for.
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'a> {
    buf: &'a [u8],
    field_count: usize,
}

impl<'a> RecordReader<'a> {
    /// Checks that the header and the whole index fit in `buf`.
    pub fn parse(buf: &'a [u8]) -> Result<Self, RecordError> {
        let header: [u8; 4] = buf
            .get(0..4)
            .and_then(|b| b.try_into().ok())
            .filter(|_| buf.len() >= HEADER_SIZE)
            .ok_or(RecordError::InvalidBuffer)?;
        let field_count = u32::from_le_bytes(header) as usize;

        let expected = HEADER_SIZE + field_count * INDEX_ENTRY_SIZE;
        if buf.len() < expected {
            return Err(RecordError::LengthMismatch {
                expected,
                actual: buf.len(),
            });
        }
        Ok(Self { buf, field_count })
    }

    pub fn len(&self) -> usize {
        self.field_count
    }

    pub fn is_empty(&self) -> bool {
        self.field_count == 0
    }

    fn entry(&self, i: usize) -> Option<FieldRef<'a>> {
        let at = HEADER_SIZE + i * INDEX_ENTRY_SIZE;
        let entry = self.buf.get(at..at + INDEX_ENTRY_SIZE)?;
        let offset = u32::from_le_bytes(entry[8..12].try_into().ok()?) as usize;
        let len = u32::from_le_bytes(entry[12..16].try_into().ok()?) as usize;
        Some(FieldRef {
            name_hash: u64::from_le_bytes(entry[0..8].try_into().ok()?),
            type_tag: entry[16],
            data: self.buf.get(offset..offset.checked_add(len)?)?,
        })
    }

    fn hash_at(&self, i: usize) -> Option<u64> {
        let at = HEADER_SIZE + i * INDEX_ENTRY_SIZE;
        Some(u64::from_le_bytes(self.buf.get(at..at + 8)?.try_into().ok()?))
    }

    /// Every field in index order.
    pub fn fields(&self) -> impl Iterator<Item = FieldRef<'a>> + '_ {
        (0..self.field_count).map_while(|i| self.entry(i))
    }

    /// The raw field called `name`, found by binary search on the sorted index.
    pub fn raw(&self, name: &str) -> Option<FieldRef<'a>> {
        let hash = name_hash(name);
        let (mut lo, mut hi) = (0, self.field_count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.hash_at(mid)?.cmp(&hash) {
                std::cmp::Ordering::Equal => return self.entry(mid),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.raw(name).is_some()
    }

    /// Decoded field, if present.
    pub fn value(&self, name: &str) -> Option<Result<Value, RecordError>> {
        self.raw(name).map(|field| field.decode())
    }

    /// String payload without copying; `None` for other tags.
    pub fn str(&self, name: &str) -> Option<&'a str> {
        let field = self.raw(name).filter(|f| f.type_tag == TAG_STR)?;
        std::str::from_utf8(field.data).ok()
    }
}
