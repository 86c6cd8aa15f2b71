//! Element <-> cell bytes.

use std::marker::PhantomData;

use smol_str::SmolStr;

use crate::error::CodecError;
use crate::record::{RecordReader, encode_fields};
use crate::schema::Element;
use crate::value::{FieldMap, Number, ValueKind};

/// Width of a counter cell.
pub const NUMBER_WIDTH: usize = 8;

/// Turns elements into the bytes stored in a cell and back.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, element: &T) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// Rebuild an element from its key fields joined by the schema separator.
    fn decode_composite(&self, text: &str) -> Result<T, CodecError>;

    fn encode_number(&self, number: Number) -> Vec<u8>;

    fn decode_number(&self, kind: ValueKind, bytes: &[u8]) -> Result<Number, CodecError>;

    fn number_to_string(&self, number: Number) -> String {
        number.to_string()
    }
}

/// [`Codec`] on the hybrid binary record format, driven by the element schema.
pub struct RecordCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> RecordCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for RecordCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> RecordCodec<T> {
    /// Persisted, non-null fields of `element` keyed by name.
    pub fn to_fields(element: &T) -> Result<FieldMap, CodecError> {
        let mut map = FieldMap::new();
        for property in T::schema().persisted() {
            let value = property.get(element)?;
            if !value.is_null() {
                map.insert(property.name().clone(), value);
            }
        }
        Ok(map)
    }
}

impl<T: Element> Codec<T> for RecordCodec<T> {
    fn encode(&self, element: &T) -> Result<Vec<u8>, CodecError> {
        let map = Self::to_fields(element)?;
        Ok(encode_fields(&map)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let reader = RecordReader::parse(bytes)?;
        let mut element = T::default();
        for property in T::schema().persisted() {
            if let Some(value) = reader.value(property.name()) {
                property.set(&mut element, value?)?;
            }
        }
        Ok(element)
    }

    fn decode_composite(&self, text: &str) -> Result<T, CodecError> {
        let schema = T::schema();
        let keys = schema.key_fields();
        let separator = schema.separator();
        // surplus separators belong to a text part, never to a trailing number
        let text_last = keys
            .last()
            .is_none_or(|p| p.descriptor().kind() == ValueKind::Str);
        let parts: Vec<&str> = if text_last {
            text.splitn(keys.len(), separator).collect()
        } else {
            let mut parts: Vec<&str> = text.rsplitn(keys.len(), separator).collect();
            parts.reverse();
            parts
        };
        if parts.len() != keys.len() {
            return Err(CodecError::PartCount {
                text: text.to_owned(),
                expected: keys.len(),
                actual: parts.len(),
            });
        }

        let mut element = T::default();
        for (property, part) in keys.into_iter().zip(parts) {
            let kind = property.descriptor().kind();
            let value = kind.parse(part).ok_or_else(|| CodecError::Parse {
                field: property.name().clone(),
                kind,
                text: part.to_owned(),
            })?;
            property.set(&mut element, value)?;
        }
        Ok(element)
    }

    fn encode_number(&self, number: Number) -> Vec<u8> {
        match number {
            Number::I64(i) => i.to_le_bytes().to_vec(),
            Number::U64(u) => u.to_le_bytes().to_vec(),
            Number::F64(f) => f.to_le_bytes().to_vec(),
        }
    }

    fn decode_number(&self, kind: ValueKind, bytes: &[u8]) -> Result<Number, CodecError> {
        let invalid = || CodecError::Number {
            kind,
            len: bytes.len(),
        };
        let raw: [u8; NUMBER_WIDTH] = bytes.try_into().map_err(|_| invalid())?;
        match kind {
            ValueKind::I64 => Ok(Number::I64(i64::from_le_bytes(raw))),
            ValueKind::U64 => Ok(Number::U64(u64::from_le_bytes(raw))),
            ValueKind::F64 => Ok(Number::F64(f64::from_le_bytes(raw))),
            _ => Err(invalid()),
        }
    }
}

/// Renders the value `field` of `element` as a column key.
pub fn index_of<T: Element>(element: &T, field: &str) -> Option<SmolStr> {
    T::schema().read(element, field).ok()?.render_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::fixtures::{Gauge, Hits, Tag};

    #[test]
    fn encode_decode_keeps_persisted_fields() {
        let codec = RecordCodec::<Tag>::new();
        let tag = Tag::new("rust", "systems").with_weight(7);
        let bytes = codec.encode(&tag).unwrap();
        let back = codec.decode(&bytes).unwrap();
        assert_eq!(back, tag);
        assert_eq!(back.note(), "systems");
        assert_eq!(back.weight(), 7);
    }

    #[test]
    fn decode_rejects_truncated_bytes() {
        let codec = RecordCodec::<Tag>::new();
        assert!(matches!(
            codec.decode(&[1, 2, 3]),
            Err(CodecError::Record(RecordError::InvalidBuffer))
        ));
    }

    #[test]
    fn composite_splits_in_key_order() {
        let codec = RecordCodec::<Hits>::new();
        assert_eq!(codec.decode_composite("mon:12").unwrap(), Hits::new("mon", 12));

        let codec = RecordCodec::<Gauge>::new();
        assert_eq!(codec.decode_composite("40/north").unwrap(), Gauge::new("north", 40));
    }

    #[test]
    fn composite_keeps_separator_in_last_part() {
        let codec = RecordCodec::<Gauge>::new();
        assert_eq!(codec.decode_composite("3/a/b").unwrap(), Gauge::new("a/b", 3));
    }

    #[test]
    fn composite_splits_trailing_number_from_the_right() {
        let codec = RecordCodec::<Hits>::new();
        assert_eq!(
            codec.decode_composite("2024:w1:5").unwrap(),
            Hits::new("2024:w1", 5)
        );
        assert_eq!(codec.decode_composite("::-1").unwrap(), Hits::new(":", -1));
    }

    #[test]
    fn composite_errors() {
        let codec = RecordCodec::<Hits>::new();
        assert!(matches!(
            codec.decode_composite("mon"),
            Err(CodecError::PartCount { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            codec.decode_composite("mon:many"),
            Err(CodecError::Parse { kind: ValueKind::I64, .. })
        ));
    }

    #[test]
    fn numbers_are_eight_byte_le() {
        let codec = RecordCodec::<Hits>::new();
        let bytes = codec.encode_number(Number::I64(-2));
        assert_eq!(bytes, (-2i64).to_le_bytes());
        assert_eq!(codec.decode_number(ValueKind::I64, &bytes).unwrap(), Number::I64(-2));
        assert!(matches!(
            codec.decode_number(ValueKind::I64, &bytes[..4]),
            Err(CodecError::Number { len: 4, .. })
        ));
        assert!(codec.decode_number(ValueKind::Str, &bytes).is_err());
        assert_eq!(codec.number_to_string(Number::U64(15)), "15");
    }

    #[test]
    fn index_renders_key_field() {
        assert_eq!(index_of(&Tag::new("a", ""), "name").as_deref(), Some("a"));
        assert_eq!(index_of(&Hits::new("d", 4), "count").as_deref(), Some("4"));
        assert_eq!(index_of(&Tag::new("a", ""), "missing"), None);
    }
}
