use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::fmt;

pub type FieldMap = BTreeMap<SmolStr, Value>;

// ─── Number ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(i) => write!(f, "I64({})", i),
            Number::U64(u) => write!(f, "U64({})", u),
            Number::F64(v) => write!(f, "F64({})", v),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(i) => write!(f, "{}", i),
            Number::U64(u) => write!(f, "{}", u),
            Number::F64(v) => write!(f, "{}", v),
        }
    }
}

impl Number {
    pub fn kind(self) -> ValueKind {
        match self {
            Number::I64(_) => ValueKind::I64,
            Number::U64(_) => ValueKind::U64,
            Number::F64(_) => ValueKind::F64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::I64(i) => i as f64,
            Number::U64(u) => u as f64,
            Number::F64(f) => f,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::I64(i) => Some(i),
            Number::U64(u) => i64::try_from(u).ok(),
            Number::F64(f) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
    }

    pub fn as_u64(self) -> Option<u64> {
        match self {
            Number::U64(u) => Some(u),
            Number::I64(i) => u64::try_from(i).ok(),
            Number::F64(f) => {
                if f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64 {
                    Some(f as u64)
                } else {
                    None
                }
            }
        }
    }

    /// Widened integral view used for delta arithmetic. `None` for floats.
    pub fn as_i128(self) -> Option<i128> {
        match self {
            Number::I64(i) => Some(i as i128),
            Number::U64(u) => Some(u as i128),
            Number::F64(_) => None,
        }
    }
}

// ─── ValueKind ──────────────────────────────────────────────────────────────

/// Declared type of an element field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    I64,
    U64,
    F64,
    Str,
    /// Arrays and objects, stored as CBOR.
    Nested,
}

impl ValueKind {
    /// Whether `value` may be stored in a field of this kind. Null is always accepted.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ValueKind::Bool, Value::Bool(_)) => true,
            (ValueKind::Str, Value::Str(_)) => true,
            (ValueKind::I64, Value::Number(n)) => n.as_i64().is_some(),
            (ValueKind::U64, Value::Number(n)) => n.as_u64().is_some(),
            (ValueKind::F64, Value::Number(_)) => true,
            (ValueKind::Nested, Value::Array(_) | Value::Object(_)) => true,
            _ => false,
        }
    }

    /// Parse the textual form of a composite-key part.
    pub fn parse(self, text: &str) -> Option<Value> {
        Some(match self {
            ValueKind::Str => Value::from(text),
            ValueKind::Bool => Value::Bool(text.parse().ok()?),
            ValueKind::I64 => Value::Number(Number::I64(text.parse().ok()?)),
            ValueKind::U64 => Value::Number(Number::U64(text.parse().ok()?)),
            ValueKind::F64 => Value::Number(Number::F64(text.parse().ok()?)),
            ValueKind::Nested => return None,
        })
    }
}

// ─── Value ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Str(SmolStr),
    Array(Vec<Value>),
    Object(FieldMap),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number()?.as_i64()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_number()?.as_u64()
    }

    pub fn as_object(&self) -> Option<&FieldMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// String form used as a column key. Only scalars can key an entry.
    pub fn render_key(&self) -> Option<SmolStr> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Number(n) => Some(SmolStr::from(n.to_string())),
            Value::Bool(b) => Some(SmolStr::from(if *b { "true" } else { "false" })),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn into_smol_str(self) -> Option<SmolStr> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

// ─── Serialize (for cbor4ii::serde::to_vec on nested types) ──────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match n {
                Number::I64(i) => serializer.serialize_i64(*i),
                Number::U64(u) => serializer.serialize_u64(*u),
                Number::F64(f) => serializer.serialize_f64(*f),
            },
            Value::Str(s) => serializer.serialize_str(s.as_str()),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for v in arr {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k.as_str(), v)?;
                }
                m.end()
            }
        }
    }
}

// ─── From impls ─────────────────────────────────────────────────────────────

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::F64(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::I64(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::U64(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(SmolStr::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(SmolStr::from(s))
    }
}

impl From<SmolStr> for Value {
    fn from(s: SmolStr) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ─── From/Into serde_json::Value ────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Number(Number::U64(u))
                } else {
                    Value::Number(Number::F64(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::String(s) => Value::Str(SmolStr::from(s)),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (SmolStr::from(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(val: Value) -> Self {
        match val {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => match n {
                Number::I64(i) => serde_json::json!(i),
                Number::U64(u) => serde_json::json!(u),
                Number::F64(f) => serde_json::json!(f),
            },
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(|v| v.into()).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k.to_string(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_key_covers_scalars_only() {
        assert_eq!(Value::from("a").render_key().as_deref(), Some("a"));
        assert_eq!(Value::from(-12i64).render_key().as_deref(), Some("-12"));
        assert_eq!(Value::from(7u64).render_key().as_deref(), Some("7"));
        assert_eq!(Value::from(true).render_key().as_deref(), Some("true"));
        assert!(Value::Null.render_key().is_none());
        assert!(Value::Array(vec![]).render_key().is_none());
    }

    #[test]
    fn kind_accepts_and_parses() {
        assert!(ValueKind::I64.accepts(&Value::from(3u64)));
        assert!(!ValueKind::U64.accepts(&Value::from(-3i64)));
        assert!(ValueKind::Str.accepts(&Value::Null));
        assert!(!ValueKind::Str.accepts(&Value::from(1i64)));
        assert_eq!(ValueKind::I64.parse("-4"), Some(Value::from(-4i64)));
        assert_eq!(ValueKind::U64.parse("x"), None);
        assert_eq!(ValueKind::Nested.parse("[]"), None);
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let json = serde_json::json!({"day": "mon", "hits": 3, "tags": ["a"]});
        let value = Value::from(json.clone());
        assert_eq!(value.get("hits"), Some(&Value::from(3i64)));
        assert_eq!(serde_json::Value::from(value), json);
    }
}
