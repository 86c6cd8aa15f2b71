//! Element types shared by the unit tests.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::error::AccessError;
use crate::schema::{Element, FieldDescriptor, IncrementMode, Schema, Visibility};
use crate::value::{Value, ValueKind};

pub static TAG_REGISTRY: RwLock<Value> = parking_lot::const_rwlock(Value::Null);

/// Plain element: a public key, a private bean property, a private raw
/// field and a static.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tag {
    pub name: SmolStr,
    note: String,
    weight: i64,
}

impl Tag {
    pub fn new(name: &str, note: &str) -> Self {
        Self {
            name: name.into(),
            note: note.into(),
            weight: 0,
        }
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }
}

fn set_str(slot: &mut SmolStr, v: Value) -> Result<(), AccessError> {
    *slot = v.into_smol_str().unwrap_or_default();
    Ok(())
}

impl Element for Tag {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Tag>> = Lazy::new(|| {
            Schema::builder("Tag")
                .field(
                    FieldDescriptor::new("name", ValueKind::Str)
                        .public()
                        .key(1)
                        .slot(|t: &Tag| Value::from(t.name.clone()), |t, v| set_str(&mut t.name, v)),
                )
                .field(
                    FieldDescriptor::new("note", ValueKind::Str)
                        .slot(
                            |t: &Tag| Value::from(t.note.as_str()),
                            |t, v| {
                                t.note = v.as_str().unwrap_or_default().to_owned();
                                Ok(())
                            },
                        )
                        .getter(|t: &Tag| Value::from(t.note.as_str()), Visibility::Public)
                        .setter(
                            |t, v| {
                                t.note = v.as_str().unwrap_or_default().to_owned();
                                Ok(())
                            },
                            Visibility::Public,
                        ),
                )
                .field(FieldDescriptor::new("weight", ValueKind::I64).slot(
                    |t: &Tag| Value::from(t.weight),
                    |t, v| {
                        t.weight = v.as_i64().unwrap_or_default();
                        Ok(())
                    },
                ))
                .field(
                    FieldDescriptor::new("registry", ValueKind::Str)
                        .public()
                        .static_slot(&TAG_REGISTRY),
                )
                .build()
                .expect("Tag schema")
        });
        &SCHEMA
    }
}

/// Counter element, index first: `day:count`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hits {
    pub day: SmolStr,
    pub count: i64,
}

impl Hits {
    pub fn new(day: &str, count: i64) -> Self {
        Self {
            day: day.into(),
            count,
        }
    }
}

impl Element for Hits {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Hits>> = Lazy::new(|| {
            Schema::builder("Hits")
                .field(
                    FieldDescriptor::new("day", ValueKind::Str)
                        .public()
                        .key(1)
                        .slot(|h: &Hits| Value::from(h.day.clone()), |h, v| set_str(&mut h.day, v)),
                )
                .field(
                    FieldDescriptor::new("count", ValueKind::I64)
                        .public()
                        .key(2)
                        .slot(
                            |h: &Hits| Value::from(h.count),
                            |h, v| {
                                h.count = v.as_i64().unwrap_or_default();
                                Ok(())
                            },
                        ),
                )
                .build()
                .expect("Hits schema")
        });
        &SCHEMA
    }
}

/// Counter element, value first and only allowed to grow: `level/zone`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gauge {
    pub zone: SmolStr,
    pub level: u64,
}

impl Gauge {
    pub fn new(zone: &str, level: u64) -> Self {
        Self {
            zone: zone.into(),
            level,
        }
    }
}

impl Element for Gauge {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Gauge>> = Lazy::new(|| {
            Schema::builder("Gauge")
                .separator("/")
                .field(
                    FieldDescriptor::new("level", ValueKind::U64)
                        .public()
                        .key(1)
                        .increment_mode(IncrementMode::Increasing)
                        .slot(
                            |g: &Gauge| Value::from(g.level),
                            |g, v| {
                                g.level = v.as_u64().unwrap_or_default();
                                Ok(())
                            },
                        ),
                )
                .field(
                    FieldDescriptor::new("zone", ValueKind::Str)
                        .public()
                        .key(2)
                        .slot(|g: &Gauge| Value::from(g.zone.clone()), |g, v| set_str(&mut g.zone, v)),
                )
                .build()
                .expect("Gauge schema")
        });
        &SCHEMA
    }
}

/// Entity stored in its own row; only valid in ordinary families.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Doc {
    pub id: SmolStr,
    pub size: i64,
}

impl Element for Doc {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Doc>> = Lazy::new(|| {
            Schema::builder("Doc")
                .persisting()
                .field(
                    FieldDescriptor::new("id", ValueKind::Str)
                        .public()
                        .key(1)
                        .slot(|d: &Doc| Value::from(d.id.clone()), |d, v| set_str(&mut d.id, v)),
                )
                .field(
                    FieldDescriptor::new("size", ValueKind::I64)
                        .public()
                        .key(2)
                        .slot(
                            |d: &Doc| Value::from(d.size),
                            |d, v| {
                                d.size = v.as_i64().unwrap_or_default();
                                Ok(())
                            },
                        ),
                )
                .build()
                .expect("Doc schema")
        });
        &SCHEMA
    }
}
