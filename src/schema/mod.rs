//! Per-type field metadata: what an element stores, in which order its key
//! is composed, and how each field is reached.

mod field;

pub use field::{
    FieldDescriptor, Getter, IncrementMode, Method, Setter, Slot, SlotGetter, SlotSetter,
    StaticGetter, StaticSetter, Visibility,
};

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use smol_str::SmolStr;
use tracing::debug;

use crate::accessor::{MultiplePropertyAccessor, PropertyAccessor, resolve};
use crate::error::{AccessError, Operation};
use crate::value::Value;

type FastMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

pub const DEFAULT_SEPARATOR: &str = ":";

/// A type that can live inside a column family.
///
/// Implementors hand out a schema built once per type, usually from a
/// `once_cell::sync::Lazy` static.
pub trait Element: Clone + PartialEq + Default + std::fmt::Debug + Send + Sync + 'static {
    fn schema() -> &'static Schema<Self>;
}

/// A field descriptor together with its resolved accessor chain.
pub struct Property<T> {
    descriptor: FieldDescriptor<T>,
    accessor: MultiplePropertyAccessor<T>,
}

impl<T> Property<T> {
    pub fn name(&self) -> &SmolStr {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &FieldDescriptor<T> {
        &self.descriptor
    }

    pub fn accessor(&self) -> &MultiplePropertyAccessor<T> {
        &self.accessor
    }

    #[inline]
    pub fn get(&self, target: &T) -> Result<Value, AccessError> {
        self.accessor.get_value(target)
    }

    #[inline]
    pub fn set(&self, target: &mut T, value: Value) -> Result<(), AccessError> {
        self.accessor.set_value(target, value)
    }
}

pub struct Schema<T> {
    name: SmolStr,
    separator: SmolStr,
    persisting: bool,
    properties: Vec<Property<T>>,
    by_name: FastMap<SmolStr, usize>,
}

impl<T: 'static> Schema<T> {
    pub fn builder(name: impl Into<SmolStr>) -> SchemaBuilder<T> {
        SchemaBuilder {
            name: name.into(),
            separator: SmolStr::new_static(DEFAULT_SEPARATOR),
            persisting: false,
            fields: Vec::new(),
        }
    }
}

impl<T> Schema<T> {
    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    /// Joins the parts of a composite key.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Elements of a persisting type are entities of their own, stored in
    /// their own rows.
    pub fn is_persisting(&self) -> bool {
        self.persisting
    }

    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }

    pub fn property(&self, field: &str) -> Option<&Property<T>> {
        self.by_name.get(field).map(|&i| &self.properties[i])
    }

    /// Fields that are written to and read back from the store.
    pub fn persisted(&self) -> impl Iterator<Item = &Property<T>> {
        self.properties
            .iter()
            .filter(|p| p.descriptor.is_persisted())
    }

    /// Fields taking part in the composite key, lowest order first.
    pub fn key_fields(&self) -> Vec<&Property<T>> {
        let mut keyed: Vec<_> = self
            .properties
            .iter()
            .filter(|p| p.descriptor.key_order().is_some())
            .collect();
        keyed.sort_by_key(|p| p.descriptor.key_order());
        keyed
    }

    pub fn read(&self, target: &T, field: &str) -> Result<Value, AccessError> {
        self.lookup(field)?.get(target)
    }

    pub fn write(&self, target: &mut T, field: &str, value: Value) -> Result<(), AccessError> {
        self.lookup(field)?.set(target, value)
    }

    fn lookup(&self, field: &str) -> Result<&Property<T>, AccessError> {
        self.property(field).ok_or_else(|| AccessError::UnknownField {
            element: self.name.clone(),
            field: SmolStr::from(field),
        })
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("separator", &self.separator)
            .field("persisting", &self.persisting)
            .field(
                "fields",
                &self.properties.iter().map(Property::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub struct SchemaBuilder<T> {
    name: SmolStr,
    separator: SmolStr,
    persisting: bool,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub fn separator(mut self, separator: impl Into<SmolStr>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn persisting(mut self) -> Self {
        self.persisting = true;
        self
    }

    pub fn field(mut self, field: FieldDescriptor<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Resolves every field. Persisted fields must be both readable and
    /// writable since the codec does both.
    pub fn build(self) -> Result<Schema<T>, AccessError> {
        let mut properties = Vec::with_capacity(self.fields.len());
        let mut by_name = FastMap::default();

        for descriptor in self.fields {
            if by_name.contains_key(descriptor.name()) {
                return Err(AccessError::Failed {
                    field: descriptor.name().clone(),
                    reason: "declared twice".into(),
                });
            }
            let required: &[Operation] = if descriptor.is_persisted() {
                &[Operation::Read, Operation::Write]
            } else {
                &[]
            };
            let accessor = resolve(&descriptor, required)?;
            debug!(
                element = %self.name,
                field = %descriptor.name(),
                candidates = ?accessor.candidate_names(),
                "resolved field accessors"
            );
            by_name.insert(descriptor.name().clone(), properties.len());
            properties.push(Property {
                descriptor,
                accessor,
            });
        }

        Ok(Schema {
            name: self.name,
            separator: self.separator,
            persisting: self.persisting,
            properties,
            by_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Hits, Tag};
    use crate::value::ValueKind;

    #[test]
    fn key_fields_follow_declared_order() {
        let schema = Hits::schema();
        let names: Vec<String> = schema.key_fields().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["day", "count"]);
        assert_eq!(schema.separator(), ":");
    }

    #[test]
    fn static_fields_are_not_persisted() {
        let persisted: Vec<_> = Tag::schema().persisted().map(|p| p.name().as_str()).collect();
        assert!(persisted.contains(&"name"));
        assert!(!persisted.contains(&"registry"));
    }

    #[test]
    fn read_write_by_name() {
        let schema = Tag::schema();
        let mut tag = Tag::default();
        schema.write(&mut tag, "name", Value::from("rust")).unwrap();
        assert_eq!(tag.name.as_str(), "rust");
        assert_eq!(schema.read(&tag, "name").unwrap(), Value::from("rust"));

        let err = schema.read(&tag, "nope").unwrap_err();
        assert!(matches!(err, AccessError::UnknownField { .. }));
    }

    #[test]
    fn duplicate_fields_rejected() {
        let result = Schema::<Tag>::builder("Dup")
            .field(FieldDescriptor::new("a", ValueKind::Str).public().slot(
                |t: &Tag| Value::from(t.name.clone()),
                |_, _| Ok(()),
            ))
            .field(FieldDescriptor::new("a", ValueKind::Str).public().slot(
                |t: &Tag| Value::from(t.name.clone()),
                |_, _| Ok(()),
            ))
            .build();
        assert!(matches!(result, Err(AccessError::Failed { .. })));
    }

    #[test]
    fn persisted_field_must_be_writable() {
        // a private field exposed only through a public getter
        let result = Schema::<Tag>::builder("Half")
            .field(
                FieldDescriptor::new("a", ValueKind::Str)
                    .getter(|t: &Tag| Value::from(t.name.clone()), Visibility::Public),
            )
            .build();
        assert_eq!(
            result.unwrap_err(),
            AccessError::AccessDenied {
                field: "a".into(),
                operation: Operation::Write
            }
        );
    }
}
