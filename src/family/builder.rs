use std::collections::BTreeMap;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use super::{ColumnFamily, CounterField, FamilyOptions, RowHandle};
use crate::codec::{Codec, RecordCodec};
use crate::error::{CacheError, ConfigError};
use crate::increment::{DefaultIncrements, Incrementer};
use crate::schema::Element;

pub struct FamilyBuilder<T> {
    name: SmolStr,
    owner: RowHandle,
    property: Option<SmolStr>,
    index: Option<SmolStr>,
    options: FamilyOptions,
    codec: Option<Arc<dyn Codec<T>>>,
    incrementer: Option<Arc<dyn Incrementer>>,
}

impl<T: Element> FamilyBuilder<T> {
    pub(super) fn new(name: SmolStr, owner: RowHandle) -> Self {
        Self {
            name,
            owner,
            property: None,
            index: None,
            options: FamilyOptions::default(),
            codec: None,
            incrementer: None,
        }
    }

    pub fn property(mut self, property: impl Into<SmolStr>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Field whose rendered value keys each entry. Defaults to the element's
    /// first key field.
    pub fn index(mut self, field: impl Into<SmolStr>) -> Self {
        self.index = Some(field.into());
        self
    }

    pub fn append_only(mut self) -> Self {
        self.options.append_only = true;
        self
    }

    pub fn incrementing(mut self) -> Self {
        self.options.incrementing = true;
        self
    }

    pub fn options(mut self, options: FamilyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn codec(mut self, codec: Arc<dyn Codec<T>>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn incrementer(mut self, incrementer: Arc<dyn Incrementer>) -> Self {
        self.incrementer = Some(incrementer);
        self
    }

    pub fn build(self) -> Result<ColumnFamily<T>, CacheError> {
        let schema = T::schema();
        let incrementer = self
            .incrementer
            .unwrap_or_else(|| Arc::new(DefaultIncrements));

        let index = match self.index {
            Some(index) => index,
            None => schema
                .key_fields()
                .first()
                .map(|p| p.name().clone())
                .unwrap_or_default(),
        };
        let index_property = schema
            .property(&index)
            .filter(|p| p.descriptor().is_persisted())
            .ok_or_else(|| ConfigError::UnknownIndex {
                element: schema.name().clone(),
                field: index.clone(),
            })?;

        let counter = if self.options.incrementing {
            if schema.is_persisting() {
                return Err(ConfigError::PersistingElement {
                    element: schema.name().clone(),
                    family: self.name.clone(),
                }
                .into());
            }

            let values: Vec<_> = schema.persisted().filter(|p| p.name() != &index).collect();
            let [value] = values.as_slice() else {
                return Err(ConfigError::IncrementFieldCount {
                    element: schema.name().clone(),
                    count: values.len(),
                }
                .into());
            };
            let field = value.descriptor();

            incrementer
                .check_incrementable(field.kind())
                .map_err(|_| ConfigError::NotIncrementable {
                    field: field.name().clone(),
                    kind: field.kind(),
                })?;

            let missing_order = |name: &SmolStr| ConfigError::MissingKeyOrder {
                element: schema.name().clone(),
                field: name.clone(),
            };
            let index_order = index_property
                .descriptor()
                .key_order()
                .ok_or_else(|| missing_order(&index))?;
            let value_order = field.key_order().ok_or_else(|| missing_order(field.name()))?;

            Some(CounterField {
                name: field.name().clone(),
                kind: field.kind(),
                mode: field.mode(),
                index_first: index_order < value_order,
            })
        } else {
            None
        };

        debug!(
            family = %self.name,
            element = %schema.name(),
            index = %index,
            append_only = self.options.append_only,
            incrementing = counter.is_some(),
            "column family built"
        );

        let (changes, increments) = if counter.is_some() {
            (None, Some(BTreeMap::new()))
        } else {
            (Some(BTreeMap::new()), None)
        };

        Ok(ColumnFamily {
            name: self.name,
            property: self.property,
            owner: self.owner,
            index,
            append_only: self.options.append_only,
            counter,
            materialized: BTreeMap::new(),
            changes,
            increments,
            activated: false,
            codec: self
                .codec
                .unwrap_or_else(|| Arc::new(RecordCodec::<T>::new())),
            incrementer,
        })
    }
}
