//! Field read/write strategies and the per-field resolver that picks among them.
//!
//! Three strategies exist, tried in this order by [`resolve`]:
//!
//! - [`CompiledAccessor`]: straight calls through the descriptor's public slot
//!   or public accessor methods, fixed when the schema is built.
//! - [`BeanAccessor`]: public instance getter/setter methods only.
//! - [`HandleAccessor`]: reaches the raw slot whatever its visibility,
//!   preferring public methods when the field itself is private.
//!
//! [`MultiplePropertyAccessor`] keeps the strategies that could be built and
//! remembers, separately for reads and writes, the last one that worked.

mod bean;
mod compiled;
mod handle;
mod multiple;
mod resolver;

pub use bean::BeanAccessor;
pub use compiled::CompiledAccessor;
pub use handle::HandleAccessor;
pub use multiple::MultiplePropertyAccessor;
pub use resolver::resolve;

use smol_str::SmolStr;

use crate::error::{AccessError, Operation};
use crate::schema::{FieldDescriptor, Getter, Setter, Slot};
use crate::value::{Value, ValueKind};

/// Reads and writes one field of `T`.
pub trait PropertyAccessor<T>: Send + Sync {
    /// Short strategy name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether this accessor can perform `operation` at all.
    fn supports(&self, operation: Operation) -> bool {
        let _ = operation;
        true
    }

    fn get_value(&self, target: &T) -> Result<Value, AccessError>;

    fn set_value(&self, target: &mut T, value: Value) -> Result<(), AccessError>;
}

// ─── Route ──────────────────────────────────────────────────────────────────

enum Reader<T> {
    Slot(Slot<T>),
    Method(Getter<T>),
}

enum Writer<T> {
    Slot(Slot<T>),
    Method(Setter<T>),
    ReadOnly,
}

/// The concrete read and write paths a strategy settled on at construction.
struct Route<T> {
    field: SmolStr,
    kind: ValueKind,
    reader: Option<Reader<T>>,
    writer: Option<Writer<T>>,
}

impl<T> Route<T> {
    fn new(field: &FieldDescriptor<T>) -> Self {
        Self {
            field: field.name().clone(),
            kind: field.kind(),
            reader: None,
            writer: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.reader.is_none() && self.writer.is_none()
    }

    fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Read => self.reader.is_some(),
            Operation::Write => matches!(self.writer, Some(Writer::Slot(_) | Writer::Method(_))),
        }
    }

    fn denied(&self, operation: Operation) -> AccessError {
        AccessError::AccessDenied {
            field: self.field.clone(),
            operation,
        }
    }

    fn get(&self, target: &T) -> Result<Value, AccessError> {
        match &self.reader {
            Some(Reader::Slot(slot)) => Ok(read_slot(slot, target)),
            Some(Reader::Method(getter)) => Ok(getter.call(target)),
            None => Err(self.denied(Operation::Read)),
        }
    }

    fn set(&self, target: &mut T, value: Value) -> Result<(), AccessError> {
        if !self.kind.accepts(&value) {
            return Err(AccessError::TypeMismatch {
                field: self.field.clone(),
                expected: self.kind,
            });
        }
        match &self.writer {
            Some(Writer::Slot(slot)) => write_slot(slot, target, value),
            Some(Writer::Method(setter)) => setter.call(target, value),
            Some(Writer::ReadOnly) => Err(AccessError::ReadOnly {
                field: self.field.clone(),
            }),
            None => Err(self.denied(Operation::Write)),
        }
    }
}

#[inline]
fn read_slot<T>(slot: &Slot<T>, target: &T) -> Value {
    match slot {
        Slot::Instance { get, .. } => get(target),
        Slot::Static(cell) => cell.read().clone(),
    }
}

#[inline]
fn write_slot<T>(slot: &Slot<T>, target: &mut T, value: Value) -> Result<(), AccessError> {
    match slot {
        Slot::Instance { set, .. } => set(target, value),
        Slot::Static(cell) => {
            *cell.write() = value;
            Ok(())
        }
    }
}

fn slot_writer<T>(field: &FieldDescriptor<T>, slot: Slot<T>) -> Writer<T> {
    if field.is_read_only() {
        Writer::ReadOnly
    } else {
        Writer::Slot(slot)
    }
}
