use super::{PropertyAccessor, Reader, Route, Writer, slot_writer};
use crate::error::{AccessError, Operation};
use crate::schema::FieldDescriptor;
use crate::value::Value;

/// Direct calls fixed at schema build time.
///
/// Public fields go straight to their slot. Non-public fields are served
/// through their public accessor methods, static or not; a direction without
/// a public method fails when called. A field with neither cannot be compiled.
pub struct CompiledAccessor<T> {
    route: Route<T>,
}

impl<T> CompiledAccessor<T> {
    pub fn new(field: &FieldDescriptor<T>) -> Result<Self, AccessError> {
        let mut route = Route::new(field);
        match field.field_slot() {
            Some(slot) if field.is_public() => {
                route.reader = Some(Reader::Slot(slot));
                route.writer = Some(slot_writer(field, slot));
            }
            _ => {
                route.reader = field.public_getter().map(Reader::Method);
                route.writer = field.public_setter().map(Writer::Method);
            }
        }
        if route.is_empty() {
            return Err(field.denied(Operation::Read));
        }
        Ok(Self { route })
    }
}

impl<T> PropertyAccessor<T> for CompiledAccessor<T> {
    fn name(&self) -> &'static str {
        "compiled"
    }

    fn supports(&self, operation: Operation) -> bool {
        self.route.supports(operation)
    }

    #[inline]
    fn get_value(&self, target: &T) -> Result<Value, AccessError> {
        self.route.get(target)
    }

    #[inline]
    fn set_value(&self, target: &mut T, value: Value) -> Result<(), AccessError> {
        self.route.set(target, value)
    }
}
