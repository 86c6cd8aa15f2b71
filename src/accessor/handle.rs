use super::{PropertyAccessor, Reader, Route, Writer, slot_writer};
use crate::error::{AccessError, Operation};
use crate::schema::FieldDescriptor;
use crate::value::Value;

/// Raw handle on the field slot, ignoring visibility.
///
/// For a private field with a public getter or setter the method is used for
/// that direction, so that any logic it carries still runs.
pub struct HandleAccessor<T> {
    route: Route<T>,
}

impl<T> HandleAccessor<T> {
    pub fn new(field: &FieldDescriptor<T>) -> Result<Self, AccessError> {
        let mut route = Route::new(field);
        let prefer_methods = !field.is_public();
        let slot = field.field_slot();

        route.reader = match field.public_getter() {
            Some(getter) if prefer_methods => Some(Reader::Method(getter)),
            _ => slot.map(Reader::Slot),
        };
        route.writer = match field.public_setter() {
            Some(setter) if prefer_methods => Some(Writer::Method(setter)),
            _ => slot.map(|slot| slot_writer(field, slot)),
        };
        if route.is_empty() {
            return Err(field.denied(Operation::Read));
        }
        Ok(Self { route })
    }
}

impl<T> PropertyAccessor<T> for HandleAccessor<T> {
    fn name(&self) -> &'static str {
        "handle"
    }

    fn supports(&self, operation: Operation) -> bool {
        self.route.supports(operation)
    }

    fn get_value(&self, target: &T) -> Result<Value, AccessError> {
        self.route.get(target)
    }

    fn set_value(&self, target: &mut T, value: Value) -> Result<(), AccessError> {
        self.route.set(target, value)
    }
}
