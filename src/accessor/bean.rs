use super::{PropertyAccessor, Reader, Route, Writer};
use crate::error::{AccessError, Operation};
use crate::schema::FieldDescriptor;
use crate::value::Value;

/// Public instance getter/setter pair. Static methods are not bean properties.
pub struct BeanAccessor<T> {
    route: Route<T>,
}

impl<T> BeanAccessor<T> {
    pub fn new(field: &FieldDescriptor<T>) -> Result<Self, AccessError> {
        let mut route = Route::new(field);
        route.reader = field
            .public_getter()
            .filter(|g| !g.is_static())
            .map(Reader::Method);
        route.writer = field
            .public_setter()
            .filter(|s| !s.is_static())
            .map(Writer::Method);
        if route.is_empty() {
            return Err(field.denied(Operation::Read));
        }
        Ok(Self { route })
    }
}

impl<T> PropertyAccessor<T> for BeanAccessor<T> {
    fn name(&self) -> &'static str {
        "bean"
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
