use tracing::trace;

use super::{
    BeanAccessor, CompiledAccessor, HandleAccessor, MultiplePropertyAccessor, PropertyAccessor,
};
use crate::error::{AccessError, Operation};
use crate::schema::FieldDescriptor;

/// Builds the accessor chain for `field`.
///
/// Every strategy that can be constructed is kept, in the order compiled,
/// bean, handle. Each operation in `required` must be served by at least one
/// of them, otherwise the field is rejected here rather than on first use.
pub fn resolve<T: 'static>(
    field: &FieldDescriptor<T>,
    required: &[Operation],
) -> Result<MultiplePropertyAccessor<T>, AccessError> {
    let mut candidates: Vec<Box<dyn PropertyAccessor<T>>> = Vec::with_capacity(3);

    match CompiledAccessor::new(field) {
        Ok(a) => candidates.push(Box::new(a)),
        Err(e) => trace!(field = %field.name(), error = %e, "no compiled accessor"),
    }
    match BeanAccessor::new(field) {
        Ok(a) => candidates.push(Box::new(a)),
        Err(e) => trace!(field = %field.name(), error = %e, "no bean accessor"),
    }
    match HandleAccessor::new(field) {
        Ok(a) => candidates.push(Box::new(a)),
        Err(e) => trace!(field = %field.name(), error = %e, "no handle accessor"),
    }

    if candidates.is_empty() {
        return Err(field.denied(required.first().copied().unwrap_or(Operation::Read)));
    }
    for &operation in required {
        if !candidates.iter().any(|c| c.supports(operation)) {
            return Err(field.denied(operation));
        }
    }

    MultiplePropertyAccessor::new(field.name().clone(), candidates)
}
