use std::sync::atomic::{AtomicUsize, Ordering};

use smol_str::SmolStr;
use tracing::debug;

use super::PropertyAccessor;
use crate::error::{AccessError, Operation};
use crate::value::Value;

const NONE: usize = usize::MAX;

/// Ordered list of candidate accessors for one field with a remembered
/// winner per direction.
///
/// The memo is only a hint: concurrent callers may race on it, and a stale
/// read just costs one extra attempt. Correctness never depends on it.
pub struct MultiplePropertyAccessor<T> {
    field: SmolStr,
    candidates: Vec<Box<dyn PropertyAccessor<T>>>,
    reader: AtomicUsize,
    writer: AtomicUsize,
}

impl<T> MultiplePropertyAccessor<T> {
    pub fn new(
        field: impl Into<SmolStr>,
        candidates: Vec<Box<dyn PropertyAccessor<T>>>,
    ) -> Result<Self, AccessError> {
        let field = field.into();
        if candidates.is_empty() {
            return Err(AccessError::NoCandidates { field });
        }
        Ok(Self {
            field,
            candidates,
            reader: AtomicUsize::new(NONE),
            writer: AtomicUsize::new(NONE),
        })
    }

    pub fn field(&self) -> &SmolStr {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Strategy names in the order they are tried.
    pub fn candidate_names(&self) -> Vec<&'static str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    /// Index of the candidate that last served `operation`, if any.
    pub fn remembered(&self, operation: Operation) -> Option<usize> {
        match self.memo(operation).load(Ordering::Relaxed) {
            NONE => None,
            i => Some(i),
        }
    }

    /// At least one candidate can perform `operation`.
    pub fn supports(&self, operation: Operation) -> bool {
        self.candidates.iter().any(|c| c.supports(operation))
    }

    fn memo(&self, operation: Operation) -> &AtomicUsize {
        match operation {
            Operation::Read => &self.reader,
            Operation::Write => &self.writer,
        }
    }

    fn dispatch<R>(
        &self,
        operation: Operation,
        mut attempt: impl FnMut(&dyn PropertyAccessor<T>) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        let memo = self.memo(operation);
        let remembered = memo.load(Ordering::Relaxed);
        let mut last_err = None;

        if let Some(candidate) = self.candidates.get(remembered) {
            match attempt(candidate.as_ref()) {
                Ok(out) => return Ok(out),
                Err(e) => {
                    debug!(
                        field = %self.field,
                        %operation,
                        accessor = candidate.name(),
                        error = %e,
                        "remembered accessor failed, falling back"
                    );
                    let _ = memo.compare_exchange(remembered, NONE, Ordering::Relaxed, Ordering::Relaxed);
                    last_err = Some(e);
                }
            }
        }

        for (i, candidate) in self.candidates.iter().enumerate() {
            if i == remembered {
                continue;
            }
            match attempt(candidate.as_ref()) {
                Ok(out) => {
                    memo.store(i, Ordering::Relaxed);
                    return Ok(out);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| AccessError::NoCandidates {
            field: self.field.clone(),
        }))
    }
}

impl<T> PropertyAccessor<T> for MultiplePropertyAccessor<T> {
    fn name(&self) -> &'static str {
        "multiple"
    }

    fn supports(&self, operation: Operation) -> bool {
        MultiplePropertyAccessor::supports(self, operation)
    }

    fn get_value(&self, target: &T) -> Result<Value, AccessError> {
        self.dispatch(Operation::Read, |c| c.get_value(target))
    }

    fn set_value(&self, target: &mut T, value: Value) -> Result<(), AccessError> {
        self.dispatch(Operation::Write, |c| c.set_value(target, value.clone()))
    }
}

impl<T> std::fmt::Debug for MultiplePropertyAccessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplePropertyAccessor")
            .field("field", &self.field)
            .field("candidates", &self.candidate_names())
            .field("reader", &self.remembered(Operation::Read))
            .field("writer", &self.remembered(Operation::Write))
            .finish()
    }
}
