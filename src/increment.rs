//! Increment policy for counter families.

use crate::error::IncrementError;
use crate::schema::IncrementMode;
use crate::value::{Number, ValueKind};

/// Decides which numeric kinds can be counters and what delta a new value
/// amounts to.
pub trait Incrementer: Send + Sync {
    fn check_incrementable(&self, kind: ValueKind) -> Result<(), IncrementError>;

    /// Delta to push for `field` moving from `old` to `new`, on top of the
    /// `pending` delta not yet flushed. A missing `old` counts as zero.
    fn compute_delta(
        &self,
        field: &str,
        mode: IncrementMode,
        new: Option<Number>,
        old: Option<Number>,
        pending: Option<Number>,
    ) -> Result<Number, IncrementError>;
}

/// Integral counters; deltas are carried as `i64`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIncrements;

impl DefaultIncrements {
    fn integral(n: Number) -> Result<i128, IncrementError> {
        n.as_i128()
            .ok_or(IncrementError::Unsupported { kind: n.kind() })
    }
}

impl Incrementer for DefaultIncrements {
    fn check_incrementable(&self, kind: ValueKind) -> Result<(), IncrementError> {
        match kind {
            ValueKind::I64 | ValueKind::U64 => Ok(()),
            kind => Err(IncrementError::Unsupported { kind }),
        }
    }

    fn compute_delta(
        &self,
        field: &str,
        mode: IncrementMode,
        new: Option<Number>,
        old: Option<Number>,
        pending: Option<Number>,
    ) -> Result<Number, IncrementError> {
        let new = new.ok_or_else(|| IncrementError::MissingValue {
            field: field.into(),
        })?;
        let new = Self::integral(new)?;
        let old = old.map(Self::integral).transpose()?.unwrap_or(0);
        let pending = pending.map(Self::integral).transpose()?.unwrap_or(0);

        let delta = new - old;
        let allowed = match mode {
            IncrementMode::Increasing if delta < 0 => Some("up"),
            IncrementMode::Decreasing if delta > 0 => Some("down"),
            _ => None,
        };
        if let Some(allowed) = allowed {
            return Err(IncrementError::WrongDirection {
                field: field.into(),
                allowed,
                delta,
            });
        }

        i64::try_from(delta + pending)
            .map(Number::I64)
            .map_err(|_| IncrementError::Overflow {
                field: field.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(
        mode: IncrementMode,
        new: Option<Number>,
        old: Option<Number>,
        pending: Option<Number>,
    ) -> Result<Number, IncrementError> {
        DefaultIncrements.compute_delta("count", mode, new, old, pending)
    }

    #[test]
    fn only_integers_are_incrementable() {
        assert!(DefaultIncrements.check_incrementable(ValueKind::I64).is_ok());
        assert!(DefaultIncrements.check_incrementable(ValueKind::U64).is_ok());
        assert_eq!(
            DefaultIncrements.check_incrementable(ValueKind::F64),
            Err(IncrementError::Unsupported { kind: ValueKind::F64 })
        );
        assert!(DefaultIncrements.check_incrementable(ValueKind::Str).is_err());
    }

    #[test]
    fn delta_accumulates_pending() {
        let free = IncrementMode::Free;
        assert_eq!(delta(free, Some(Number::I64(5)), None, None), Ok(Number::I64(5)));
        assert_eq!(
            delta(free, Some(Number::I64(8)), Some(Number::I64(5)), Some(Number::I64(5))),
            Ok(Number::I64(8))
        );
        assert_eq!(
            delta(free, Some(Number::I64(2)), Some(Number::I64(8)), Some(Number::I64(8))),
            Ok(Number::I64(2))
        );
        assert_eq!(
            delta(free, Some(Number::U64(3)), Some(Number::U64(10)), None),
            Ok(Number::I64(-7))
        );
    }

    #[test]
    fn direction_is_enforced() {
        let err = delta(IncrementMode::Increasing, Some(Number::U64(1)), Some(Number::U64(4)), None);
        assert_eq!(
            err,
            Err(IncrementError::WrongDirection {
                field: "count".into(),
                allowed: "up",
                delta: -3
            })
        );
        assert!(delta(IncrementMode::Decreasing, Some(Number::I64(4)), Some(Number::I64(1)), None).is_err());
        assert!(delta(IncrementMode::Decreasing, Some(Number::I64(1)), Some(Number::I64(4)), None).is_ok());
    }

    #[test]
    fn missing_float_and_overflow() {
        assert!(matches!(
            delta(IncrementMode::Free, None, None, None),
            Err(IncrementError::MissingValue { .. })
        ));
        assert!(matches!(
            delta(IncrementMode::Free, Some(Number::F64(1.5)), None, None),
            Err(IncrementError::Unsupported { .. })
        ));
        assert!(matches!(
            delta(IncrementMode::Free, Some(Number::U64(u64::MAX)), None, None),
            Err(IncrementError::Overflow { .. })
        ));
        assert!(matches!(
            delta(IncrementMode::Free, Some(Number::I64(i64::MAX)), None, Some(Number::I64(1))),
            Err(IncrementError::Overflow { .. })
        ));
    }
}
