use std::fmt;
use std::time::Duration;

use super::TimeInterval;
use super::Timestamp;
use super::NANOS_PER_MILLI;
use super::NANOS_PER_SEC;
use crate::DivisionError;

/// A signed span of time (3 s, 30 ms, 1 ns) kept as a count of nanoseconds.
///
/// No range check is performed on construction; arithmetic saturates at the
/// `i64` limits instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeDuration {
    nanos: i64,
}

impl TimeDuration {
    pub const ZERO: TimeDuration = TimeDuration { nanos: 0 };

    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    pub const fn from_millis(ms: i64) -> Self {
        Self {
            nanos: ms.saturating_mul(NANOS_PER_MILLI),
        }
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self {
            nanos: secs.saturating_mul(NANOS_PER_SEC),
        }
    }

    pub const fn as_nanos(&self) -> i64 {
        self.nanos
    }

    pub const fn as_millis(&self) -> i64 {
        self.nanos / NANOS_PER_MILLI
    }

    pub const fn is_negative(&self) -> bool {
        self.nanos < 0
    }

    /// Truncating integer division.
    pub fn divide_by(
        &self,
        factor: i64,
    ) -> Result<TimeDuration, DivisionError> {
        if factor == 0 {
            return Err(DivisionError::DivideByZero { nanos: self.nanos });
        }
        Ok(Self::from_nanos(self.nanos / factor))
    }

    pub fn multiply_by(
        &self,
        factor: i64,
    ) -> TimeDuration {
        Self::from_nanos(self.nanos.saturating_mul(factor))
    }

    pub fn plus(
        &self,
        other: TimeDuration,
    ) -> TimeDuration {
        Self::from_nanos(self.nanos.saturating_add(other.nanos))
    }

    /// Converts to a std duration; `None` when negative.
    pub fn to_std(&self) -> Option<Duration> {
        u64::try_from(self.nanos).ok().map(Duration::from_nanos)
    }

    /// Interval of this duration centred on `reference`.
    pub fn around(
        &self,
        reference: Timestamp,
    ) -> TimeInterval {
        let half = Self::from_nanos(self.nanos / 2);
        TimeInterval::between(reference.minus(half), reference.plus(half))
    }

    /// `[reference, reference + self]`
    pub fn after(
        &self,
        reference: Timestamp,
    ) -> TimeInterval {
        TimeInterval::between(reference, reference.plus(*self))
    }

    /// `[reference - self, reference]`
    pub fn before(
        &self,
        reference: Timestamp,
    ) -> TimeInterval {
        TimeInterval::between(reference.minus(*self), reference)
    }
}

impl From<Duration> for TimeDuration {
    fn from(d: Duration) -> Self {
        Self::from_nanos(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for TimeDuration {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}ns", self.nanos)
    }
}
