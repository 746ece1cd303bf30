use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use super::TimeDuration;
use super::NANOS_PER_SEC;

/// A point in time with nanosecond resolution, measured from the Unix epoch.
///
/// `nanos` is always normalised to `[0, 1_000_000_000)`, which keeps the
/// derived ordering consistent with the instant the value represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    secs: i64,
    nanos: u32,
}

impl Timestamp {
    pub fn of(
        secs: i64,
        nanos: u32,
    ) -> Self {
        Self::from_total_nanos(secs as i128 * NANOS_PER_SEC as i128 + nanos as i128)
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::of(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                Self::from_total_nanos(-(d.as_nanos() as i128))
            }
        }
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    pub fn plus(
        &self,
        duration: TimeDuration,
    ) -> Timestamp {
        Self::from_total_nanos(self.total_nanos() + duration.as_nanos() as i128)
    }

    pub fn minus(
        &self,
        duration: TimeDuration,
    ) -> Timestamp {
        Self::from_total_nanos(self.total_nanos() - duration.as_nanos() as i128)
    }

    /// Signed distance `self - reference`.
    pub fn duration_from(
        &self,
        reference: Timestamp,
    ) -> TimeDuration {
        let diff = self.total_nanos() - reference.total_nanos();
        TimeDuration::from_nanos(diff.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    fn total_nanos(&self) -> i128 {
        self.secs as i128 * NANOS_PER_SEC as i128 + self.nanos as i128
    }

    fn from_total_nanos(total: i128) -> Self {
        let per_sec = NANOS_PER_SEC as i128;
        let secs = total.div_euclid(per_sec);
        let nanos = total.rem_euclid(per_sec) as u32;
        Self {
            secs: secs.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
            nanos,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}
