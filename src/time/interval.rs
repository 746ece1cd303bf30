use super::Timestamp;

/// A range between two timestamps.
///
/// `contains` is inclusive at both ends; use `contains_half_open` where the
/// end must be excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    start: Timestamp,
    end: Timestamp,
}

impl TimeInterval {
    pub fn between(
        start: Timestamp,
        end: Timestamp,
    ) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn contains(
        &self,
        instant: Timestamp,
    ) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// `[start, end)`
    pub fn contains_half_open(
        &self,
        instant: Timestamp,
    ) -> bool {
        self.start <= instant && instant < self.end
    }
}
