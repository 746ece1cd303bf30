use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use tracing::warn;

use super::Collector;
use crate::type_support::TimestampExtractor;
use crate::TimeDuration;
use crate::Timestamp;

/// Retains every value whose producer timestamp falls within `window` of the
/// newest buffered value.
///
/// The watermark is the timestamp of the most recently appended entry, not
/// the wall clock, so eviction is reproducible. `read` is a non-destructive
/// peek: the window itself does the eviction.
pub struct TimeWindowCollector<T> {
    window: TimeDuration,
    timestamp_of: TimestampExtractor<T>,
    buffer: Mutex<VecDeque<(T, Timestamp)>>,
}

impl<T> TimeWindowCollector<T> {
    pub fn with_extractor(
        window: TimeDuration,
        timestamp_of: TimestampExtractor<T>,
    ) -> Self {
        Self {
            window,
            timestamp_of,
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    pub fn new<F>(
        window: TimeDuration,
        timestamp_of: F,
    ) -> Self
    where
        F: Fn(&T) -> Option<Timestamp> + Send + Sync + 'static,
    {
        Self::with_extractor(window, Arc::new(timestamp_of))
    }

    pub fn window(&self) -> TimeDuration {
        self.window
    }

    /// Number of entries currently retained, including ones the next read
    /// will prune.
    pub fn retained(&self) -> usize {
        self.buffer.lock().len()
    }
}

impl<T> Collector<T> for TimeWindowCollector<T>
where T: Clone + Send + Sync + 'static
{
    fn write(
        &self,
        value: Option<T>,
    ) -> bool {
        let Some(value) = value else {
            return false;
        };
        let Some(timestamp) = (self.timestamp_of)(&value) else {
            warn!("TimeWindowCollector::write dropped a value without timestamp");
            return false;
        };
        self.buffer.lock().push_back((value, timestamp));
        true
    }

    fn read(&self) -> Vec<T> {
        let mut buffer = self.buffer.lock();
        let Some(&(_, watermark)) = buffer.back() else {
            return Vec::new();
        };

        let allowed = self.window.before(watermark);
        let before = buffer.len();
        buffer.retain(|(_, ts)| allowed.contains(*ts));
        if buffer.len() != before {
            trace!(
                "TimeWindowCollector::read pruned {} entries older than {}",
                before - buffer.len(),
                allowed.start()
            );
        }

        buffer.iter().map(|(v, _)| v.clone()).collect()
    }
}
