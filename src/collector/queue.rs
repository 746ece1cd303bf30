use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::trace;

use super::Collector;
use crate::metrics::QUEUE_EVICTIONS;

/// Bounded FIFO collector.
///
/// Writers never block on a full queue: the oldest element is evicted to
/// admit the new one.
pub struct QueueCollector<T> {
    pub(super) capacity: usize,
    pub(super) buffer: Mutex<VecDeque<T>>,
}

impl<T> QueueCollector<T> {
    /// `capacity` must be non-zero; the config layer rejects zero before
    /// construction.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}

impl<T> Collector<T> for QueueCollector<T>
where T: Send + 'static
{
    fn write(
        &self,
        value: Option<T>,
    ) -> bool {
        let Some(value) = value else {
            return false;
        };
        let evicted = {
            let mut buffer = self.buffer.lock();
            let evicted = if buffer.len() >= self.capacity {
                buffer.pop_front().is_some()
            } else {
                false
            };
            buffer.push_back(value);
            evicted
        };
        if evicted {
            QUEUE_EVICTIONS.inc();
            trace!("QueueCollector::write evicted oldest, capacity={}", self.capacity);
        }
        true
    }

    fn read(&self) -> Vec<T> {
        let drained = std::mem::take(&mut *self.buffer.lock());
        drained.into()
    }
}
