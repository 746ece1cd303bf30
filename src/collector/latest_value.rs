use parking_lot::Mutex;
use tracing::trace;

use super::Collector;

/// Single-slot collector: every write overwrites, intermediate values are lost.
pub struct LatestValueCollector<T> {
    slot: Mutex<Option<T>>,
}

impl<T> LatestValueCollector<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> Default for LatestValueCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collector<T> for LatestValueCollector<T>
where T: Send + 'static
{
    fn write(
        &self,
        value: Option<T>,
    ) -> bool {
        let Some(value) = value else {
            return false;
        };
        let replaced = self.slot.lock().replace(value).is_some();
        if replaced {
            trace!("LatestValueCollector::write overwrote an unread value");
        }
        true
    }

    fn read(&self) -> Vec<T> {
        self.slot.lock().take().into_iter().collect()
    }
}
