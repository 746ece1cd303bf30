use std::sync::Arc;

use arc_swap::ArcSwapOption;

use super::ReadFunction;
use super::WriteFunction;
use crate::ProducerError;

/// Holds the latest value pushed by a source binding.
///
/// Writers replace the value atomically; readers clone it out without
/// blocking the writer.
pub struct ValueCache<T> {
    value: ArcSwapOption<T>,
}

impl<T> ValueCache<T> {
    pub fn new() -> Self {
        Self {
            value: ArcSwapOption::empty(),
        }
    }

    pub fn with_value(value: T) -> Self {
        Self {
            value: ArcSwapOption::from_pointee(value),
        }
    }

    pub fn latest(&self) -> Option<Arc<T>> {
        self.value.load_full()
    }

    pub fn clear(&self) {
        self.value.store(None);
    }
}

impl<T> Default for ValueCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadFunction<T> for ValueCache<T>
where T: Clone + Send + Sync
{
    fn read_value(&self) -> Result<Option<T>, ProducerError> {
        Ok(self.value.load().as_ref().map(|v| T::clone(v)))
    }
}

impl<T> WriteFunction<T> for ValueCache<T>
where T: Send + Sync
{
    fn write_value(
        &self,
        value: T,
    ) {
        self.value.store(Some(Arc::new(value)));
    }
}
