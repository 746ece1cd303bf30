use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::Collector;
use crate::ProducerError;
use crate::ReadFunction;

/// Result of invoking the read function once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectOutcome {
    /// A new value reached the buffer
    Stored,
    /// The function had nothing new
    NoUpdate,
    /// The function failed; nothing was buffered
    Failed(ProducerError),
}

/// Pairs a read function with the collector it feeds.
///
/// Computing a value may take time, so calls to `collect` are serialised by a
/// write-side lock; the buffer lock is only taken for the append.
pub struct SourceCollector<T> {
    function: Arc<dyn ReadFunction<T>>,
    collector: Arc<dyn Collector<T>>,
    write_lock: Mutex<()>,
}

impl<T> SourceCollector<T>
where T: Send + 'static
{
    pub fn new(
        function: Arc<dyn ReadFunction<T>>,
        collector: Arc<dyn Collector<T>>,
    ) -> Self {
        Self {
            function,
            collector,
            write_lock: Mutex::new(()),
        }
    }

    pub fn collector(&self) -> &Arc<dyn Collector<T>> {
        &self.collector
    }

    /// Invokes the read function and buffers its value.
    ///
    /// Errors are returned as an outcome, never raised into the producer.
    pub fn collect(&self) -> CollectOutcome {
        let _guard = self.write_lock.lock();
        match self.function.read_value() {
            Ok(Some(value)) => {
                if self.collector.write(Some(value)) {
                    CollectOutcome::Stored
                } else {
                    CollectOutcome::NoUpdate
                }
            }
            Ok(None) => CollectOutcome::NoUpdate,
            Err(e) => {
                debug!("SourceCollector::collect read function failed: {}", e);
                CollectOutcome::Failed(e)
            }
        }
    }
}
