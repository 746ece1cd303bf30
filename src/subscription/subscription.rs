use std::sync::Arc;

use tracing::debug;

use super::SourceHandle;
use crate::Collector;
use crate::DecouplerConfig;
use crate::SourceCollector;
use crate::SourceDesiredRateDecoupler;

/// Consumer-side end of a subscription.
///
/// Owns the decoupler and the collector; producers only reach them weakly.
/// Dropping the subscription closes it.
pub struct Subscription<T>
where T: Send + 'static
{
    config: DecouplerConfig,
    decoupler: SourceDesiredRateDecoupler<T>,
    collector: Arc<dyn Collector<T>>,
    source: Option<Arc<SourceCollector<T>>>,
}

impl<T> Subscription<T>
where T: Send + 'static
{
    pub(super) fn new(
        config: DecouplerConfig,
        decoupler: SourceDesiredRateDecoupler<T>,
        collector: Arc<dyn Collector<T>>,
        source: Option<Arc<SourceCollector<T>>>,
    ) -> Self {
        Self {
            config,
            decoupler,
            collector,
            source,
        }
    }

    pub fn id(&self) -> &str {
        self.decoupler.id()
    }

    pub fn config(&self) -> &DecouplerConfig {
        &self.config
    }

    /// Another producer endpoint for the same subscription.
    pub fn source(&self) -> SourceHandle<T> {
        SourceHandle::new(
            Arc::downgrade(&self.collector),
            self.source.as_ref().map(Arc::downgrade),
            self.decoupler.handle(),
        )
    }

    /// Explicit readiness for listeners that keep only the cycle number.
    pub fn ready_for_next_event(
        &self,
        cycle: u64,
    ) -> crate::Result<()> {
        self.decoupler.ready_for_next_event(cycle)
    }

    pub fn pause(&self) {
        self.decoupler.pause();
    }

    pub fn resume(&self) {
        self.decoupler.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.decoupler.is_paused()
    }

    /// Idempotent. An event already delivered completes normally.
    pub fn close(&self) {
        self.decoupler.close();
    }

    pub fn is_closed(&self) -> bool {
        self.decoupler.is_closed()
    }
}

impl<T> Drop for Subscription<T>
where T: Send + 'static
{
    fn drop(&mut self) {
        if !self.decoupler.is_closed() {
            debug!("[{}] closing dropped subscription", self.decoupler.id());
            self.decoupler.close();
        }
    }
}
