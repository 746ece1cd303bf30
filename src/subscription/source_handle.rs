use std::sync::Weak;

use tracing::debug;
use tracing::trace;

use crate::CollectOutcome;
use crate::Collector;
use crate::DecouplerHandle;
use crate::ProducerError;
use crate::SourceCollector;

/// Producer-side end of a subscription.
///
/// Every method returns quickly and never fails: once the subscription is
/// closed or dropped, calls have no effect.
pub struct SourceHandle<T> {
    collector: Weak<dyn Collector<T>>,
    source: Option<Weak<SourceCollector<T>>>,
    decoupler: DecouplerHandle,
}

impl<T> Clone for SourceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
            source: self.source.clone(),
            decoupler: self.decoupler.clone(),
        }
    }
}

impl<T> SourceHandle<T>
where T: Send + 'static
{
    pub(super) fn new(
        collector: Weak<dyn Collector<T>>,
        source: Option<Weak<SourceCollector<T>>>,
        decoupler: DecouplerHandle,
    ) -> Self {
        Self {
            collector,
            source,
            decoupler,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.decoupler.is_closed()
    }

    /// Buffers `value` and signals the decoupler.
    ///
    /// `None` means no update and is ignored. Returns whether the value was
    /// accepted.
    pub fn write(
        &self,
        value: Option<T>,
    ) -> bool {
        if self.decoupler.is_closed() {
            trace!("write after close ignored");
            return false;
        }
        let Some(collector) = self.collector.upgrade() else {
            return false;
        };
        if !collector.write(value) {
            return false;
        }
        // buffer lock released before signalling
        drop(collector);
        self.decoupler.new_value_event();
        true
    }

    /// Runs the subscription's read function once and reports the outcome.
    ///
    /// A failing function becomes a read exception event; nothing is raised
    /// into the producer.
    pub fn collect(&self) -> CollectOutcome {
        if self.decoupler.is_closed() {
            return CollectOutcome::NoUpdate;
        }
        let Some(source) = self.source.as_ref().and_then(Weak::upgrade) else {
            debug!("collect called on a subscription without a read function");
            return CollectOutcome::NoUpdate;
        };
        let outcome = source.collect();
        match &outcome {
            CollectOutcome::Stored => self.decoupler.new_value_event(),
            CollectOutcome::Failed(e) => self.decoupler.new_read_exception_event(e.clone()),
            CollectOutcome::NoUpdate => {}
        }
        outcome
    }

    pub fn read_connection(
        &self,
        connected: bool,
    ) {
        self.decoupler.new_read_connection_event(connected);
    }

    pub fn write_connection(
        &self,
        connected: bool,
    ) {
        self.decoupler.new_write_connection_event(connected);
    }

    pub fn read_exception(
        &self,
        error: ProducerError,
    ) {
        self.decoupler.new_read_exception_event(error);
    }

    pub fn write_exception(
        &self,
        error: ProducerError,
    ) {
        self.decoupler.new_write_exception_event(error);
    }

    pub fn write_succeeded(&self) {
        self.decoupler.new_write_succeeded_event();
    }

    pub fn write_failed(
        &self,
        error: ProducerError,
    ) {
        self.decoupler.new_write_failed_event(error);
    }
}
