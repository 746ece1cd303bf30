use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use super::DecouplerState;
use super::DesiredRateEvent;
#[cfg(test)]
use super::Phase;
use super::Signal;
use super::Transition;
use crate::metrics::COALESCED_SIGNALS;
use crate::metrics::DISPATCHED_EVENTS;
use crate::metrics::PRODUCER_ERRORS;
use crate::metrics::PROTOCOL_VIOLATIONS;
use crate::metrics::RATE_CAP_DEFERRAL_MS;
use crate::Collector;
use crate::Error;
use crate::NotificationDispatch;
use crate::ProducerError;
use crate::Result;

/// Receives the coalesced events of one subscription.
///
/// Every event comes with a [`ReadyToken`]; until it is spent the decoupler
/// delivers nothing else.
pub trait DesiredRateEventListener<T>: Send + Sync + 'static {
    fn desired_rate_event(
        &self,
        event: DesiredRateEvent<T>,
        ready: ReadyToken,
    );
}

impl<T, F> DesiredRateEventListener<T> for F
where F: Fn(DesiredRateEvent<T>, ReadyToken) + Send + Sync + 'static
{
    fn desired_rate_event(
        &self,
        event: DesiredRateEvent<T>,
        ready: ReadyToken,
    ) {
        self(event, ready)
    }
}

/// Type-erased view of a decoupler used by producers and ready tokens.
pub(crate) trait DecouplerControl: Send + Sync {
    fn signal(
        &self,
        signal: Signal,
    );

    fn ready(
        &self,
        cycle: u64,
    ) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Proof that the listener holds the event of `cycle`.
///
/// Holds no strong reference: once the subscription is gone, spending the
/// token is a no-op.
pub struct ReadyToken {
    cycle: u64,
    control: Weak<dyn DecouplerControl>,
}

impl ReadyToken {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Tells the decoupler the consumer can take the next event.
    pub fn ready_for_next_event(self) -> Result<()> {
        match self.control.upgrade() {
            Some(control) => control.ready(self.cycle),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ReadyToken {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ReadyToken").field("cycle", &self.cycle).finish()
    }
}

/// Producer-side signalling endpoint.
///
/// Cheap to clone and safe to call from any thread; every method returns
/// immediately and does nothing once the subscription is closed.
#[derive(Clone)]
pub struct DecouplerHandle {
    control: Weak<dyn DecouplerControl>,
}

impl DecouplerHandle {
    fn signal(
        &self,
        signal: Signal,
    ) {
        if let Some(control) = self.control.upgrade() {
            control.signal(signal);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.control.upgrade().map_or(true, |c| c.is_closed())
    }

    pub fn new_value_event(&self) {
        self.signal(Signal::Value)
    }

    pub fn new_read_connection_event(
        &self,
        connected: bool,
    ) {
        self.signal(Signal::ReadConnection(connected))
    }

    pub fn new_write_connection_event(
        &self,
        connected: bool,
    ) {
        self.signal(Signal::WriteConnection(connected))
    }

    pub fn new_read_exception_event(
        &self,
        error: ProducerError,
    ) {
        self.signal(Signal::ReadException(error))
    }

    pub fn new_write_exception_event(
        &self,
        error: ProducerError,
    ) {
        self.signal(Signal::WriteException(error))
    }

    pub fn new_write_succeeded_event(&self) {
        self.signal(Signal::WriteSucceeded)
    }

    pub fn new_write_failed_event(
        &self,
        error: ProducerError,
    ) {
        self.signal(Signal::WriteFailed(error))
    }
}

/// Decouples the source rate from the rate at which one consumer is notified.
///
/// At most one cycle (collector read plus delivery) is in flight. Signals
/// arriving meanwhile are coalesced into the next cycle, which starts as soon
/// as the listener spends its [`ReadyToken`] and, when capped, the minimum
/// period since the previous cycle has elapsed.
pub struct SourceDesiredRateDecoupler<T> {
    inner: Arc<DecouplerInner<T>>,
}

struct DecouplerInner<T> {
    id: String,
    this: Weak<DecouplerInner<T>>,
    state: Mutex<DecouplerState>,
    collector: Arc<dyn Collector<T>>,
    dispatch: Arc<dyn NotificationDispatch>,
    listener: Arc<dyn DesiredRateEventListener<T>>,
    runtime: Option<Handle>,
    shutdown_tx: watch::Sender<()>,
}

impl<T> SourceDesiredRateDecoupler<T>
where T: Send + 'static
{
    /// `runtime` drives rate-cap deferral and is required when `min_period`
    /// is set.
    pub fn new(
        id: impl Into<String>,
        collector: Arc<dyn Collector<T>>,
        dispatch: Arc<dyn NotificationDispatch>,
        listener: Arc<dyn DesiredRateEventListener<T>>,
        min_period: Option<Duration>,
        runtime: Option<Handle>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(());
        let inner = Arc::new_cyclic(|this| DecouplerInner {
            id: id.into(),
            this: this.clone(),
            state: Mutex::new(DecouplerState::new(min_period)),
            collector,
            dispatch,
            listener,
            runtime,
            shutdown_tx,
        });
        Self { inner }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn handle(&self) -> DecouplerHandle {
        let control: Weak<dyn DecouplerControl> = self.inner.this.clone();
        DecouplerHandle { control }
    }

    pub fn new_value_event(&self) {
        self.inner.signal(Signal::Value)
    }

    pub fn new_read_connection_event(
        &self,
        connected: bool,
    ) {
        self.inner.signal(Signal::ReadConnection(connected))
    }

    pub fn new_write_connection_event(
        &self,
        connected: bool,
    ) {
        self.inner.signal(Signal::WriteConnection(connected))
    }

    pub fn new_read_exception_event(
        &self,
        error: ProducerError,
    ) {
        self.inner.signal(Signal::ReadException(error))
    }

    pub fn new_write_exception_event(
        &self,
        error: ProducerError,
    ) {
        self.inner.signal(Signal::WriteException(error))
    }

    pub fn new_write_succeeded_event(&self) {
        self.inner.signal(Signal::WriteSucceeded)
    }

    pub fn new_write_failed_event(
        &self,
        error: ProducerError,
    ) {
        self.inner.signal(Signal::WriteFailed(error))
    }

    /// Consumer finished processing the event of `cycle`.
    ///
    /// A call that does not match the in-flight dispatch is a protocol
    /// violation: it is reported and the decoupler is closed.
    pub fn ready_for_next_event(
        &self,
        cycle: u64,
    ) -> Result<()> {
        self.inner.ready(cycle)
    }

    /// Stops scheduling new cycles; signals keep accumulating.
    pub fn pause(&self) {
        self.inner.state.lock().pause();
        debug!("[{}] paused", self.inner.id);
    }

    pub fn resume(&self) {
        let transition = self.inner.state.lock().resume(Instant::now());
        debug!("[{}] resumed: {:?}", self.inner.id, transition);
        self.inner.apply(transition);
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().is_paused()
    }

    /// Idempotent. An event already handed to the listener completes; nothing
    /// is scheduled afterwards.
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().is_closed()
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.inner.state.lock().phase()
    }
}

impl<T> DecouplerInner<T>
where T: Send + 'static
{
    fn apply(
        &self,
        transition: Transition,
    ) {
        match transition {
            Transition::Schedule { cycle, delay } => self.schedule_cycle(cycle, delay),
            Transition::Coalesced => {
                COALESCED_SIGNALS.with_label_values(&[&self.id]).inc();
            }
            Transition::Held | Transition::Ignored | Transition::Idle => {}
        }
    }

    fn schedule_cycle(
        &self,
        cycle: u64,
        delay: Duration,
    ) {
        if delay.is_zero() {
            debug!("[{}] scheduling cycle {}", self.id, cycle);
            self.submit_cycle(cycle);
            return;
        }

        RATE_CAP_DEFERRAL_MS
            .with_label_values(&[&self.id])
            .observe(delay.as_secs_f64() * 1000.0);
        let Some(runtime) = self.runtime.as_ref() else {
            warn!(
                "[{}] no runtime to defer cycle {} by {:?}, running now",
                self.id, cycle, delay
            );
            self.submit_cycle(cycle);
            return;
        };

        debug!("[{}] deferring cycle {} by {:?}", self.id, cycle, delay);
        let this = self.this.clone();
        let mut shutdown_signal = self.shutdown_tx.subscribe();
        runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_signal.changed() => {
                    trace!("deferred cycle {} cancelled by close", cycle);
                    return;
                }
            }
            if let Some(inner) = this.upgrade() {
                inner.submit_cycle(cycle);
            }
        });
    }

    fn submit_cycle(
        &self,
        cycle: u64,
    ) {
        let this = self.this.clone();
        let submitted = self.dispatch.submit(Box::new(move || {
            if let Some(inner) = this.upgrade() {
                inner.run_cycle(cycle);
            }
        }));
        if let Err(e) = submitted {
            error!("[{}] could not submit cycle {}: {}", self.id, cycle, e);
            self.close();
        }
    }

    /// Runs on the notification dispatch.
    fn run_cycle(
        &self,
        cycle: u64,
    ) {
        let snapshot = self.state.lock().begin_cycle(cycle, Instant::now());
        let Some(snapshot) = snapshot else {
            trace!("[{}] cycle {} dropped", self.id, cycle);
            return;
        };

        // state lock released: the buffer lock is never taken under it
        let values = self.collector.read();
        let event = DesiredRateEvent::classify(cycle, snapshot, values);

        if event.types().is_empty() {
            trace!("[{}] cycle {} had nothing to deliver", self.id, cycle);
            let transition = self.state.lock().skip_cycle(cycle, Instant::now());
            self.apply(transition);
            return;
        }

        if !self.state.lock().mark_dispatched(cycle) {
            return;
        }
        trace!(
            "[{}] delivering cycle {}: {:?} with {} values",
            self.id,
            cycle,
            event.types(),
            event.values().len()
        );
        DISPATCHED_EVENTS.with_label_values(&[&self.id]).inc();

        let control: Weak<dyn DecouplerControl> = self.this.clone();
        self.listener
            .desired_rate_event(event, ReadyToken { cycle, control });
    }

    fn close(&self) {
        if self.state.lock().close() {
            let _ = self.shutdown_tx.send(());
            debug!("[{}] closed", self.id);
        }
    }
}

impl<T> DecouplerControl for DecouplerInner<T>
where T: Send + 'static
{
    fn signal(
        &self,
        signal: Signal,
    ) {
        if matches!(
            signal,
            Signal::ReadException(_) | Signal::WriteException(_) | Signal::WriteFailed(_)
        ) {
            PRODUCER_ERRORS.with_label_values(&[&self.id]).inc();
        }
        trace!("[{}] signal {:?}", self.id, signal);
        let transition = self.state.lock().signal(signal, Instant::now());
        self.apply(transition);
    }

    fn ready(
        &self,
        cycle: u64,
    ) -> Result<()> {
        let result = self.state.lock().ready(cycle, Instant::now());
        match result {
            Ok(transition) => {
                self.apply(transition);
                Ok(())
            }
            Err(violation) => {
                error!("[{}] protocol violation: {}", self.id, violation);
                PROTOCOL_VIOLATIONS.with_label_values(&[&self.id]).inc();
                self.close();
                Err(Error::Protocol(violation))
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().is_closed()
    }
}
