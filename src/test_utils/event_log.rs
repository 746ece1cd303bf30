use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Condvar;
use parking_lot::Mutex;
use tracing::info;

use crate::DesiredRateEvent;
use crate::DesiredRateEventListener;
use crate::EventType;
use crate::ReadyToken;
use crate::Result;
use crate::Timestamp;

/// Records every event with the wall-clock time it arrived.
///
/// In automatic mode the log spends the ready token right after recording
/// (optionally after a pause, to simulate a slow consumer). In manual mode
/// tokens are parked until the test calls [`DesiredRateEventLog::release_next`].
pub struct DesiredRateEventLog<T> {
    inner: Mutex<LogInner<T>>,
    arrived: Condvar,
    pause: Option<Duration>,
    manual: bool,
}

struct LogInner<T> {
    events: Vec<DesiredRateEvent<T>>,
    timestamps: Vec<Timestamp>,
    parked: VecDeque<ReadyToken>,
    ready_errors: Vec<crate::Error>,
}

impl<T> DesiredRateEventLog<T> {
    pub fn new() -> Self {
        Self::build(None, false)
    }

    pub fn with_pause(pause: Duration) -> Self {
        Self::build(Some(pause), false)
    }

    pub fn manual() -> Self {
        Self::build(None, true)
    }

    fn build(
        pause: Option<Duration>,
        manual: bool,
    ) -> Self {
        Self {
            inner: Mutex::new(LogInner {
                events: Vec::new(),
                timestamps: Vec::new(),
                parked: VecDeque::new(),
                ready_errors: Vec::new(),
            }),
            arrived: Condvar::new(),
            pause,
            manual,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn event_types(
        &self,
        n: usize,
    ) -> Vec<EventType> {
        self.inner.lock().events[n].types().to_vec()
    }

    pub fn cycles(&self) -> Vec<u64> {
        self.inner.lock().events.iter().map(|e| e.cycle()).collect()
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.inner.lock().timestamps.clone()
    }

    pub fn parked(&self) -> usize {
        self.inner.lock().parked.len()
    }

    pub fn ready_errors(&self) -> usize {
        self.inner.lock().ready_errors.len()
    }

    /// Spends the oldest parked token.
    pub fn release_next(&self) -> Option<Result<()>> {
        let token = self.inner.lock().parked.pop_front();
        token.map(|t| t.ready_for_next_event())
    }

    /// Blocks until at least `n` events were recorded or `timeout` elapsed.
    pub fn wait_for_events(
        &self,
        n: usize,
        timeout: Duration,
    ) -> bool {
        let mut inner = self.inner.lock();
        let deadline = std::time::Instant::now() + timeout;
        while inner.events.len() < n {
            if self.arrived.wait_until(&mut inner, deadline).timed_out() {
                return inner.events.len() >= n;
            }
        }
        true
    }

    pub fn print_log(&self) {
        let inner = self.inner.lock();
        for (event, ts) in inner.events.iter().zip(inner.timestamps.iter()) {
            info!("{} cycle={} {:?}", ts, event.cycle(), event.types());
        }
    }
}

impl<T: Clone> DesiredRateEventLog<T> {
    pub fn events(&self) -> Vec<DesiredRateEvent<T>> {
        self.inner.lock().events.clone()
    }

    /// All delivered values, in delivery order.
    pub fn values(&self) -> Vec<T> {
        self.inner
            .lock()
            .events
            .iter()
            .flat_map(|e| e.values().iter().cloned())
            .collect()
    }
}

impl<T> DesiredRateEventListener<T> for DesiredRateEventLog<T>
where T: Send + 'static
{
    fn desired_rate_event(
        &self,
        event: DesiredRateEvent<T>,
        ready: ReadyToken,
    ) {
        {
            let mut inner = self.inner.lock();
            inner.events.push(event);
            inner.timestamps.push(Timestamp::now());
            if self.manual {
                inner.parked.push_back(ready);
                self.arrived.notify_all();
                return;
            }
        }
        if let Some(pause) = self.pause {
            std::thread::sleep(pause);
        }
        let result = ready.ready_for_next_event();

        let mut inner = self.inner.lock();
        if let Err(e) = result {
            inner.ready_errors.push(e);
        }
        self.arrived.notify_all();
    }
}
