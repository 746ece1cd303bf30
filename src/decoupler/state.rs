//! Scheduling state of one decoupler, free of threads and timers.
//!
//! Every method takes the current instant and returns what the caller must
//! do next, so the runtime wrapper only has to carry out transitions.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;

use super::CycleSnapshot;
use super::EventType;
use crate::ProducerError;
use crate::ProtocolViolation;

/// Write-side occurrences observed by the decoupler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal {
    Value,
    ReadConnection(bool),
    WriteConnection(bool),
    ReadException(ProducerError),
    WriteException(ProducerError),
    WriteSucceeded,
    WriteFailed(ProducerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    /// A cycle is queued (possibly deferred by the rate cap) but has not read yet
    Scheduled { cycle: u64 },
    /// The cycle has read; `dispatched` once the listener holds the event
    InFlight { cycle: u64, dispatched: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Run `cycle` after `delay`
    Schedule { cycle: u64, delay: Duration },
    /// Merged into the in-flight cycle
    Coalesced,
    /// Kept pending until resume
    Held,
    /// Decoupler is closed
    Ignored,
    /// Nothing left to do
    Idle,
}

#[derive(Debug)]
pub(crate) struct DecouplerState {
    phase: Phase,
    event_while_busy: bool,
    paused: bool,
    closed: bool,
    pending: BTreeSet<EventType>,
    read_error: Option<ProducerError>,
    write_error: Option<ProducerError>,
    read_connected: bool,
    write_connected: bool,
    next_cycle: u64,
    /// Read instant of the cycle in flight
    cycle_started_at: Option<Instant>,
    /// Read instant of the last cycle that reached the listener
    last_dispatch_at: Option<Instant>,
    min_period: Option<Duration>,
}

impl DecouplerState {
    pub(crate) fn new(min_period: Option<Duration>) -> Self {
        Self {
            phase: Phase::Idle,
            event_while_busy: false,
            paused: false,
            closed: false,
            pending: BTreeSet::new(),
            read_error: None,
            write_error: None,
            read_connected: false,
            write_connected: false,
            next_cycle: 1,
            cycle_started_at: None,
            last_dispatch_at: None,
            min_period,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    #[cfg(test)]
    pub(crate) fn event_while_busy(&self) -> bool {
        self.event_while_busy
    }

    pub(crate) fn signal(
        &mut self,
        signal: Signal,
        now: Instant,
    ) -> Transition {
        if self.closed {
            return Transition::Ignored;
        }
        self.record(signal);

        match self.phase {
            Phase::Idle if self.paused => Transition::Held,
            Phase::Idle => self.schedule(now),
            Phase::Scheduled { .. } | Phase::InFlight { .. } => {
                self.event_while_busy = true;
                Transition::Coalesced
            }
        }
    }

    fn record(
        &mut self,
        signal: Signal,
    ) {
        match signal {
            Signal::Value => {
                self.pending.insert(EventType::Value);
            }
            Signal::ReadConnection(connected) => {
                if self.read_connected != connected {
                    self.read_connected = connected;
                    self.pending.insert(EventType::ReadConnection);
                }
            }
            Signal::WriteConnection(connected) => {
                if self.write_connected != connected {
                    self.write_connected = connected;
                    self.pending.insert(EventType::WriteConnection);
                }
            }
            Signal::ReadException(e) => {
                self.read_error = Some(e);
                self.pending.insert(EventType::ReadException);
            }
            Signal::WriteException(e) => {
                self.write_error = Some(e);
                self.pending.insert(EventType::WriteException);
            }
            Signal::WriteSucceeded => {
                self.pending.insert(EventType::WriteSucceeded);
            }
            Signal::WriteFailed(e) => {
                self.write_error = Some(e);
                self.pending.insert(EventType::WriteFailed);
            }
        }
    }

    fn schedule(
        &mut self,
        now: Instant,
    ) -> Transition {
        let cycle = self.next_cycle;
        self.next_cycle += 1;
        self.phase = Phase::Scheduled { cycle };

        let delay = match (self.min_period, self.last_dispatch_at) {
            (Some(period), Some(last)) => (last + period).saturating_duration_since(now),
            _ => Duration::ZERO,
        };
        Transition::Schedule { cycle, delay }
    }

    /// Starts the read of a scheduled cycle and hands over everything pending.
    ///
    /// Returns `None` when the cycle is stale or the decoupler is closed.
    pub(crate) fn begin_cycle(
        &mut self,
        cycle: u64,
        now: Instant,
    ) -> Option<CycleSnapshot> {
        if self.closed {
            self.phase = Phase::Idle;
            return None;
        }
        if self.phase != (Phase::Scheduled { cycle }) {
            return None;
        }
        self.phase = Phase::InFlight {
            cycle,
            dispatched: false,
        };
        // the upcoming read covers every signal seen so far
        self.event_while_busy = false;
        self.cycle_started_at = Some(now);

        Some(CycleSnapshot {
            types: std::mem::take(&mut self.pending),
            read_connected: self.read_connected,
            write_connected: self.write_connected,
            read_error: self.read_error.take(),
            write_error: self.write_error.take(),
        })
    }

    pub(crate) fn mark_dispatched(
        &mut self,
        cycle: u64,
    ) -> bool {
        match self.phase {
            Phase::InFlight { cycle: c, .. } if c == cycle => {
                self.phase = Phase::InFlight {
                    cycle,
                    dispatched: true,
                };
                // skipped cycles never move the rate cap window
                if let Some(started) = self.cycle_started_at.take() {
                    self.last_dispatch_at = Some(started);
                }
                true
            }
            _ => false,
        }
    }

    /// Consumer finished with `cycle`.
    pub(crate) fn ready(
        &mut self,
        cycle: u64,
        now: Instant,
    ) -> Result<Transition, ProtocolViolation> {
        match self.phase {
            Phase::Idle => Err(ProtocolViolation::ReadyWhileIdle { cycle }),
            Phase::Scheduled { cycle: expected } if expected != cycle => {
                Err(ProtocolViolation::CycleMismatch {
                    expected,
                    received: cycle,
                })
            }
            Phase::Scheduled { .. } => Err(ProtocolViolation::NotDispatched { cycle }),
            Phase::InFlight { cycle: expected, .. } if expected != cycle => {
                Err(ProtocolViolation::CycleMismatch {
                    expected,
                    received: cycle,
                })
            }
            Phase::InFlight {
                dispatched: false, ..
            } => Err(ProtocolViolation::NotDispatched { cycle }),
            Phase::InFlight { .. } => Ok(self.finish_cycle(now)),
        }
    }

    /// Ends a cycle that had nothing to deliver.
    pub(crate) fn skip_cycle(
        &mut self,
        cycle: u64,
        now: Instant,
    ) -> Transition {
        match self.phase {
            Phase::InFlight { cycle: c, .. } if c == cycle => self.finish_cycle(now),
            _ => Transition::Idle,
        }
    }

    fn finish_cycle(
        &mut self,
        now: Instant,
    ) -> Transition {
        self.phase = Phase::Idle;
        self.cycle_started_at = None;
        if self.closed {
            return Transition::Ignored;
        }
        if self.event_while_busy && !self.paused {
            self.event_while_busy = false;
            return self.schedule(now);
        }
        Transition::Idle
    }

    pub(crate) fn pause(&mut self) {
        self.paused = true;
    }

    pub(crate) fn resume(
        &mut self,
        now: Instant,
    ) -> Transition {
        self.paused = false;
        if self.closed {
            return Transition::Ignored;
        }
        if self.phase == Phase::Idle && (self.event_while_busy || !self.pending.is_empty()) {
            self.event_while_busy = false;
            return self.schedule(now);
        }
        Transition::Idle
    }

    /// Returns `true` the first time only.
    pub(crate) fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.pending.clear();
        self.event_while_busy = false;
        if let Phase::Scheduled { .. } = self.phase {
            self.phase = Phase::Idle;
        }
        true
    }
}
