use std::collections::BTreeSet;

use crate::ProducerError;

/// What happened since the previous notification.
///
/// Not exhaustive: new kinds may be added as sources grow richer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum EventType {
    ReadConnection,
    WriteConnection,
    Value,
    ReadException,
    WriteException,
    WriteSucceeded,
    WriteFailed,
}

/// Unit delivered to the consumer: the event types of one cycle plus the
/// batch read from the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredRateEvent<T> {
    pub(crate) cycle: u64,
    pub(crate) types: Vec<EventType>,
    pub(crate) values: Vec<T>,
    pub(crate) read_connected: bool,
    pub(crate) write_connected: bool,
    pub(crate) read_error: Option<ProducerError>,
    pub(crate) write_error: Option<ProducerError>,
}

impl<T> DesiredRateEvent<T> {
    /// Classifies one cycle.
    ///
    /// `Value` is kept only when a value signal was pending and the batch is
    /// non-empty; every other pending type is kept as is.
    pub(crate) fn classify(
        cycle: u64,
        snapshot: CycleSnapshot,
        values: Vec<T>,
    ) -> Self {
        let mut types = snapshot.types;
        if values.is_empty() {
            types.remove(&EventType::Value);
        }
        Self {
            cycle,
            types: types.into_iter().collect(),
            values,
            read_connected: snapshot.read_connected,
            write_connected: snapshot.write_connected,
            read_error: snapshot.read_error,
            write_error: snapshot.write_error,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Event types in canonical order.
    pub fn types(&self) -> &[EventType] {
        &self.types
    }

    pub fn has(
        &self,
        event_type: EventType,
    ) -> bool {
        self.types.contains(&event_type)
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Most recent value of the batch.
    pub fn latest(&self) -> Option<&T> {
        self.values.last()
    }

    pub fn is_read_connected(&self) -> bool {
        self.read_connected
    }

    pub fn is_write_connected(&self) -> bool {
        self.write_connected
    }

    pub fn read_error(&self) -> Option<&ProducerError> {
        self.read_error.as_ref()
    }

    pub fn write_error(&self) -> Option<&ProducerError> {
        self.write_error.as_ref()
    }
}

/// What the state machine hands over when a cycle starts.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct CycleSnapshot {
    pub(crate) types: BTreeSet<EventType>,
    pub(crate) read_connected: bool,
    pub(crate) write_connected: bool,
    pub(crate) read_error: Option<ProducerError>,
    pub(crate) write_error: Option<ProducerError>,
}
