//! Rate Decoupling Engine Error Hierarchy
//!
//! Errors are grouped by where they originate:
//! - producer side failures, which are folded into events and never cross
//!   back into the producer thread
//! - consumer protocol violations, fatal to one subscription
//! - configuration failures, raised before any thread starts

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid capacity, window or rate at setup time
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Consumer broke the ready-for-next-event contract
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    /// Read function failed while computing a value
    #[error(transparent)]
    Producer(#[from] ProducerError),

    /// Arithmetic on temporal primitives
    #[error(transparent)]
    Division(#[from] DivisionError),

    /// Notification dispatch refused a callback (executor shut down)
    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    /// Unrecoverable failures
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Failure raised by a read or write function on the producer side.
///
/// Cloneable so the same failure can be carried by the event and kept as the
/// "last error" of the subscription.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProducerError {
    #[error("Read function failed: {0}")]
    ReadFailed(String),

    #[error("Write function failed: {0}")]
    WriteFailed(String),

    #[error("Source disconnected: {0}")]
    Disconnected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// `ready_for_next_event` arrived while nothing was dispatched
    #[error("Ready signal for cycle {cycle} received while decoupler is idle")]
    ReadyWhileIdle { cycle: u64 },

    /// `ready_for_next_event` arrived for a cycle other than the in-flight one
    #[error("Ready signal for cycle {received} does not match in-flight cycle {expected}")]
    CycleMismatch { expected: u64, received: u64 },

    /// `ready_for_next_event` arrived before the cycle was handed to the listener
    #[error("Ready signal for cycle {cycle} received before dispatch")]
    NotDispatched { cycle: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DivisionError {
    #[error("Cannot divide duration of {nanos}ns by zero")]
    DivideByZero { nanos: i64 },
}
