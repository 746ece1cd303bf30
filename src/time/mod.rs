//! Temporal primitives with nanosecond precision.
//!
//! All types are immutable `Copy` values; every operation returns a new value,
//! so they are safe to share across producer and consumer threads.

mod duration;
mod interval;
mod timestamp;

pub use duration::*;
pub use interval::*;
pub use timestamp::*;


pub(crate) const NANOS_PER_SEC: i64 = 1_000_000_000;
pub(crate) const NANOS_PER_MILLI: i64 = 1_000_000;
