//! Rate decoupler: turns source-rate signals into consumer-rate events.
//!
//! Data flow for one subscription:
//! producer -> `Collector::write` -> [`DecouplerHandle`] signal -> state machine
//! -> cycle on the [`NotificationDispatch`](crate::NotificationDispatch)
//! -> `Collector::read` -> listener -> [`ReadyToken`] -> next cycle.

mod event;
mod rate_decoupler;
mod state;

pub use event::*;
pub use rate_decoupler::*;
pub(crate) use state::*;

#[cfg(test)]
mod state_test;
