//! Rate decoupling and buffering for process-variable monitoring.
//!
//! Producers write as fast and as bursty as they like; each consumer receives
//! coalesced [`DesiredRateEvent`]s no faster than it can process them, and
//! optionally no faster than a configured rate cap.

mod collector;
mod config;
mod decoupler;
mod dispatch;
mod errors;
mod function;
pub mod metrics;
mod subscription;
mod time;
pub mod type_support;

pub use collector::*;
pub use config::*;
pub use decoupler::*;
pub use dispatch::*;
pub use errors::*;
pub use function::*;
pub use subscription::*;
pub use time::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
