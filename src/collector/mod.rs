//! Collectors: the point where producer rate and consumer rate are decoupled.
//!
//! A collector is written from any number of producer threads and read by a
//! single decoupler. Each variant owns its buffer behind its own lock; the
//! lock is held only for the append or the drain, never across a callback.

mod latest_value;
mod queue;
mod source;
mod time_window;

pub use latest_value::*;
pub use queue::*;
pub use source::*;
pub use time_window::*;


use std::sync::Arc;

use config::ConfigError;

use crate::type_support;
use crate::BufferPolicy;
use crate::Error;
use crate::Result;
use crate::TimeDuration;

pub trait Collector<T>: Send + Sync + 'static {
    /// Stores `value` according to the buffering policy.
    ///
    /// `None` is ignored. Returns whether anything was stored, so the caller
    /// knows whether to signal the decoupler.
    fn write(
        &self,
        value: Option<T>,
    ) -> bool;

    /// Returns the batch accumulated since the previous read.
    ///
    /// Only the owning decoupler calls this, never concurrently with itself.
    fn read(&self) -> Vec<T>;
}

/// Builds the collector variant selected by `policy`.
///
/// The time window variant needs timestamp support for `T`; see
/// [`type_support::install`].
pub fn collector_for<T>(policy: &BufferPolicy) -> Result<Arc<dyn Collector<T>>>
where T: Clone + Send + Sync + 'static {
    policy.validate()?;
    let collector: Arc<dyn Collector<T>> = match *policy {
        BufferPolicy::Latest => Arc::new(LatestValueCollector::new()),
        BufferPolicy::Queue { capacity } => Arc::new(QueueCollector::new(capacity)),
        BufferPolicy::TimeWindow { window_ms } => {
            let extractor = type_support::extractor_for::<T>().ok_or_else(|| {
                Error::Config(ConfigError::Message(format!(
                    "no timestamp support installed for {}",
                    std::any::type_name::<T>()
                )))
            })?;
            Arc::new(TimeWindowCollector::with_extractor(
                TimeDuration::from_millis(window_ms as i64),
                extractor,
            ))
        }
    };
    Ok(collector)
}
