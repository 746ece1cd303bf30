//! Process-wide type support registry.
//!
//! Time-windowed buffering needs to know the producer timestamp carried by a
//! value. Integrators register an extractor per payload type; the basic set
//! is installed through [`install_basic`], which configuration code calls
//! explicitly. Installation is idempotent and safe to race from any thread.

use std::any::Any;
use std::any::TypeId;
use std::sync::Arc;
use std::sync::Once;

use dashmap::DashMap;
use lazy_static::lazy_static;
use tracing::debug;

use crate::Timestamp;

pub type TimestampExtractor<T> = Arc<dyn Fn(&T) -> Option<Timestamp> + Send + Sync>;

lazy_static! {
    static ref TIMESTAMP_SUPPORT: DashMap<TypeId, Arc<dyn Any + Send + Sync>> = DashMap::new();
}

static BASIC_SUPPORT: Once = Once::new();

/// A value paired with the timestamp its producer assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamped<T> {
    pub value: T,
    pub timestamp: Timestamp,
}

impl<T> Timestamped<T> {
    pub fn new(
        value: T,
        timestamp: Timestamp,
    ) -> Self {
        Self { value, timestamp }
    }

    /// Stamps `value` with the current wall-clock time.
    pub fn now(value: T) -> Self {
        Self::new(value, Timestamp::now())
    }
}

/// Registers (or replaces) the timestamp extractor for `T`.
pub fn install<T, F>(extractor: F)
where
    T: 'static,
    F: Fn(&T) -> Option<Timestamp> + Send + Sync + 'static,
{
    let extractor: TimestampExtractor<T> = Arc::new(extractor);
    TIMESTAMP_SUPPORT.insert(TypeId::of::<T>(), Arc::new(extractor));
    debug!("installed timestamp support for {}", std::any::type_name::<T>());
}

/// Installs support for [`Timestamped`] over the primitive payloads.
///
/// Runs at most once per process no matter how many threads call it.
pub fn install_basic() {
    BASIC_SUPPORT.call_once(|| {
        install_timestamped::<f64>();
        install_timestamped::<f32>();
        install_timestamped::<i64>();
        install_timestamped::<i32>();
        install_timestamped::<String>();
        install_timestamped::<Vec<f64>>();
    });
}

fn install_timestamped<V: 'static>() {
    install::<Timestamped<V>, _>(|v| Some(v.timestamp));
}

pub fn extractor_for<T: 'static>() -> Option<TimestampExtractor<T>> {
    TIMESTAMP_SUPPORT
        .get(&TypeId::of::<T>())
        .and_then(|entry| entry.value().downcast_ref::<TimestampExtractor<T>>().cloned())
}

pub fn is_installed<T: 'static>() -> bool {
    TIMESTAMP_SUPPORT.contains_key(&TypeId::of::<T>())
}

pub fn timestamp_of<T: 'static>(value: &T) -> Option<Timestamp> {
    extractor_for::<T>().and_then(|extract| extract(value))
}
