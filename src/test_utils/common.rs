use std::sync::Arc;
use std::time::Duration;

use super::DesiredRateEventLog;
use crate::type_support::Timestamped;
use crate::Collector;
use crate::NotificationDispatch;
use crate::SourceDesiredRateDecoupler;
use crate::TimeDuration;
use crate::Timestamp;

/// Uncapped decoupler over `collector` delivering to `log` through `dispatch`.
pub(crate) fn decoupler_with<T>(
    collector: Arc<dyn Collector<T>>,
    dispatch: Arc<dyn NotificationDispatch>,
    log: Arc<DesiredRateEventLog<T>>,
) -> SourceDesiredRateDecoupler<T>
where
    T: Send + 'static,
{
    SourceDesiredRateDecoupler::new("test", collector, dispatch, log, None, None)
}

/// Samples spaced `step_ms` apart starting at `start`.
pub(crate) fn samples(
    start: Timestamp,
    step_ms: i64,
    values: &[f64],
) -> Vec<Timestamped<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            Timestamped::new(*v, start.plus(TimeDuration::from_millis(step_ms * i as i64)))
        })
        .collect()
}

/// Polls `condition` until it holds or `timeout` elapses.
pub(crate) fn eventually(
    timeout: Duration,
    condition: impl Fn() -> bool,
) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
