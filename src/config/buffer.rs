use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::TimeDuration;

/// Selects the collector variant sitting between producers and the decoupler.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BufferPolicy {
    /// Keep only the most recent value
    #[default]
    Latest,

    /// Keep up to `capacity` values, evicting the oldest when full
    Queue { capacity: usize },

    /// Keep every value whose producer timestamp lies within `window_ms`
    /// of the newest buffered value
    TimeWindow { window_ms: u64 },
}

impl BufferPolicy {
    pub fn queue(capacity: usize) -> Self {
        BufferPolicy::Queue { capacity }
    }

    /// # Errors
    /// `Error::Config` when `window` is not a positive whole number of
    /// milliseconds.
    pub fn time_window(window: TimeDuration) -> Result<Self> {
        Ok(BufferPolicy::TimeWindow {
            window_ms: super::whole_millis("time window", window)?,
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match *self {
            BufferPolicy::Latest => Ok(()),
            BufferPolicy::Queue { capacity } if capacity == 0 => Err(Error::Config(
                ConfigError::Message("queue capacity must be greater than 0".into()),
            )),
            BufferPolicy::TimeWindow { window_ms } if window_ms == 0 => Err(Error::Config(
                ConfigError::Message("time window must be greater than 0ms".into()),
            )),
            _ => Ok(()),
        }
    }
}
