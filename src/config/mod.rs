//! Configuration management for subscriptions.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
mod buffer;
pub use buffer::*;

use std::env;
use std::fmt::Debug;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::TimeDuration;
use crate::time::NANOS_PER_MILLI;

pub(crate) const ENV_PREFIX: &str = "PVFLOW";

/// Options recognised when a subscription is established.
///
/// Combines all settings with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables prefixed `PVFLOW__` (highest priority)
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct DecouplerConfig {
    /// Minimum period between two notifications, in milliseconds.
    /// `None` delivers as fast as the consumer keeps up.
    #[serde(default)]
    pub max_rate_ms: Option<u64>,

    /// Buffering policy of the collector feeding the decoupler
    #[serde(default)]
    pub buffer: BufferPolicy,
}

impl Debug for DecouplerConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("DecouplerConfig")
            .field("max_rate_ms", &self.max_rate_ms)
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl DecouplerConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `PVFLOW__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so further overrides can be applied via
    /// `with_override_config()`. Callers MUST call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("PVFLOW__MAX_RATE_MS", "100");
    /// let cfg = DecouplerConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Shortcut for programmatic setup.
    ///
    /// # Errors
    /// `Error::Config` when `period` is not a positive whole number of
    /// milliseconds, the granularity the configuration is kept in.
    pub fn with_max_rate(
        mut self,
        period: TimeDuration,
    ) -> Result<Self> {
        self.max_rate_ms = Some(whole_millis("max rate", period)?);
        Ok(self)
    }

    pub fn with_buffer(
        mut self,
        buffer: BufferPolicy,
    ) -> Self {
        self.buffer = buffer;
        self
    }

    /// Validates configuration and returns validated instance.
    ///
    /// # Errors
    /// - `max_rate_ms` set to zero
    /// - queue capacity of zero
    /// - time window of zero length
    pub fn validate(self) -> Result<Self> {
        if self.max_rate_ms == Some(0) {
            return Err(Error::Config(ConfigError::Message(
                "max_rate_ms must be greater than 0 when set".into(),
            )));
        }
        self.buffer.validate()?;
        Ok(self)
    }

    /// Minimum inter-notification period, if capped.
    pub fn min_period(&self) -> Option<TimeDuration> {
        self.max_rate_ms
            .map(|ms| TimeDuration::from_millis(ms as i64))
    }
}

/// Converts `duration` to milliseconds, refusing to round.
pub(crate) fn whole_millis(
    what: &str,
    duration: TimeDuration,
) -> Result<u64> {
    let nanos = duration.as_nanos();
    if nanos <= 0 || nanos % NANOS_PER_MILLI != 0 {
        return Err(Error::Config(ConfigError::Message(format!(
            "{} must be a positive whole number of milliseconds, got {}",
            what, duration
        ))));
    }
    Ok((nanos / NANOS_PER_MILLI) as u64)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
