//! Fluent construction of a [`Subscription`].
//!
//! Unset collaborators fall back to defaults:
//! - collector: chosen from the configured [`BufferPolicy`]
//! - dispatch: a dedicated [`WorkerDispatch`] thread per subscription
//! - runtime: the tokio runtime the caller runs in, if any
//!
//! ## Example
//! ```ignore
//! let (subscription, source) = SubscriptionBuilder::<f64>::new()?
//!     .name("temperature")
//!     .max_rate(TimeDuration::from_millis(100))
//!     .build(Arc::new(|event: DesiredRateEvent<f64>, ready: ReadyToken| {
//!         println!("{:?}", event.latest());
//!         let _ = ready.ready_for_next_event();
//!     }))?;
//! source.write(Some(21.5));
//! ```

use std::sync::Arc;

use config::ConfigError;
use nanoid::nanoid;
use tokio::runtime::Handle;
use tracing::debug;
use tracing::info;

use super::SourceHandle;
use super::Subscription;
use crate::collector_for;
use crate::type_support;
use crate::BufferPolicy;
use crate::Collector;
use crate::DecouplerConfig;
use crate::DesiredRateEventListener;
use crate::Error;
use crate::NotificationDispatch;
use crate::ReadFunction;
use crate::Result;
use crate::SourceCollector;
use crate::SourceDesiredRateDecoupler;
use crate::TimeDuration;
use crate::WorkerDispatch;

pub struct SubscriptionBuilder<T> {
    pub(super) name: Option<String>,
    pub(super) config: DecouplerConfig,
    pub(super) max_rate: Option<TimeDuration>,
    pub(super) collector: Option<Arc<dyn Collector<T>>>,
    pub(super) function: Option<Arc<dyn ReadFunction<T>>>,
    pub(super) dispatch: Option<Arc<dyn NotificationDispatch>>,
    pub(super) runtime: Option<Handle>,
}

impl<T> SubscriptionBuilder<T>
where T: Clone + Send + Sync + 'static
{
    /// Starts from configuration loaded from `CONFIG_PATH` and `PVFLOW__*`
    /// environment variables.
    pub fn new() -> Result<Self> {
        Ok(Self::from_config(DecouplerConfig::new()?))
    }

    /// Starts from an in-memory configuration.
    pub fn from_config(config: DecouplerConfig) -> Self {
        Self {
            name: None,
            config,
            max_rate: None,
            collector: None,
            function: None,
            dispatch: None,
            runtime: None,
        }
    }

    /// Identifier used in logs and metric labels. Random when unset.
    pub fn name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn config(
        mut self,
        config: DecouplerConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Overrides the configured rate cap; checked by [`Self::build`].
    pub fn max_rate(
        mut self,
        period: TimeDuration,
    ) -> Self {
        self.max_rate = Some(period);
        self
    }

    pub fn buffer(
        mut self,
        buffer: BufferPolicy,
    ) -> Self {
        self.config = self.config.with_buffer(buffer);
        self
    }

    /// Replaces the collector derived from the buffer policy
    pub fn collector(
        mut self,
        collector: Arc<dyn Collector<T>>,
    ) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Function invoked by [`SourceHandle::collect`]
    pub fn read_function(
        mut self,
        function: Arc<dyn ReadFunction<T>>,
    ) -> Self {
        self.function = Some(function);
        self
    }

    pub fn dispatch(
        mut self,
        dispatch: Arc<dyn NotificationDispatch>,
    ) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Runtime driving rate-cap timers
    pub fn runtime(
        mut self,
        runtime: Handle,
    ) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validates the configuration and assembles the subscription.
    ///
    /// # Errors
    /// - `Error::Config` for an invalid configuration, a rate cap that is not a
    ///   whole number of milliseconds, a time window over a type without
    ///   timestamp support, or a rate cap with no tokio runtime
    /// - `Error::Dispatch` when the default worker thread cannot be spawned
    pub fn build(
        self,
        listener: Arc<dyn DesiredRateEventListener<T>>,
    ) -> Result<(Subscription<T>, SourceHandle<T>)> {
        let config = match self.max_rate {
            Some(period) => self.config.with_max_rate(period)?,
            None => self.config,
        }
        .validate()?;
        type_support::install_basic();

        let id = self.name.unwrap_or_else(|| format!("sub-{}", nanoid!(8)));

        let collector = match self.collector {
            Some(collector) => collector,
            None => collector_for::<T>(&config.buffer)?,
        };

        let min_period = config.min_period().and_then(|p| p.to_std());
        let runtime = self.runtime.or_else(|| Handle::try_current().ok());
        if min_period.is_some() && runtime.is_none() {
            return Err(Error::Config(ConfigError::Message(format!(
                "subscription {} is rate capped but no tokio runtime is available",
                id
            ))));
        }

        let dispatch: Arc<dyn NotificationDispatch> = match self.dispatch {
            Some(dispatch) => dispatch,
            None => {
                debug!("[{}] using a dedicated dispatch worker", id);
                Arc::new(WorkerDispatch::new(format!("pvflow-{}", id))?)
            }
        };

        let source = self
            .function
            .map(|function| Arc::new(SourceCollector::new(function, collector.clone())));

        let decoupler = SourceDesiredRateDecoupler::new(
            id.clone(),
            collector.clone(),
            dispatch,
            listener,
            min_period,
            runtime,
        );

        let handle = SourceHandle::new(
            Arc::downgrade(&collector),
            source.as_ref().map(Arc::downgrade),
            decoupler.handle(),
        );
        info!("[{}] subscription established: {:?}", id, config);

        Ok((
            Subscription::new(config, decoupler, collector, source),
            handle,
        ))
    }
}
