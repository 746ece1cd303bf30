//! Serial executors on which notifications are delivered.
//!
//! The engine only relies on [`NotificationDispatch::submit`]: each task runs
//! exactly once, in submission order, one at a time. Integrators can plug a
//! UI loop or actor mailbox; two executors ship with the crate.

mod tokio_dispatch;
mod worker;

pub use tokio_dispatch::*;
pub use worker::*;


use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;

#[cfg(test)]
use mockall::automock;
use tracing::error;

use crate::Result;

pub type DispatchTask = Box<dyn FnOnce() + Send + 'static>;

#[cfg_attr(test, automock)]
pub trait NotificationDispatch: Send + Sync + 'static {
    /// Queues `task`; must not wait for it to run.
    fn submit(
        &self,
        task: DispatchTask,
    ) -> Result<()>;
}

/// Runs a task, keeping the executor alive if it panics.
pub(crate) fn run_guarded(
    executor: &str,
    task: DispatchTask,
) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(task)) {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!("[{}] notification callback panicked: {}", executor, reason);
    }
}
