use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use super::run_guarded;
use super::DispatchTask;
use super::NotificationDispatch;
use crate::Error;
use crate::Result;

/// Delivers notifications from a single task on a tokio runtime.
///
/// Callbacks run inside the runtime, so they should not block.
pub struct TokioDispatch {
    tx: mpsc::UnboundedSender<DispatchTask>,
}

impl TokioDispatch {
    pub fn spawn(
        name: impl Into<String>,
        runtime: &Handle,
    ) -> Self {
        let name = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<DispatchTask>();
        runtime.spawn(async move {
            while let Some(task) = rx.recv().await {
                run_guarded(&name, task);
            }
            debug!("[{}] dispatch task stopped", name);
        });
        Self { tx }
    }

    /// Spawns on the runtime the caller is running in.
    pub fn current(name: impl Into<String>) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Dispatch(format!("no tokio runtime available: {}", e)))?;
        Ok(Self::spawn(name, &runtime))
    }
}

impl NotificationDispatch for TokioDispatch {
    fn submit(
        &self,
        task: DispatchTask,
    ) -> Result<()> {
        self.tx
            .send(task)
            .map_err(|_| Error::Dispatch("dispatch task has stopped".to_string()))
    }
}
