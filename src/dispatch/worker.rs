use std::thread;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use super::run_guarded;
use super::DispatchTask;
use super::NotificationDispatch;
use crate::Error;
use crate::Result;

/// Delivers notifications on one dedicated OS thread.
///
/// The thread exits once [`WorkerDispatch::shutdown`] is called or the
/// dispatch is dropped, after draining tasks already queued.
pub struct WorkerDispatch {
    name: String,
    tx: Mutex<Option<mpsc::UnboundedSender<DispatchTask>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerDispatch {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<DispatchTask>();

        let thread_name = name.clone();
        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(task) = rx.blocking_recv() {
                    run_guarded(&thread_name, task);
                }
                debug!("[{}] dispatch worker stopped", thread_name);
            })
            .map_err(|e| Error::Dispatch(format!("failed to spawn {}: {}", name, e)))?;

        Ok(Self {
            name,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops accepting tasks and waits for queued ones to finish.
    ///
    /// Must not be called from a task running on this worker.
    pub fn shutdown(&self) {
        self.tx.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                warn!("[{}] shutdown called from its own worker, not joining", self.name);
                return;
            }
            if worker.join().is_err() {
                warn!("[{}] dispatch worker terminated abnormally", self.name);
            }
        }
    }
}

impl NotificationDispatch for WorkerDispatch {
    fn submit(
        &self,
        task: DispatchTask,
    ) -> Result<()> {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(Error::Dispatch(format!("{} is shut down", self.name)));
        };
        tx.send(task)
            .map_err(|_| Error::Dispatch(format!("{} worker has stopped", self.name)))
    }
}

impl Drop for WorkerDispatch {
    fn drop(&mut self) {
        // detach: the worker drains and exits once the sender is gone
        self.tx.get_mut().take();
    }
}
