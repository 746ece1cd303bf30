use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::DispatchTask;
use crate::NotificationDispatch;
use crate::Result;

/// Dispatch that only queues; tests decide when tasks run.
#[derive(Default)]
pub struct ManualDispatch {
    queue: Mutex<VecDeque<DispatchTask>>,
}

impl ManualDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Runs the oldest queued task. Returns `false` when nothing was queued.
    pub fn run_next(&self) -> bool {
        // lock released before running: tasks may submit again
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue stays empty. Returns how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl NotificationDispatch for ManualDispatch {
    fn submit(
        &self,
        task: DispatchTask,
    ) -> Result<()> {
        self.queue.lock().push_back(task);
        Ok(())
    }
}
