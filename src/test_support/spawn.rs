use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::reactive::TaskSpawner;

/// Deterministic spawner: tasks queue up until the test drains them.
///
/// `drain` drives each task to completion with a blocking executor, so any
/// future handed to it must already be unblocked (release fakes' gates
/// before draining).
#[derive(Default)]
pub struct QueueSpawner {
    tasks: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl QueueSpawner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Runs every queued task to completion, including tasks spawned while
    /// draining.
    pub fn drain(&self) {
        loop {
            let batch: Vec<_> = std::mem::take(&mut *self.tasks.lock().unwrap());
            if batch.is_empty() {
                return;
            }
            for task in batch {
                futures::executor::block_on(task);
            }
        }
    }
}

impl TaskSpawner for QueueSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.tasks.lock().unwrap().push(task);
    }
}
