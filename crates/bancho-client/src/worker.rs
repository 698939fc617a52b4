//! Bounded concurrent task execution for "threaded" handlers/tasks.
//!
//! The reference client hands these off to a `ThreadPoolExecutor`. On a
//! `tokio` multi-thread runtime the idiomatic equivalent of "a bounded
//! worker pool" is `tokio::spawn` gated by a `Semaphore` sized to the
//! configured worker count, not a second thread-pool abstraction.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::error;

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(worker_count.max(1))),
        }
    }

    /// Runs `task` on the runtime once a permit is free. Errors are
    /// logged and never propagated, matching `packets.py`'s blanket
    /// `try/except Exception` around every handler invocation.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = eyre::Result<()>> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore is never closed");
            if let Err(err) = task.await {
                error!(error = %err, "threaded handler failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn spawned_task_runs() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = counter.clone();
        pool.spawn(async move {
            counter2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
