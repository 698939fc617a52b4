//! Recurring/one-shot callback scheduler, grounded on `tasks.py::TaskManager`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::worker::WorkerPool;

pub type TaskFn = Arc<dyn Fn() + Send + Sync>;

struct Task {
    function: TaskFn,
    interval: Duration,
    loop_forever: bool,
    threaded: bool,
    last_call: Instant,
}

#[derive(Default)]
pub struct TaskManager {
    tasks: Mutex<Vec<Task>>,
}

impl TaskManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, interval: Duration, loop_forever: bool, threaded: bool, function: TaskFn) {
        self.tasks.lock().push(Task {
            function,
            interval,
            loop_forever,
            threaded,
            last_call: Instant::now(),
        });
    }

    /// Runs once per session-loop cycle: any task whose interval has
    /// elapsed fires, one-shot tasks are dropped after firing, threaded
    /// ones hop onto `pool`.
    pub fn execute(&self, pool: &WorkerPool) {
        let mut due = Vec::new();
        {
            let mut tasks = self.tasks.lock();
            let now = Instant::now();
            let mut remaining = Vec::with_capacity(tasks.len());
            for mut task in tasks.drain(..) {
                if now.duration_since(task.last_call) >= task.interval {
                    task.last_call = now;
                    due.push((task.function.clone(), task.threaded));
                    if task.loop_forever {
                        remaining.push(task);
                    }
                } else {
                    remaining.push(task);
                }
            }
            *tasks = remaining;
        }

        for (function, threaded) in due {
            if threaded {
                pool.spawn(async move {
                    function();
                    Ok(())
                });
            } else {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| function()));
                match result {
                    Ok(()) => debug!("task executed"),
                    Err(_) => error!("task panicked"),
                }
            }
        }
    }
}
