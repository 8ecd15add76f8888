// src/crawl/executor.rs
// =============================================================================
// A fixed-size worker pool that knows when *all* of its work is done.
//
// How it works:
// 1. new(N) starts N worker tasks that share one job queue
// 2. submit() bumps the outstanding counter, then puts the job on the queue
// 3. A worker runs the job, catches errors and panics, and decrements the
//    counter, waking anyone who is draining
// 4. drain() loops: read the live counter, stop at zero, otherwise wait for
//    the next completion and read it again
//
// Step 4 is the important part. A crawl task submits its child links before
// it finishes, so the counter can go up while drain() is waiting. Reading it
// again after every completion means that late work is always waited for.
// The counter can't hit zero early either: a child is counted before its
// parent is marked complete.
// =============================================================================

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio::task::JoinSet;
use tokio::time::timeout;

type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

struct Job {
    name: String,
    future: TaskFuture,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("task executor is shut down, task '{0}' was rejected")]
    ShutDown(String),
}

/// Counters at the end of a drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
}

/// How the pool stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every worker finished its queue within the grace period
    Graceful,
    /// Workers had to be aborted, and stopped after that
    Forced,
    /// Workers were aborted but still had not stopped in time
    Unresponsive,
}

#[derive(Default)]
struct Tracker {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    outstanding: AtomicUsize,
    progress: Notify,
}

impl Tracker {
    fn finish(&self, failed: bool) {
        if failed {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.progress.notify_waiters();
    }

    fn summary(&self) -> DrainSummary {
        DrainSummary {
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

struct Inner {
    // None once shutdown() has started
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: Mutex<Option<JoinSet<()>>>,
    tracker: Arc<Tracker>,
}

/// Cheap to clone; every clone feeds the same pool
#[derive(Clone)]
pub struct TaskExecutor {
    inner: Arc<Inner>,
}

impl TaskExecutor {
    /// Starts the workers. Must be called from inside a tokio runtime.
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue = Arc::new(AsyncMutex::new(receiver));
        let tracker = Arc::new(Tracker::default());

        let mut workers = JoinSet::new();
        for worker in 0..pool_size {
            workers.spawn(run_worker(worker, Arc::clone(&queue), Arc::clone(&tracker)));
        }
        tracing::debug!(pool_size, "task executor started");

        Self {
            inner: Arc::new(Inner {
                sender: Mutex::new(Some(sender)),
                workers: Mutex::new(Some(workers)),
                tracker,
            }),
        }
    }

    /// Queues a task without waiting for it
    pub fn submit<F>(&self, name: impl Into<String>, task: F) -> Result<(), ExecutorError>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let sender = lock(&self.inner.sender);
        let Some(sender) = sender.as_ref() else {
            return Err(ExecutorError::ShutDown(name));
        };

        let tracker = &self.inner.tracker;
        tracker.submitted.fetch_add(1, Ordering::SeqCst);
        tracker.outstanding.fetch_add(1, Ordering::SeqCst);

        let job = Job {
            name,
            future: Box::pin(task),
        };
        if let Err(mpsc::error::SendError(job)) = sender.send(job) {
            // every worker is gone, undo the bookkeeping
            tracker.submitted.fetch_sub(1, Ordering::SeqCst);
            tracker.outstanding.fetch_sub(1, Ordering::SeqCst);
            tracker.progress.notify_waiters();
            return Err(ExecutorError::ShutDown(job.name));
        }
        Ok(())
    }

    /// Waits until every submitted task has finished, including tasks that
    /// were submitted by other tasks while we were waiting
    pub async fn drain(&self) -> DrainSummary {
        let tracker = &self.inner.tracker;

        loop {
            // Register for the wakeup before reading the counter, otherwise a
            // completion between the read and the await would be missed
            let progress = tracker.progress.notified();
            tokio::pin!(progress);
            progress.as_mut().enable();

            let outstanding = tracker.outstanding.load(Ordering::SeqCst);
            if outstanding == 0 {
                break;
            }
            tracing::trace!(outstanding, "waiting for tasks");
            progress.await;
        }

        tracker.summary()
    }

    /// Stops accepting work and waits for the workers to exit
    ///
    /// Workers finish whatever is still queued. If they don't stop within
    /// `grace` they are aborted, and we wait up to `grace` once more.
    /// Dropping the returned future before it completes aborts the workers.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownOutcome {
        // Dropping the only sender closes the queue
        lock(&self.inner.sender).take();

        let Some(mut workers) = lock(&self.inner.workers).take() else {
            return ShutdownOutcome::Graceful;
        };

        if timeout(grace, join_all(&mut workers)).await.is_ok() {
            tracing::debug!("task executor stopped");
            return ShutdownOutcome::Graceful;
        }

        tracing::warn!(
            remaining = workers.len(),
            grace_secs = grace.as_secs_f64(),
            "workers did not stop in time, aborting them"
        );
        workers.abort_all();

        if timeout(grace, join_all(&mut workers)).await.is_ok() {
            ShutdownOutcome::Forced
        } else {
            tracing::error!(remaining = workers.len(), "task executor did not terminate");
            ShutdownOutcome::Unresponsive
        }
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<AsyncMutex<mpsc::UnboundedReceiver<Job>>>,
    tracker: Arc<Tracker>,
) {
    loop {
        let job = queue.lock().await.recv().await;
        let Some(Job { name, future }) = job else {
            break;
        };

        let failed = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(())) => false,
            Ok(Err(error)) => {
                tracing::error!(
                    worker,
                    task = %name,
                    error = %format!("{:#}", error),
                    "task failed"
                );
                true
            }
            Err(panic) => {
                tracing::error!(
                    worker,
                    task = %name,
                    panic = %panic_message(&panic),
                    "task panicked"
                );
                true
            }
        };
        tracker.finish(failed);
    }
    tracing::trace!(worker, "worker stopped");
}

// join_next() is cancel safe, so a timed out wait leaves the set usable
async fn join_all(workers: &mut JoinSet<()>) {
    while workers.join_next().await.is_some() {}
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// A panic while holding these locks can't leave the data half-written
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why an unbounded queue?
//    - Tasks submit new tasks while they run on a worker
//    - With a bounded queue a full queue would block every worker on send(),
//      and nobody would be left to empty it
//    - The pool size still bounds how many pages are fetched at once
//
// 2. Why JoinSet for the workers?
//    - Dropping a JoinSet aborts everything in it
//    - So if shutdown() is cancelled halfway (its future is dropped), the
//      workers are aborted instead of leaking
//
// 3. Why catch_unwind?
//    - A panicking task would otherwise kill its worker and never decrement
//      the counter, and drain() would wait forever
// -----------------------------------------------------------------------------
