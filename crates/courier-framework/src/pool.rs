//! Bounded work pool for event tasks.
//!
//! A fixed set of `workers` long-lived tasks drain one bounded queue of
//! `capacity` jobs. The pool never holds more than `workers + capacity`
//! accepted jobs; a full queue either rejects the job ([`WorkPool::submit`])
//! or makes the caller wait for room ([`WorkPool::submit_started`]).
//! Shutdown stops accepting new work and waits until every accepted job ran.
//!
//! The pool must be created inside a Tokio runtime, since the workers are
//! spawned right away.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use courier_core::SubmitError;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

/// Default number of queued jobs per worker.
pub const DEFAULT_QUEUE_PER_WORKER: usize = 64;

type Job = BoxFuture<'static, ()>;

/// A cooperative pool of a fixed number of workers behind a bounded queue.
///
/// Cloning is cheap; clones share the queue and the workers.
#[derive(Debug, Clone)]
pub struct WorkPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    tracker: TaskTracker,
    pending: Arc<AtomicUsize>,
    workers: usize,
    capacity: usize,
}

impl WorkPool {
    /// Creates a pool of `workers` workers with
    /// [`DEFAULT_QUEUE_PER_WORKER`] queued jobs per worker.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self::with_capacity(workers, workers * DEFAULT_QUEUE_PER_WORKER)
    }

    /// Creates a pool of `workers` workers draining a queue of `capacity`
    /// jobs.
    ///
    /// Zero values are treated as `1`; configuration validation rejects them
    /// before they get here.
    pub fn with_capacity(workers: usize, capacity: usize) -> Self {
        let workers = workers.max(1);
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let pending = Arc::new(AtomicUsize::new(0));
        let tracker = TaskTracker::new();

        for worker in 0..workers {
            tracker.spawn(run_worker(
                worker,
                Arc::clone(&receiver),
                Arc::clone(&pending),
            ));
        }
        tracker.close();

        Self {
            inner: Arc::new(PoolInner {
                sender: Mutex::new(Some(sender)),
                tracker,
                pending,
                workers,
                capacity,
            }),
        }
    }

    /// Number of worker tasks.
    pub fn workers(&self) -> usize {
        self.inner.workers
    }

    /// Number of jobs the queue holds on top of the running ones.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Jobs accepted and not yet finished, running or queued.
    pub fn in_flight(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    fn sender(&self) -> Result<mpsc::Sender<Job>, SubmitError> {
        self.inner.sender.lock().clone().ok_or(SubmitError::Closed)
    }

    /// Queues a job and returns immediately.
    ///
    /// Fails with [`SubmitError::Saturated`] when the queue is full.
    pub fn submit<F>(&self, work: F) -> Result<(), SubmitError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender()?;
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        match sender.try_send(work.boxed()) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.inner.pending.fetch_sub(1, Ordering::AcqRel);
                match e {
                    TrySendError::Full(_) => Err(SubmitError::Saturated),
                    TrySendError::Closed(_) => Err(SubmitError::Closed),
                }
            }
        }
    }

    /// Queues a job, waiting for room while the queue is full, so the caller
    /// is slowed down while the pool is saturated.
    pub async fn submit_started<F>(&self, work: F) -> Result<(), SubmitError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender()?;
        let permit = sender.reserve().await.map_err(|_| SubmitError::Closed)?;
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        permit.send(work.boxed());
        Ok(())
    }

    /// Stops accepting jobs and waits until every accepted job finished.
    pub async fn shutdown(&self) {
        self.inner.sender.lock().take();
        debug!(in_flight = self.in_flight(), "Draining work pool");
        self.inner.tracker.wait().await;
        debug!("Work pool drained");
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    pending: Arc<AtomicUsize>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };
        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
            error!(worker, "Event task panicked");
        }
        pending.fetch_sub(1, Ordering::AcqRel);
    }
    debug!(worker, "Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use tokio_test::{assert_err, assert_ok};

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = WorkPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let running = running.clone();
            let peak = peak.clone();
            assert_ok!(pool.submit(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        pool.shutdown().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_accepted_jobs_never_exceed_workers_plus_capacity() {
        let pool = WorkPool::with_capacity(1, 2);
        let gate = Arc::new(Semaphore::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let mut accepted = 0;
        let mut saturated = 0;
        for _ in 0..1000 {
            let gate = gate.clone();
            let done = done.clone();
            match pool.submit(async move {
                let _permit = gate.acquire().await;
                done.fetch_add(1, Ordering::SeqCst);
            }) {
                Ok(()) => accepted += 1,
                Err(SubmitError::Saturated) => saturated += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
            settle().await;
        }

        assert_eq!(accepted, 3);
        assert_eq!(saturated, 997);
        assert_eq!(pool.in_flight(), 3);

        gate.add_permits(1000);
        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panicking_job_keeps_the_worker_alive() {
        let pool = WorkPool::new(1);
        let done = Arc::new(AtomicUsize::new(0));

        assert_ok!(pool.submit(async { panic!("boom") }));
        let counter = done.clone();
        assert_ok!(pool.submit(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_accepted_work() {
        let pool = WorkPool::new(1);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let done = done.clone();
            assert_ok!(pool.submit(async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }

        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 4);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_work() {
        let pool = WorkPool::new(1);
        pool.shutdown().await;
        assert!(pool.is_closed());
        assert_err!(pool.submit(async {}));
        assert_err!(pool.submit_started(async {}).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_started_waits_for_room() {
        let pool = WorkPool::with_capacity(1, 1);
        assert_ok!(
            pool.submit_started(tokio::time::sleep(Duration::from_secs(5)))
                .await
        );
        settle().await;
        // the worker is busy, this one fills the queue
        assert_ok!(pool.submit_started(async {}).await);

        let third = pool.submit_started(async {});
        tokio::pin!(third);
        assert!(
            tokio::time::timeout(Duration::from_secs(1), &mut third)
                .await
                .is_err()
        );
        assert_ok!(third.await);
        pool.shutdown().await;
    }
}
