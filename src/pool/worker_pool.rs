//! Worker pool implementation

use crate::core::{ClosureJob, Job, JobFuture, PoolError, Result};
use crate::pool::shared::PoolShared;
use crate::pool::worker::{Worker, WorkerStats};
use crate::queue::JobSlot;
use log::{error, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for a worker pool
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub worker_count: usize,
    /// Maximum number of queued jobs; producers block when the queue is full
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            // Small enough to exert backpressure under sustained load
            queue_capacity: 256,
            thread_name_prefix: "worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with the given worker count and queue capacity
    #[must_use]
    pub fn new(worker_count: usize, queue_capacity: usize) -> Self {
        Self {
            worker_count: if worker_count == 0 {
                num_cpus::get()
            } else {
                worker_count
            },
            queue_capacity,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(PoolError::invalid_config(
                "worker_count",
                "Number of workers must be greater than 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// A fixed-size pool of worker threads draining a bounded FIFO job queue
///
/// # Backpressure
///
/// The queue capacity is fixed at construction. When it is full, blocking
/// submissions park on the "slot freed" condition until a worker pops a job;
/// memory stays bounded at the cost of producer latency under load.
///
/// # Shutdown
///
/// [`stop()`](Self::stop) forbids new admissions and tells idle workers to
/// exit once the queue empties; jobs already queued still run.
/// [`shutdown()`](Self::shutdown) additionally joins every worker and is
/// also invoked on drop.
pub struct WorkerPool {
    config: PoolConfig,
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<Worker>>,
    total_jobs_submitted: AtomicU64,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("stopped", &self.is_stopped())
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with the given worker count and queue capacity
    ///
    /// All workers are running and ready to consume when this returns.
    pub fn new(worker_count: usize, queue_capacity: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(worker_count, queue_capacity))
    }

    /// Create a pool with custom configuration
    ///
    /// # Construction Failure
    ///
    /// If any worker thread fails to start, construction fails atomically:
    /// workers already started are signaled to stop and joined, and no
    /// partial pool is returned.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(PoolShared::with_capacity(config.queue_capacity));

        let mut workers = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            match Worker::spawn(id, &config.thread_name_prefix, Arc::clone(&shared)) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    shared.state.lock().stopping = true;
                    shared.job_available.notify_all();
                    for worker in workers {
                        if let Err(join_err) = worker.join() {
                            warn!("construction unwind: {}", join_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self {
            config,
            shared,
            workers: Mutex::new(workers),
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Submit a job to the pool, blocking while the queue is full
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Stopped`] if [`stop()`](Self::stop) has been
    /// called; the queue is left unmodified in that case.
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.enqueue(Box::new(job), None)
    }

    /// Submit a job and receive a [`JobFuture`] that signals its completion
    ///
    /// The future signals after this specific job's callable has fully
    /// returned, whether it succeeded, failed, or panicked.
    pub fn submit_with_future<J: Job + 'static>(&self, job: J) -> Result<JobFuture> {
        let (future, signal) = JobFuture::new();
        self.enqueue(Box::new(job), Some(signal))?;
        Ok(future)
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit a closure and receive a completion future
    pub fn execute_with_future<F>(&self, f: F) -> Result<JobFuture>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit_with_future(ClosureJob::new(f))
    }

    /// Attempt to submit a job without blocking
    ///
    /// # Errors
    ///
    /// - [`PoolError::QueueFull`] - the queue is at capacity
    /// - [`PoolError::Stopped`] - the pool has been stopped
    pub fn try_submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.stopping {
            return Err(PoolError::Stopped);
        }
        if state.ring.is_full() {
            return Err(PoolError::queue_full(
                state.ring.len(),
                state.ring.capacity(),
            ));
        }
        state.ring.push(JobSlot::new(Box::new(job), None));
        drop(state);

        self.shared.job_available.notify_one();
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Attempt to execute a closure without blocking
    pub fn try_execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.try_submit(ClosureJob::new(f))
    }

    /// Submit a job, waiting up to `timeout` for queue space
    ///
    /// # Errors
    ///
    /// - [`PoolError::SubmissionTimeout`] - no slot freed within `timeout`
    /// - [`PoolError::Stopped`] - the pool has been stopped
    pub fn submit_timeout<J: Job + 'static>(&self, job: J, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        let mut state = self.shared.state.lock();
        while state.ring.is_full() && !state.stopping {
            if self
                .shared
                .slot_freed
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.ring.is_full()
                && !state.stopping
            {
                return Err(PoolError::submission_timeout(timeout.as_millis() as u64));
            }
        }
        if state.stopping {
            return Err(PoolError::Stopped);
        }
        state.ring.push(JobSlot::new(Box::new(job), None));
        drop(state);

        self.shared.job_available.notify_one();
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Execute a closure, waiting up to `timeout` for queue space
    pub fn execute_timeout<F>(&self, f: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit_timeout(ClosureJob::new(f), timeout)
    }

    /// Shared admission path for blocking submissions.
    ///
    /// Parks on "slot freed" while the ring is full, re-checking on every
    /// wakeup. On rejection the job and any pending completion signal are
    /// dropped; a stopped pool never holds on to either.
    fn enqueue(
        &self,
        job: crate::core::BoxedJob,
        signal: Option<crate::core::CompletionSignal>,
    ) -> Result<()> {
        let mut state = self.shared.state.lock();
        while state.ring.is_full() && !state.stopping {
            self.shared.slot_freed.wait(&mut state);
        }
        if state.stopping {
            return Err(PoolError::Stopped);
        }
        state.ring.push(JobSlot::new(job, signal));
        drop(state);

        // Wake exactly one idle worker; broadcast would only waste wakeups
        self.shared.job_available.notify_one();
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Block until the pool is drained: no jobs queued and no worker running
    ///
    /// This is a point-in-time observation, not a barrier against new work;
    /// other threads may enqueue during or after the wait.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock();
        while state.working > 0 || !state.ring.is_empty() {
            self.shared.pool_idle.wait(&mut state);
        }
    }

    /// Signal shutdown without blocking
    ///
    /// After this call every subsequent submission returns
    /// [`PoolError::Stopped`]. Jobs already queued still run; idle workers
    /// exit once the queue empties. The flag is monotonic.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            state.stopping = true;
        }
        // Multiple producers and consumers may be parked; wake them all
        self.shared.job_available.notify_all();
        self.shared.slot_freed.notify_all();
    }

    /// Stop the pool and join every worker
    ///
    /// Blocks until all workers have drained the queue and exited. Safe to
    /// call more than once; later calls return immediately.
    pub fn shutdown(&self) -> Result<()> {
        self.stop();

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            worker.join()?;
        }
        Ok(())
    }

    /// Get the number of worker threads
    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Get the queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    /// Get the current number of queued jobs
    ///
    /// The value is approximate: it may change between checking and using it.
    pub fn queue_len(&self) -> usize {
        self.shared.state.lock().ring.len()
    }

    /// Check whether the pool has been stopped
    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stopping
    }

    /// Get total number of jobs admitted to the queue
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Get statistics for all workers
    ///
    /// Empty after [`shutdown()`](Self::shutdown), which consumes the
    /// worker handles.
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.workers.lock().iter().map(|w| w.stats()).collect()
    }

    /// Get total jobs processed successfully across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        let workers = self.workers.lock();
        workers.iter().map(|w| w.stats().get_jobs_processed()).sum()
    }

    /// Get total jobs failed across all workers
    pub fn total_jobs_failed(&self) -> u64 {
        let workers = self.workers.lock();
        workers.iter().map(|w| w.stats().get_jobs_failed()).sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        let workers = self.workers.lock();
        workers.iter().map(|w| w.stats().get_jobs_panicked()).sum()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(
                "failed to shutdown worker pool '{}' during drop: {}",
                self.config.thread_name_prefix, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_pool_creation() {
        let pool = WorkerPool::new(4, 16).expect("Failed to create pool");
        assert_eq!(pool.worker_count(), 4);
        assert_eq!(pool.queue_capacity(), 16);
        assert!(!pool.is_stopped());
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            WorkerPool::with_config(PoolConfig {
                worker_count: 2,
                queue_capacity: 0,
                ..Default::default()
            }),
            Err(PoolError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_create_then_drop_without_jobs() {
        // Must terminate without deadlock for any valid configuration
        for (workers, capacity) in [(1, 1), (2, 4), (8, 2)] {
            let pool = WorkerPool::new(workers, capacity).expect("Failed to create pool");
            drop(pool);
        }
    }

    #[test]
    fn test_job_execution_and_wait() {
        let pool = WorkerPool::new(4, 8).expect("Failed to create pool");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("Failed to submit job");
        }

        pool.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
        assert_eq!(pool.total_jobs_submitted(), 8);
        assert_eq!(pool.total_jobs_processed(), 8);

        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_submit_after_stop_is_rejected() {
        let pool = WorkerPool::new(2, 4).expect("Failed to create pool");
        pool.stop();

        let result = pool.execute(|| Ok(()));
        assert!(matches!(result, Err(PoolError::Stopped)));
        assert_eq!(pool.queue_len(), 0);

        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_stop_drains_queued_jobs() {
        // One worker held busy so further jobs stay queued
        let pool = WorkerPool::new(1, 8).expect("Failed to create pool");
        let (hold_tx, hold_rx) = mpsc::channel::<()>();

        pool.execute(move || {
            let _ = hold_rx.recv();
            Ok(())
        })
        .expect("Failed to submit blocker");

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("Failed to submit job");
        }

        pool.stop();
        assert!(matches!(pool.execute(|| Ok(())), Err(PoolError::Stopped)));

        hold_tx.send(()).expect("worker went away");
        pool.shutdown().expect("Failed to shutdown pool");

        // Jobs admitted before stop() all ran
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_future_signals_after_completion() {
        let pool = WorkerPool::new(2, 4).expect("Failed to create pool");
        let flag = Arc::new(AtomicUsize::new(0));

        let flag_clone = Arc::clone(&flag);
        let future = pool
            .execute_with_future(move || {
                thread::sleep(Duration::from_millis(30));
                flag_clone.store(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("Failed to submit job");

        future.wait();
        // The callable fully returned before the future signaled
        assert_eq!(flag.load(Ordering::SeqCst), 1);

        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_future_signals_even_when_job_fails() {
        let pool = WorkerPool::new(1, 4).expect("Failed to create pool");

        let failing = pool
            .execute_with_future(|| Err(PoolError::other("Test error")))
            .expect("Failed to submit job");
        let panicking = pool
            .execute_with_future(|| panic!("Intentional panic for testing"))
            .expect("Failed to submit job");

        failing.wait();
        panicking.wait();

        assert_eq!(pool.total_jobs_failed(), 1);
        assert_eq!(pool.total_jobs_panicked(), 1);

        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_enqueue_blocks_when_queue_full() {
        let pool = Arc::new(WorkerPool::new(1, 1).expect("Failed to create pool"));
        let (started_tx, started_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        // Job A occupies the single worker
        pool.execute(move || {
            started_tx.send(()).unwrap();
            let _ = done_rx.recv();
            Ok(())
        })
        .expect("Failed to submit job A");

        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Job A should start");

        // Fill the single queue slot
        pool.execute(|| Ok(())).expect("Failed to submit job B");

        // The next submission must block until the slot frees
        let submitted = Arc::new(AtomicUsize::new(0));
        let submitted_clone = Arc::clone(&submitted);
        let pool_clone = Arc::clone(&pool);
        let submitter = thread::spawn(move || {
            pool_clone.execute(|| Ok(())).expect("Failed to submit job C");
            submitted_clone.store(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(100));
        assert_eq!(
            submitted.load(Ordering::SeqCst),
            0,
            "submission should block while the queue is full"
        );

        // Let A finish; B gets popped, C's slot frees, submitter unblocks
        done_tx.send(()).unwrap();
        submitter.join().expect("submitter panicked");
        assert_eq!(submitted.load(Ordering::SeqCst), 1);

        pool.wait();
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_try_submit_when_queue_full() {
        let pool = WorkerPool::new(1, 1).expect("Failed to create pool");
        let (started_tx, started_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        pool.execute(move || {
            started_tx.send(()).unwrap();
            let _ = done_rx.recv();
            Ok(())
        })
        .expect("Failed to submit blocker");

        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Blocker should start");

        pool.try_execute(|| Ok(())).expect("Queue has one free slot");

        let result = pool.try_execute(|| Ok(()));
        assert!(
            matches!(result, Err(PoolError::QueueFull { .. })),
            "Expected QueueFull error, got: {:?}",
            result
        );

        done_tx.send(()).unwrap();
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_submit_timeout_expires() {
        let pool = WorkerPool::new(1, 1).expect("Failed to create pool");
        let (started_tx, started_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        pool.execute(move || {
            started_tx.send(()).unwrap();
            let _ = done_rx.recv();
            Ok(())
        })
        .expect("Failed to submit blocker");

        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Blocker should start");
        pool.execute(|| Ok(())).expect("Queue has one free slot");

        let result = pool.execute_timeout(|| Ok(()), Duration::from_millis(50));
        assert!(matches!(result, Err(PoolError::SubmissionTimeout { .. })));

        done_tx.send(()).unwrap();
        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_concurrent_submit() {
        let pool = Arc::new(WorkerPool::new(4, 32).expect("Failed to create pool"));
        let counter = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..10 {
            let pool_clone = Arc::clone(&pool);
            let counter_clone = Arc::clone(&counter);

            let handle = thread::spawn(move || {
                for _ in 0..100 {
                    let counter_inner = Arc::clone(&counter_clone);
                    pool_clone
                        .execute(move || {
                            counter_inner.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .expect("Failed to submit job");
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        pool.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 1000);
        assert_eq!(pool.total_jobs_submitted(), 1000);

        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_error_handling_counts() {
        let pool = WorkerPool::new(2, 16).expect("Failed to create pool");
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..10 {
            let counter_clone = Arc::clone(&counter);
            pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                if i % 2 == 0 {
                    Err(PoolError::other("Test error"))
                } else {
                    Ok(())
                }
            })
            .expect("Failed to submit job");
        }

        pool.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(pool.total_jobs_processed(), 5);
        assert_eq!(pool.total_jobs_failed(), 5);

        pool.shutdown().expect("Failed to shutdown pool");
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let pool = WorkerPool::new(2, 4).expect("Failed to create pool");
        pool.shutdown().expect("First shutdown failed");
        pool.shutdown().expect("Second shutdown failed");
        assert!(pool.is_stopped());
    }

    #[test]
    fn test_stress_high_load() {
        let pool = WorkerPool::new(4, 64).expect("Failed to create pool");
        let counter = Arc::new(AtomicUsize::new(0));
        let jobs_count = 10_000;

        for _ in 0..jobs_count {
            let counter_clone = Arc::clone(&counter);
            pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .expect("Failed to submit job");
        }

        pool.wait();
        assert_eq!(counter.load(Ordering::SeqCst), jobs_count);
        assert_eq!(pool.total_jobs_processed(), jobs_count as u64);

        pool.shutdown().expect("Failed to shutdown pool");
    }
}
