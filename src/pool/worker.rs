//! Worker thread implementation

use crate::core::{BoxedJob, PoolError, Result};
use crate::pool::shared::PoolShared;
use crate::queue::JobSlot;
use log::{debug, error, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs processed successfully
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that returned an error
    pub jobs_failed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }
}

/// Lifecycle state of a worker thread.
///
/// A worker is `Idle` while parked on the "job available" condition,
/// `Running` from the moment it pops a slot until the job and its
/// completion signal are done, and `Exited` once it has observed the stop
/// flag with an empty queue. `Exited` is absorbing: a worker never abandons
/// a popped job, so all queued work drains before any worker leaves.
enum WorkerState {
    /// Waiting for a job or the exit condition
    Idle,
    /// Executing the popped slot
    Running(JobSlot),
    /// Stop observed with an empty queue
    Exited,
}

/// A worker thread that drains job slots from the pool's ring buffer
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("jobs_processed", &self.stats.get_jobs_processed())
            .finish()
    }
}

impl Worker {
    /// Create and start a new worker attached to the pool's shared state
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this worker
    /// * `name_prefix` - Thread name prefix, producing names like `worker-0`
    /// * `shared` - The pool's lock, condition variables, and ring buffer
    pub(crate) fn spawn(
        id: usize,
        name_prefix: &str,
        shared: Arc<PoolShared>,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", name_prefix, id))
            .spawn(move || {
                Self::run(id, shared, stats_clone);
            })
            .map_err(|e| PoolError::spawn_with_source(id, "Cannot create thread", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PoolError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop, driven as an explicit state machine.
    ///
    /// The only exit path is `Idle` observing `stopping == true` with an
    /// empty ring, so every admitted job runs even when stop is requested
    /// while jobs are still queued.
    fn run(id: usize, shared: Arc<PoolShared>, stats: Arc<WorkerStats>) {
        debug!("worker {} started", id);

        let mut state = WorkerState::Idle;
        loop {
            state = match state {
                WorkerState::Idle => Self::acquire_job(&shared),
                WorkerState::Running(slot) => {
                    Self::finish_job(id, slot, &shared, &stats);
                    WorkerState::Idle
                }
                WorkerState::Exited => break,
            };
        }

        debug!(
            "worker {} exiting: {} processed, {} failed, {} panicked",
            id,
            stats.get_jobs_processed(),
            stats.get_jobs_failed(),
            stats.get_jobs_panicked()
        );
    }

    /// Block until a job is available or the pool is draining to exit.
    ///
    /// The working count is incremented while the pool lock is still held,
    /// so an observer computing "queue empty and nobody running" is never
    /// fooled by a slot that has been popped but not yet started.
    fn acquire_job(shared: &PoolShared) -> WorkerState {
        let mut pool = shared.state.lock();
        while pool.ring.is_empty() && !pool.stopping {
            shared.job_available.wait(&mut pool);
        }
        if pool.stopping && pool.ring.is_empty() {
            return WorkerState::Exited;
        }
        let slot = match pool.ring.pop() {
            Some(slot) => slot,
            // Another worker raced us to the slot; go back to waiting
            None => return WorkerState::Idle,
        };
        pool.working += 1;
        drop(pool);

        // A slot just freed; wake one parked producer
        shared.slot_freed.notify_one();
        WorkerState::Running(slot)
    }

    /// Run the popped job, fire its completion signal, and update the
    /// pool-wide drain accounting.
    fn finish_job(id: usize, slot: JobSlot, shared: &PoolShared, stats: &WorkerStats) {
        let JobSlot { mut job, signal } = slot;

        Self::execute_job(id, &mut job, stats);

        // The pool lock is not held here, and the signal takes only the
        // future's own lock, so the two locks are never nested.
        if let Some(signal) = signal {
            signal.complete();
        }

        let mut pool = shared.state.lock();
        pool.working -= 1;
        if pool.working == 0 && pool.ring.is_empty() {
            shared.pool_idle.notify_all();
        }
    }

    /// Execute a single job with panic protection.
    ///
    /// A job that fails or panics is isolated: the outcome is counted and
    /// logged, and the worker keeps running.
    fn execute_job(id: usize, job: &mut BoxedJob, stats: &WorkerStats) {
        let panic_result = catch_unwind(AssertUnwindSafe(|| job.execute()));

        match panic_result {
            Ok(Ok(())) => {
                stats.jobs_processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                warn!("worker {}: job '{}' failed: {}", id, job.job_type(), e);
                stats.jobs_failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("worker {}: job panicked: {}", id, panic_msg);
                stats.jobs_panicked.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
