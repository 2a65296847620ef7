//! Single-shot, single-waiter job completion futures
//!
//! A [`JobFuture`] is handed out by the pool when a job is submitted with
//! [`submit_with_future()`](crate::pool::WorkerPool::submit_with_future). It
//! signals once the job's callable has fully returned, never before and never
//! for a different job.
//!
//! The handle is deliberately not `Clone` and [`JobFuture::wait()`] consumes
//! it, so waiting twice or sharing one future between threads is rejected at
//! compile time rather than documented as undefined behavior.
//!
//! # Example
//!
//! ```rust
//! use workpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(2, 8)?;
//!
//! let future = pool.execute_with_future(|| {
//!     println!("working...");
//!     Ok(())
//! })?;
//!
//! // Blocks until exactly this job has completed
//! future.wait();
//! # Ok(())
//! # }
//! ```

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared completion state between the caller handle and the worker signal.
///
/// The mutex here is independent of the pool lock. A worker signals the
/// future only after it has released the pool lock, so no thread ever holds
/// both and no lock ordering cycle can form.
struct FutureInner {
    done: Mutex<bool>,
    cond: Condvar,
}

/// Caller-side handle for one job's completion.
///
/// Exactly one `JobFuture` exists per future-requesting submission. It cannot
/// be cloned, and waiting consumes it. Dropping the handle without waiting is
/// allowed and simply releases its storage.
pub struct JobFuture {
    inner: Arc<FutureInner>,
}

impl std::fmt::Debug for JobFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobFuture")
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl JobFuture {
    /// Create a linked future/signal pair in the pending state.
    pub(crate) fn new() -> (JobFuture, CompletionSignal) {
        let inner = Arc::new(FutureInner {
            done: Mutex::new(false),
            cond: Condvar::new(),
        });
        (
            JobFuture {
                inner: Arc::clone(&inner),
            },
            CompletionSignal { inner },
        )
    }

    /// Block until the job this future was created for has completed.
    ///
    /// The predicate is re-checked on every wakeup, so spurious wakeups are
    /// harmless. Consumes the handle; the completion state is released on
    /// return.
    pub fn wait(self) {
        let mut done = self.inner.done.lock();
        while !*done {
            self.inner.cond.wait(&mut done);
        }
    }

    /// Block until the job completes or the timeout elapses.
    ///
    /// On timeout the handle is returned so the caller can wait again later.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` if the job did not complete within `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> std::result::Result<(), Self> {
        let deadline = Instant::now() + timeout;
        let mut done = self.inner.done.lock();
        while !*done {
            if self.inner.cond.wait_until(&mut done, deadline).timed_out() {
                if *done {
                    break;
                }
                drop(done);
                return Err(self);
            }
        }
        drop(done);
        Ok(())
    }

    /// Check whether the job has already completed, without blocking.
    pub fn is_complete(&self) -> bool {
        *self.inner.done.lock()
    }
}

/// Worker-side handle used to mark the job complete.
///
/// Travels with the job slot through the queue; the worker fires it after
/// the job's callable has returned, regardless of whether the job succeeded,
/// failed, or panicked, so the waiter is never stranded.
pub(crate) struct CompletionSignal {
    inner: Arc<FutureInner>,
}

impl CompletionSignal {
    /// Mark the job complete and wake the waiter.
    ///
    /// Only one thread is allowed to wait on the future, so a single notify
    /// suffices.
    pub(crate) fn complete(self) {
        let mut done = self.inner.done.lock();
        *done = true;
        drop(done);
        self.inner.cond.notify_one();
    }
}
