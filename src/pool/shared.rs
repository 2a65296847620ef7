//! State shared between the pool handle and its workers.

use crate::queue::JobRing;
use parking_lot::{Condvar, Mutex};

/// Everything guarded by the single pool mutex.
///
/// Invariants: `working` never exceeds the worker count, the ring never
/// exceeds its capacity, and `stopping` only ever transitions false to true.
pub(crate) struct PoolState {
    /// Bounded FIFO of pending job slots
    pub(crate) ring: JobRing,
    /// Number of workers currently executing a job
    pub(crate) working: usize,
    /// Shutdown requested; monotonic
    pub(crate) stopping: bool,
}

/// The pool mutex plus its three condition variables.
///
/// Every wait re-checks its predicate after wakeup, so spurious wakeups and
/// multiple parked waiters are both safe.
pub(crate) struct PoolShared {
    /// Pool lock guarding the ring, the working count, and the stop flag
    pub(crate) state: Mutex<PoolState>,
    /// Consumer wakeup: a slot was pushed, or stop was requested
    pub(crate) job_available: Condvar,
    /// Producer wakeup: a slot was popped, or stop was requested
    pub(crate) slot_freed: Condvar,
    /// Drain wakeup: the working count hit zero with an empty ring
    pub(crate) pool_idle: Condvar,
}

impl PoolShared {
    pub(crate) fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                ring: JobRing::with_capacity(queue_capacity),
                working: 0,
                stopping: false,
            }),
            job_available: Condvar::new(),
            slot_freed: Condvar::new(),
            pool_idle: Condvar::new(),
        }
    }
}
