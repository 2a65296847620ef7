//! Fixed-capacity circular buffer of job slots.

use crate::core::{BoxedJob, CompletionSignal};

/// One queued unit of work: the job plus the worker-side completion signal
/// if the submitter asked for a future.
pub(crate) struct JobSlot {
    pub(crate) job: BoxedJob,
    pub(crate) signal: Option<CompletionSignal>,
}

impl JobSlot {
    pub(crate) fn new(job: BoxedJob, signal: Option<CompletionSignal>) -> Self {
        Self { job, signal }
    }
}

/// A fixed-capacity FIFO ring buffer.
///
/// Slots are inserted at `(head + len) % capacity` and removed from `head`,
/// so jobs run in submission order with no reordering. The capacity is set
/// at construction and never grows; backpressure is the pool's job.
pub(crate) struct JobRing {
    slots: Vec<Option<JobSlot>>,
    head: usize,
    len: usize,
}

impl JobRing {
    /// Create an empty ring holding up to `capacity` slots.
    ///
    /// `capacity` is validated by `PoolConfig` before it reaches here.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring capacity must be greater than 0");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    /// Insert a slot at the tail. The caller must have checked `is_full()`
    /// under the pool lock.
    pub(crate) fn push(&mut self, slot: JobSlot) {
        debug_assert!(!self.is_full(), "push on a full ring");
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(slot);
        self.len += 1;
    }

    /// Remove and return the slot at the head, oldest first.
    pub(crate) fn pop(&mut self) -> Option<JobSlot> {
        if self.len == 0 {
            return None;
        }
        let slot = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        slot
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
