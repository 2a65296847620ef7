//! Bounded FIFO job storage shared between producers and workers.
//!
//! The ring buffer itself is not synchronized; the pool guards it with its
//! own mutex alongside the working count and stop flag.

mod ring;

pub(crate) use ring::{JobRing, JobSlot};
