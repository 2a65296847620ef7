//! Core types and traits for the worker pool

pub mod error;
pub mod future;
pub mod job;

pub use error::{PoolError, Result};
pub use future::JobFuture;
pub use job::{BoxedJob, ClosureJob, Job};

pub(crate) use future::CompletionSignal;
