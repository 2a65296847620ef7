//! Convenient re-exports for common types and traits

pub use crate::core::{BoxedJob, ClosureJob, Job, JobFuture, PoolError, Result};
pub use crate::pool::{PoolConfig, WorkerPool, WorkerStats};
