//! Worker pool module

mod shared;
mod worker;
mod worker_pool;

pub use worker::{Worker, WorkerStats};
pub use worker_pool::{PoolConfig, WorkerPool};
