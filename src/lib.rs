//! # Workpool
//!
//! A fixed-size worker thread pool with a bounded FIFO job queue and optional
//! per-job completion futures.
//!
//! ## Features
//!
//! - **Bounded Queue**: Fixed-capacity ring buffer with blocking backpressure
//! - **Drain Barrier**: `wait()` blocks until no jobs are queued or running
//! - **Job Futures**: Single-waiter completion handles, consumed on wait
//! - **Graceful Shutdown**: `stop()` rejects new work but drains the queue
//! - **Worker Statistics**: Per-worker processed/failed/panicked counters
//! - **Panic Isolation**: A panicking job never takes down its worker
//!
//! ## Quick Start
//!
//! ```rust
//! use workpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Four workers, up to eight queued jobs
//! let pool = WorkerPool::new(4, 8)?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!         Ok(())
//!     })?;
//! }
//!
//! // Block until every job has finished
//! pool.wait();
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Waiting on a Single Job
//!
//! ```rust
//! use workpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(2, 4)?;
//!
//! let future = pool.execute_with_future(|| {
//!     // some expensive work
//!     Ok(())
//! })?;
//!
//! // Blocks until exactly this job completes; consumes the handle,
//! // so waiting twice is a compile error rather than undefined behavior
//! future.wait();
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use workpool::prelude::*;
//!
//! struct MyJob {
//!     data: String,
//! }
//!
//! impl Job for MyJob {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("Processing: {}", self.data);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "MyJob"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = WorkerPool::new(2, 4)?;
//! pool.submit(MyJob {
//!     data: "test".to_string(),
//! })?;
//! # pool.wait();
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Shutdown Semantics
//!
//! ```rust
//! use workpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(2, 4)?;
//! pool.execute(|| Ok(()))?;
//!
//! // Non-blocking: forbids new admissions, queued jobs still run
//! pool.stop();
//! assert!(matches!(pool.execute(|| Ok(())), Err(PoolError::Stopped)));
//!
//! // Joins all workers once the queue has drained
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;

mod queue;

pub use self::core::{BoxedJob, ClosureJob, Job, JobFuture, PoolError, Result};
pub use self::pool::{PoolConfig, WorkerPool, WorkerStats};
