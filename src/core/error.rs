//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{worker_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// Pool has been stopped; new jobs are no longer admitted
    #[error("Worker pool is stopped: new jobs are not accepted")]
    Stopped,

    /// Queue is full with capacity details
    #[error("Job queue is full: {current}/{max} jobs queued")]
    QueueFull {
        /// Current queue size
        current: usize,
        /// Maximum queue size
        max: usize,
    },

    /// Job submission timed out waiting for queue space
    #[error("Job submission timed out after {timeout_ms}ms")]
    SubmissionTimeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl PoolError {
    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(worker_id: usize, message: impl Into<String>) -> Self {
        PoolError::SpawnError {
            worker_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(worker_id: usize, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a queue full error
    pub fn queue_full(current: usize, max: usize) -> Self {
        PoolError::QueueFull { current, max }
    }

    /// Create a submission timeout error
    pub fn submission_timeout(timeout_ms: u64) -> Self {
        PoolError::SubmissionTimeout { timeout_ms }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PoolError::Other(msg.into())
    }
}
