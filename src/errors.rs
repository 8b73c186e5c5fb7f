#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("protocol error: {0}")] Protocol(String),
    #[error("worker lost while running task {0}")] WorkerLost(u64),
    #[error("worker pool is shut down")] PoolShutdown,
    #[error("pending task queue is full")] QueueFull,
    #[error("task {0} was cancelled")] Cancelled(u64),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema lookup failed: {0}")] Lookup(String),
    #[error("no connection available")] NoConnection,
}
