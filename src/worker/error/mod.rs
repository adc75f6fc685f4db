#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Execution context is closed")]
    ContextClosed,

    #[error("Task processing failed: {0}")]
    ProcessingError(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl WorkerError {
    /// Wraps a payload caught by `std::panic::catch_unwind`.
    pub fn panicked(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        WorkerError::ProcessingError(format!("Task panicked: {}", message))
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        WorkerError::ProcessingError(format!("Task panicked: {}", err))
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for WorkerError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        WorkerError::ContextClosed
    }
}
