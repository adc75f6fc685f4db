use crate::core::{JobId, TransitionError};
use crate::utils::OptimizerError;
use crate::worker::WorkerError;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error(transparent)]
    OptimizerError(#[from] OptimizerError),

    #[error(transparent)]
    WorkerError(#[from] WorkerError),
}

pub type QueueResult<T> = Result<T, QueueError>;
