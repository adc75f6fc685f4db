mod context;
mod error;
mod message;

pub use context::{ExecutionContext, InlineContext, WorkerContext, handle_message};
pub use error::{WorkerError, WorkerResult};
pub use message::{
    CompletePayload, CompressPayload, ErrorPayload, ProgressPayload, WorkerEvent, WorkerMessage,
};
