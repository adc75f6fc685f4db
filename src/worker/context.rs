//! Execution contexts that run compression off the coordinator.
//!
//! The queue only ever talks to an [`ExecutionContext`]: it posts a message
//! and later receives [`WorkerEvent`]s on a channel. [`WorkerContext`] runs
//! jobs on a dedicated task backed by the blocking pool, [`InlineContext`]
//! runs them synchronously inside `post`. Both turn a panic in the engine
//! into an `error` event for the job that caused it.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::processing::search::AdaptiveSearch;

use super::error::{WorkerError, WorkerResult};
use super::message::{CompressPayload, WorkerEvent, WorkerMessage};

/// Somewhere a [`WorkerMessage`] can be posted for processing.
pub trait ExecutionContext {
    fn post(&self, message: WorkerMessage) -> WorkerResult<()>;
}

/// Processes one message, reporting through `emit`.
///
/// A `compress` message yields progress events followed by exactly one
/// `complete` or `error`. Any other kind is answered with an error event.
pub fn handle_message(engine: &AdaptiveSearch, message: WorkerMessage, emit: &dyn Fn(WorkerEvent)) {
    let CompressPayload {
        id,
        image_bytes,
        config,
    } = match message {
        WorkerMessage::Compress(payload) => payload,
        other => {
            warn!("Execution context received unexpected {} message", other.kind());
            emit(WorkerEvent::error(
                other.job_id(),
                format!("Unknown message type: {}", other.kind()),
            ));
            return;
        }
    };

    debug!("Processing job {} ({} bytes)", id, image_bytes.len());
    let on_progress = |progress: u8| emit(WorkerEvent::progress(id, progress));

    match engine.compress(&image_bytes, &config, &on_progress) {
        Ok(result) => {
            debug!(
                "Job {} done: {} → {} bytes ({}% saved, {} attempts)",
                id, result.original_size, result.compressed_size, result.ratio, result.attempts
            );
            emit(WorkerEvent::complete(id, result));
        }
        Err(e) => {
            warn!("Job {} failed: {}", id, e);
            emit(WorkerEvent::error(id, e.to_string()));
        }
    }
}

/// Dedicated worker task that processes messages strictly one at a time.
pub struct WorkerContext {
    sender: mpsc::UnboundedSender<WorkerMessage>,
    handle: JoinHandle<()>,
}

impl WorkerContext {
    /// Starts the worker on the current tokio runtime.
    ///
    /// Returns the context and the receiving end of its event stream. The
    /// worker stops once the context is dropped or shut down.
    pub fn spawn(engine: AdaptiveSearch) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (sender, mut inbox) = mpsc::unbounded_channel::<WorkerMessage>();
        let (events, event_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                let id = message.job_id();
                let engine = engine.clone();
                let job_events = events.clone();

                // One job on the blocking pool at a time; the next message
                // waits until this one has emitted its terminal event
                let outcome = tokio::task::spawn_blocking(move || {
                    handle_message(&engine, message, &|event| {
                        if job_events.send(event).is_err() {
                            debug!("Event receiver dropped, discarding event");
                        }
                    });
                })
                .await;

                if let Err(e) = outcome.map_err(WorkerError::from) {
                    warn!("Job {} aborted: {}", id, e);
                    let message = match e {
                        WorkerError::ProcessingError(message) => message,
                        other => other.to_string(),
                    };
                    let _ = events.send(WorkerEvent::error(id, message));
                }
            }
            debug!("Worker context stopped");
        });

        (Self { sender, handle }, event_rx)
    }

    /// Closes the inbox and waits for the in-flight job to finish.
    pub async fn shutdown(self) -> WorkerResult<()> {
        drop(self.sender);
        self.handle.await?;
        Ok(())
    }
}

impl ExecutionContext for WorkerContext {
    fn post(&self, message: WorkerMessage) -> WorkerResult<()> {
        self.sender.send(message)?;
        Ok(())
    }
}

/// Context that processes each message synchronously inside `post`.
///
/// Events land on the same kind of channel as [`WorkerContext`], so the
/// queue drives both the same way.
pub struct InlineContext {
    engine: AdaptiveSearch,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl InlineContext {
    pub fn new(engine: AdaptiveSearch) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        (Self { engine, events }, event_rx)
    }
}

impl ExecutionContext for InlineContext {
    fn post(&self, message: WorkerMessage) -> WorkerResult<()> {
        if self.events.is_closed() {
            return Err(WorkerError::ContextClosed);
        }
        let id = message.job_id();
        let emit = |event: WorkerEvent| {
            let _ = self.events.send(event);
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| handle_message(&self.engine, message, &emit)));

        if let Err(payload) = outcome {
            let message = match WorkerError::panicked(payload) {
                WorkerError::ProcessingError(message) => message,
                other => other.to_string(),
            };
            warn!("Job {} aborted: {}", id, message);
            emit(WorkerEvent::error(id, message));
        }
        Ok(())
    }
}
