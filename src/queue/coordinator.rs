//! Drives a [`QueueState`] against an execution context.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::{BatchSummary, CompressionConfig, Job, JobId, JobStatus, PreviewHandle, SourceImage};
use crate::utils::validate_config;
use crate::worker::{ExecutionContext, WorkerError, WorkerEvent};

use super::error::QueueResult;
use super::state::{Effect, QueueAction, QueueState};

/// Releases display resources tied to a job (thumbnails, object URLs).
pub trait PreviewRelease: Send {
    fn release(&self, preview: &PreviewHandle);
}

/// For callers that attach no previews.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPreviewRelease;

impl PreviewRelease for NoopPreviewRelease {
    fn release(&self, _preview: &PreviewHandle) {}
}

/// Single-concurrency job queue.
///
/// Feeds one job at a time to the execution context `X` and applies the
/// events it sends back. All state changes go through the reducer in
/// [`QueueState`]; this type only carries out the effects.
pub struct JobQueue<X: ExecutionContext> {
    state: QueueState,
    context: X,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    previews: Box<dyn PreviewRelease>,
}

impl<X: ExecutionContext> JobQueue<X> {
    /// Builds a queue over `context`, whose events arrive on `events`.
    pub fn new(context: X, events: mpsc::UnboundedReceiver<WorkerEvent>) -> Self {
        Self {
            state: QueueState::new(),
            context,
            events,
            previews: Box::new(NoopPreviewRelease),
        }
    }

    pub fn with_preview_release(mut self, previews: impl PreviewRelease + 'static) -> Self {
        self.previews = Box::new(previews);
        self
    }

    /// Adds one pending job per image, each with its own copy of `config`.
    pub fn submit(&mut self, images: Vec<SourceImage>, config: &CompressionConfig) -> QueueResult<Vec<JobId>> {
        validate_config(config)?;
        let jobs: Vec<Job> = images
            .into_iter()
            .map(|image| Job::new(image, config.clone()))
            .collect();
        let ids = jobs.iter().map(Job::id).collect();
        self.apply(QueueAction::Submit(jobs))?;
        Ok(ids)
    }

    /// Starts processing if anything is pending. Idempotent.
    pub fn start(&mut self) -> QueueResult<()> {
        self.apply(QueueAction::Start)
    }

    pub fn retry(&mut self, id: JobId) -> QueueResult<()> {
        self.apply(QueueAction::Retry(id))
    }

    /// Removes a job at any status. An in-flight job keeps running; its
    /// result is discarded when it arrives.
    pub fn remove(&mut self, id: JobId) -> QueueResult<()> {
        self.apply(QueueAction::Remove(id))
    }

    /// Removes every job and stops. Does not interrupt the execution context.
    pub fn clear(&mut self) -> QueueResult<()> {
        self.apply(QueueAction::Clear)
    }

    pub fn update_config(&mut self, id: JobId, config: CompressionConfig) -> QueueResult<()> {
        validate_config(&config)?;
        self.apply(QueueAction::UpdateConfig(id, config))
    }

    /// Applies `config` to every job that has not started or has failed.
    pub fn update_all_configs(&mut self, config: CompressionConfig) -> QueueResult<()> {
        validate_config(&config)?;
        self.apply(QueueAction::UpdateAllConfigs(config))
    }

    pub fn handle_event(&mut self, event: WorkerEvent) -> QueueResult<()> {
        self.apply(QueueAction::Event(event))
    }

    /// Waits for the next event from the execution context.
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    /// Starts the queue and applies events until nothing is in flight.
    pub async fn run_until_idle(&mut self) -> QueueResult<BatchSummary> {
        self.start()?;
        while self.state.in_flight().is_some() {
            let event = self.next_event().await.ok_or(WorkerError::ContextClosed)?;
            self.handle_event(event)?;
        }

        let summary = self.summary();
        info!(
            "Batch finished: {} completed, {} failed, {} pending",
            summary.completed, summary.failed, summary.pending
        );
        Ok(summary)
    }

    pub fn jobs(&self) -> &[Job] {
        self.state.jobs()
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.state.job(id)
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn summary(&self) -> BatchSummary {
        self.state.summary()
    }

    pub fn completed(&self) -> impl Iterator<Item = &Job> {
        self.jobs()
            .iter()
            .filter(|job| job.status() == JobStatus::Completed)
    }

    fn apply(&mut self, action: QueueAction) -> QueueResult<()> {
        let effects = self.state.reduce(action)?;
        self.execute(effects)
    }

    fn execute(&mut self, effects: Vec<Effect>) -> QueueResult<()> {
        for effect in effects {
            match effect {
                Effect::Dispatch(message) => {
                    let id = message.job_id();
                    if let Err(e) = self.context.post(message) {
                        warn!("Failed to dispatch job {}: {}", id, e);
                        self.state.reduce(QueueAction::DispatchFailed {
                            id,
                            error: e.to_string(),
                        })?;
                        return Err(e.into());
                    }
                }
                Effect::ReleasePreview(preview) => {
                    debug!("Releasing preview {}", preview.0);
                    self.previews.release(&preview);
                }
            }
        }
        Ok(())
    }
}
