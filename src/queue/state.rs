//! Queue state and the reducer that moves it forward.
//!
//! Every change to the queue is a [`QueueAction`] applied by
//! [`QueueState::reduce`]. The reducer never talks to the execution context
//! itself; it returns [`Effect`]s for the coordinator to carry out.

use tracing::{debug, info, warn};

use crate::core::{BatchSummary, CompressionConfig, Job, JobId, JobStatus, JobStore, PreviewHandle};
use crate::worker::{WorkerEvent, WorkerMessage};

use super::error::{QueueError, QueueResult};

#[derive(Debug, Clone)]
pub enum QueueAction {
    /// Append already-built jobs in order
    Submit(Vec<Job>),
    Start,
    Event(WorkerEvent),
    Retry(JobId),
    Remove(JobId),
    Clear,
    UpdateConfig(JobId, CompressionConfig),
    /// Replace the config of every pending or failed job
    UpdateAllConfigs(CompressionConfig),
    /// Posting the in-flight job failed; it never reached the context
    DispatchFailed { id: JobId, error: String },
}

/// Side effect requested by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Dispatch(WorkerMessage),
    ReleasePreview(PreviewHandle),
}

#[derive(Debug, Default, Clone)]
pub struct QueueState {
    store: JobStore,
    running: bool,
    /// The job the execution context is working on. At most one job is
    /// ever dispatched, and the slot stays taken until its terminal event
    /// arrives, even if the job has been removed in the meantime.
    in_flight: Option<JobId>,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> &[Job] {
        self.store.as_slice()
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.store.get(id)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn in_flight(&self) -> Option<JobId> {
        self.in_flight
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_jobs(self.store.iter())
    }

    pub fn reduce(&mut self, action: QueueAction) -> QueueResult<Vec<Effect>> {
        match action {
            QueueAction::Submit(jobs) => {
                debug!("Queued {} job(s)", jobs.len());
                jobs.into_iter().for_each(|job| self.store.push(job));
                Ok(Vec::new())
            }
            QueueAction::Start => Ok(self.start()),
            QueueAction::Event(event) => Ok(self.apply_event(event)),
            QueueAction::Retry(id) => {
                self.job_mut(id)?.reset_for_retry()?;
                debug!("Job {} reset for retry", id);
                Ok(Vec::new())
            }
            QueueAction::Remove(id) => {
                let mut job = self.store.remove(id).ok_or(QueueError::JobNotFound(id))?;
                if self.in_flight == Some(id) {
                    debug!("Removed in-flight job {}; its result will be discarded", id);
                }
                Ok(job.take_preview().map(Effect::ReleasePreview).into_iter().collect())
            }
            QueueAction::Clear => {
                let effects = self
                    .store
                    .drain()
                    .into_iter()
                    .filter_map(|mut job| job.take_preview())
                    .map(Effect::ReleasePreview)
                    .collect();
                self.running = false;
                Ok(effects)
            }
            QueueAction::UpdateConfig(id, config) => {
                self.job_mut(id)?.replace_config(config)?;
                Ok(Vec::new())
            }
            QueueAction::UpdateAllConfigs(config) => {
                let updated = self
                    .store
                    .iter_mut()
                    .filter_map(|job| job.replace_config(config.clone()).ok())
                    .count();
                debug!("Updated config of {} job(s)", updated);
                Ok(Vec::new())
            }
            QueueAction::DispatchFailed { id, error } => {
                if let Some(job) = self.store.get_mut(id) {
                    job.fail(error);
                }
                if self.in_flight == Some(id) {
                    self.in_flight = None;
                }
                self.running = false;
                Ok(Vec::new())
            }
        }
    }

    fn job_mut(&mut self, id: JobId) -> QueueResult<&mut Job> {
        self.store.get_mut(id).ok_or(QueueError::JobNotFound(id))
    }

    fn start(&mut self) -> Vec<Effect> {
        if !self.store.has_eligible() {
            debug!("Nothing to process");
            return Vec::new();
        }
        if !self.running {
            info!(
                "Starting queue with {} pending job(s)",
                self.store.count(JobStatus::Pending)
            );
        }
        self.running = true;
        self.dispatch_next()
    }

    /// Dispatches the first eligible job if the slot is free. Clears
    /// `running` when nothing is left.
    fn dispatch_next(&mut self) -> Vec<Effect> {
        if let Some(busy) = self.in_flight {
            debug!("Job {} still in flight, not dispatching", busy);
            return Vec::new();
        }

        let Some(job) = self
            .store
            .first_eligible()
            .and_then(|id| self.store.get_mut(id))
        else {
            info!("Queue drained");
            self.running = false;
            return Vec::new();
        };

        if let Err(e) = job.mark_processing() {
            warn!("Skipping dispatch: {}", e);
            return Vec::new();
        }
        let id = job.id();
        debug!("Dispatching job {} ({})", id, job.name());
        let message = WorkerMessage::compress(id, job.source(), job.config().clone());
        self.in_flight = Some(id);
        vec![Effect::Dispatch(message)]
    }

    fn apply_event(&mut self, event: WorkerEvent) -> Vec<Effect> {
        let id = event.job_id();
        let job = self
            .store
            .get_mut(id)
            .filter(|job| job.status() == JobStatus::Processing);

        match (event, job) {
            (WorkerEvent::Progress(payload), Some(job)) => {
                job.set_progress(payload.progress);
                return Vec::new();
            }
            (WorkerEvent::Progress(_), None) => return Vec::new(),
            (WorkerEvent::Complete(payload), Some(job)) => {
                job.complete(payload.result);
                match job.status() {
                    JobStatus::Completed => info!(
                        "{} compressed: {} → {} bytes",
                        job.name(),
                        job.original_size(),
                        job.output().map_or(0, |o| o.size)
                    ),
                    _ => warn!("{} rejected: {}", job.name(), job.error().unwrap_or_default()),
                }
            }
            (WorkerEvent::Error(payload), Some(job)) => {
                warn!("{} failed: {}", job.name(), payload.error);
                job.fail(payload.error);
            }
            (_, None) => debug!("Discarding result for job {} that is no longer queued", id),
        }

        self.finish(id)
    }

    /// Releases the slot after a terminal event and advances if running.
    fn finish(&mut self, id: JobId) -> Vec<Effect> {
        if self.in_flight == Some(id) {
            self.in_flight = None;
        } else {
            debug!("Terminal event for job {} that was not in flight", id);
        }

        if self.running {
            self.dispatch_next()
        } else {
            Vec::new()
        }
    }
}
