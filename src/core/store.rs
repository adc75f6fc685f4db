//! Ordered collection of submitted jobs.

use crate::core::{Job, JobId, JobStatus};

/// Jobs in submission order.
///
/// Order matters: the coordinator always dispatches the first eligible job,
/// which keeps the queue fair across submissions.
#[derive(Debug, Default, Clone)]
pub struct JobStore {
    jobs: Vec<Job>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id() == id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.id() == id)
    }

    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.id() == id)?;
        Some(self.jobs.remove(index))
    }

    /// Removes every job, returning them in order.
    pub fn drain(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.iter_mut()
    }

    pub fn as_slice(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// First job, in collection order, that is pending or processing.
    pub fn first_eligible(&self) -> Option<JobId> {
        self.jobs
            .iter()
            .find(|job| job.status().is_eligible())
            .map(Job::id)
    }

    pub fn has_eligible(&self) -> bool {
        self.first_eligible().is_some()
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|job| job.status() == status).count()
    }
}
