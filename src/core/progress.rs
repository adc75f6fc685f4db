use serde::Serialize;
use crate::core::{Job, JobStatus};

/// Aggregate view of a batch, for progress bars and the final report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Number of jobs in the store
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Mean of all job progress values (0-100)
    pub total_progress: u8,
    /// Source bytes of completed jobs
    pub original_bytes: u64,
    /// Output bytes of completed jobs
    pub compressed_bytes: u64,
}

impl BatchSummary {
    pub fn from_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut summary = Self::default();
        let mut progress_sum: u64 = 0;

        for job in jobs {
            summary.total += 1;
            progress_sum += job.progress() as u64;
            match job.status() {
                JobStatus::Pending => summary.pending += 1,
                JobStatus::Processing => summary.processing += 1,
                JobStatus::Error => summary.failed += 1,
                JobStatus::Completed => {
                    summary.completed += 1;
                    summary.original_bytes += job.original_size();
                    summary.compressed_bytes += job.output().map_or(0, |o| o.size);
                }
            }
        }

        if summary.total > 0 {
            summary.total_progress = (progress_sum as f64 / summary.total as f64).round() as u8;
        }
        summary
    }

    /// Bytes saved across completed jobs.
    pub fn saved_bytes(&self) -> u64 {
        self.original_bytes.saturating_sub(self.compressed_bytes)
    }

    /// True once nothing is left to dispatch or waiting on the worker.
    pub fn is_settled(&self) -> bool {
        self.pending == 0 && self.processing == 0
    }
}
