//! Job definition and its lifecycle transitions.

use std::fmt;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::core::{CompressionConfig, CompressionResult};

/// Opaque, unique identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Jobs the coordinator may still dispatch.
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        })
    }
}

/// Handle to a display resource (thumbnail, object URL, ...) owned by
/// whoever renders the job. Released when the job goes away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewHandle(pub String);

/// An image handed to `submit`.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub name: String,
    pub bytes: Vec<u8>,
    pub preview: Option<PreviewHandle>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: PreviewHandle) -> Self {
        self.preview = Some(preview);
        self
    }
}

/// Output attached to a completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    pub bytes: Vec<u8>,
    pub size: u64,
    pub ratio: i32,
    /// Source bytes handed back unchanged
    pub passthrough: bool,
}

/// A lifecycle transition that the job's current status does not allow.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Job {id} cannot {action} while {status}")]
pub struct TransitionError {
    pub id: JobId,
    pub status: JobStatus,
    pub action: &'static str,
}

/// One submitted image plus its configuration and lifecycle state.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    name: String,
    source: Arc<[u8]>,
    original_size: u64,
    status: JobStatus,
    progress: u8,
    config: CompressionConfig,
    preview: Option<PreviewHandle>,
    output: Option<JobOutput>,
    error: Option<String>,
}

impl Job {
    pub fn new(image: SourceImage, config: CompressionConfig) -> Self {
        let original_size = image.bytes.len() as u64;
        Self {
            id: JobId::new(),
            name: image.name,
            source: Arc::from(image.bytes),
            original_size,
            status: JobStatus::Pending,
            progress: 0,
            config,
            preview: image.preview,
            output: None,
            error: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn output(&self) -> Option<&JobOutput> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shared view of the source bytes for a dispatch message.
    pub fn source(&self) -> Arc<[u8]> {
        Arc::clone(&self.source)
    }

    pub(crate) fn take_preview(&mut self) -> Option<PreviewHandle> {
        self.preview.take()
    }

    fn reject(&self, action: &'static str) -> TransitionError {
        TransitionError {
            id: self.id,
            status: self.status,
            action,
        }
    }

    pub(crate) fn mark_processing(&mut self) -> Result<(), TransitionError> {
        if !self.status.is_eligible() {
            return Err(self.reject("start processing"));
        }
        self.status = JobStatus::Processing;
        Ok(())
    }

    pub(crate) fn set_progress(&mut self, progress: i64) {
        self.progress = progress.clamp(0, 100) as u8;
    }

    /// Attaches a result. A result that is unsuccessful or larger than the
    /// source turns the job into an error instead.
    pub(crate) fn complete(&mut self, result: CompressionResult) {
        if !result.success {
            self.fail("Compression reported failure without an error message");
            return;
        }
        let size = result.bytes.len() as u64;
        if size > self.original_size {
            self.fail(format!(
                "Compressed size {} bytes exceeds original size {} bytes",
                size, self.original_size
            ));
            return;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.error = None;
        self.output = Some(JobOutput {
            bytes: result.bytes,
            size,
            ratio: result.ratio,
            passthrough: result.passthrough,
        });
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.progress = 0;
        self.output = None;
        self.error = Some(message.into());
    }

    pub(crate) fn reset_for_retry(&mut self) -> Result<(), TransitionError> {
        if self.status != JobStatus::Error {
            return Err(self.reject("retry"));
        }
        self.status = JobStatus::Pending;
        self.progress = 0;
        self.error = None;
        Ok(())
    }

    pub(crate) fn replace_config(&mut self, config: CompressionConfig) -> Result<(), TransitionError> {
        if !matches!(self.status, JobStatus::Pending | JobStatus::Error) {
            return Err(self.reject("change its configuration"));
        }
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(bytes: usize) -> Job {
        Job::new(SourceImage::new("a.jpg", vec![7; bytes]), CompressionConfig::default())
    }

    fn result(bytes: usize, original: u64) -> CompressionResult {
        CompressionResult::new(vec![1; bytes], original, 1, None)
    }

    #[test]
    fn new_job_is_pending() {
        let job = job(10);
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.progress(), 0);
        assert_eq!(job.original_size(), 10);
        assert_eq!(&*job.source(), &[7u8; 10][..]);
    }

    #[test]
    fn progress_is_clamped() {
        let mut job = job(10);
        job.set_progress(250);
        assert_eq!(job.progress(), 100);
        job.set_progress(-3);
        assert_eq!(job.progress(), 0);
    }

    #[test]
    fn complete_attaches_output() {
        let mut job = job(10);
        job.mark_processing().unwrap();
        job.complete(result(4, 10));
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.progress(), 100);
        let output = job.output().unwrap();
        assert_eq!(output.size, 4);
        assert_eq!(output.ratio, 60);
        assert!(!output.passthrough);
    }

    #[test]
    fn passthrough_flag_reaches_output() {
        let mut job = job(10);
        job.mark_processing().unwrap();
        job.complete(CompressionResult::passthrough(&[0; 10], 0));
        assert!(job.output().unwrap().passthrough);
    }

    #[test]
    fn larger_result_becomes_error() {
        let mut job = job(10);
        job.mark_processing().unwrap();
        job.complete(result(11, 10));
        assert_eq!(job.status(), JobStatus::Error);
        assert!(job.output().is_none());
        assert!(job.error().unwrap().contains("exceeds original size"));
    }

    #[test]
    fn retry_only_from_error() {
        let mut job = job(10);
        let err = job.reset_for_retry().unwrap_err();
        assert_eq!(err.status, JobStatus::Pending);

        job.mark_processing().unwrap();
        job.fail("boom");
        assert_eq!(job.error(), Some("boom"));
        job.reset_for_retry().unwrap();
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.error(), None);
    }

    #[test]
    fn config_frozen_once_processing() {
        let mut job = job(10);
        let config = CompressionConfig { max_size_mb: 3.0, ..Default::default() };
        job.replace_config(config.clone()).unwrap();
        assert_eq!(job.config().max_size_mb, 3.0);

        job.mark_processing().unwrap();
        assert!(job.replace_config(config).is_err());
    }

    #[test]
    fn completed_job_cannot_be_dispatched_again() {
        let mut job = job(10);
        job.mark_processing().unwrap();
        job.complete(result(5, 10));
        assert!(job.mark_processing().is_err());
    }
}
