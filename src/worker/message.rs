//! Messages exchanged between the queue and the execution context.
//!
//! On the wire each message is `{"type": "<kind>", "data": {...}}` with
//! camelCase fields.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::core::{CompressionConfig, CompressionResult, JobId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressPayload {
    pub id: JobId,
    pub image_bytes: Arc<[u8]>,
    pub config: CompressionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub id: JobId,
    /// Whole percentage; receivers clamp it to `0..=100`
    pub progress: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletePayload {
    pub id: JobId,
    pub result: CompressionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub id: JobId,
    pub error: String,
}

/// Any message of the protocol, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WorkerMessage {
    Compress(CompressPayload),
    Progress(ProgressPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl WorkerMessage {
    pub fn compress(id: JobId, image_bytes: Arc<[u8]>, config: CompressionConfig) -> Self {
        Self::Compress(CompressPayload {
            id,
            image_bytes,
            config,
        })
    }

    pub fn job_id(&self) -> JobId {
        match self {
            Self::Compress(p) => p.id,
            Self::Progress(p) => p.id,
            Self::Complete(p) => p.id,
            Self::Error(p) => p.id,
        }
    }

    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Compress(_) => "compress",
            Self::Progress(_) => "progress",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }
}

/// What the execution context reports back about a job.
///
/// For every `compress` message the context emits zero or more `Progress`
/// events followed by exactly one `Complete` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WorkerEvent {
    Progress(ProgressPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl WorkerEvent {
    pub fn progress(id: JobId, progress: impl Into<i64>) -> Self {
        Self::Progress(ProgressPayload {
            id,
            progress: progress.into(),
        })
    }

    pub fn complete(id: JobId, result: CompressionResult) -> Self {
        Self::Complete(CompletePayload { id, result })
    }

    pub fn error(id: JobId, error: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            id,
            error: error.into(),
        })
    }

    pub fn job_id(&self) -> JobId {
        match self {
            Self::Progress(p) => p.id,
            Self::Complete(p) => p.id,
            Self::Error(p) => p.id,
        }
    }

    /// True for `Complete` and `Error`, which end a job's processing.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

impl From<WorkerEvent> for WorkerMessage {
    fn from(event: WorkerEvent) -> Self {
        match event {
            WorkerEvent::Progress(p) => Self::Progress(p),
            WorkerEvent::Complete(p) => Self::Complete(p),
            WorkerEvent::Error(p) => Self::Error(p),
        }
    }
}
