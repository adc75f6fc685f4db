//! Core domain types and the job record store.
//!
//! - [`CompressionConfig`]: per-job compression settings
//! - [`CompressionResult`]: outcome of compressing one image
//! - [`Job`]: one submitted image and its lifecycle
//! - [`JobStore`]: jobs in submission order
//! - [`BatchSummary`]: aggregate progress of a batch

mod types;
mod job;
mod store;
mod progress;

pub use types::{
    BYTES_PER_MB, CompressionConfig, CompressionResult, Dimensions, TargetMode, compression_ratio,
};
pub use job::{Job, JobId, JobOutput, JobStatus, PreviewHandle, SourceImage, TransitionError};
pub use store::JobStore;
pub use progress::BatchSummary;
