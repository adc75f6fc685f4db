//! Single-concurrency job queue.
//!
//! - [`state`]: the reducer that owns the jobs and the in-flight slot
//! - [`coordinator`]: [`JobQueue`], which carries out the reducer's effects

pub mod coordinator;
pub mod state;
mod error;

pub use coordinator::{JobQueue, NoopPreviewRelease, PreviewRelease};
pub use error::{QueueError, QueueResult};
pub use state::{Effect, QueueAction, QueueState};
