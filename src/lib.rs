// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod processing;
pub mod worker;
pub mod queue;

// Public exports for external consumers
pub use crate::core::{
    BatchSummary, CompressionConfig, CompressionResult, Dimensions, Job, JobId, JobOutput, JobStatus,
    PreviewHandle, SourceImage, TargetMode,
};
pub use processing::{AdaptiveSearch, Codec, ImageCodec, SearchLimits};
pub use queue::{JobQueue, NoopPreviewRelease, PreviewRelease, QueueError, QueueResult};
pub use utils::{
    OptimizerError, OptimizerResult, OutputFormat, SizeUnit, claim_unique_path, compressed_output_path, file_name,
    format_file_size, format_from_extension, read_source, write_output,
};
pub use worker::{ExecutionContext, InlineContext, WorkerContext, WorkerEvent, WorkerMessage};

// The command-line entry point lives in main.rs and only uses this public API.
