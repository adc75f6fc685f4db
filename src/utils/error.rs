//! Error types for the compressor.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::borrow::Borrow;
use std::io;
use serde::Serialize;
use thiserror::Error;

/// Validation errors for submitted configurations and inputs.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum ValidationError {
    /// Invalid compression settings
    #[error("Settings error: {0}")]
    Settings(String),
    /// Input cannot be used as a job source
    #[error("Input error: {0}")]
    Input(String),
}

/// Main error type for a single compression job.
///
/// Every variant ends up as the message of an `error` event, so the
/// `Display` output is what the user sees next to the failed job.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum OptimizerError {
    /// Configuration or input validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The source bytes could not be decoded as an image
    #[error("Decode error: {0}")]
    Decode(String),

    /// The codec failed to produce output bytes
    #[error("Encode error: {0}")]
    Encode(String),

    /// Unsupported or invalid image format
    #[error("Format error: {0}")]
    Format(String),

    /// Size-mode search never produced anything smaller than the original
    #[error(
        "Compression failed: tried {} times without shrinking the file. Original size {} KB, best result {} KB",
        .attempts,
        kib(.original_size),
        kib(.best_size)
    )]
    Convergence {
        attempts: u32,
        original_size: u64,
        best_size: u64,
    },

    /// A single-attempt mode produced output that is not smaller than the input
    #[error(
        "Compression failed: compressed size {} KB >= original size {} KB",
        kib(.compressed_size),
        kib(.original_size)
    )]
    NoImprovement {
        original_size: u64,
        compressed_size: u64,
    },

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),
}

/// Convenience result type for compressor operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

fn kib(bytes: impl Borrow<u64>) -> String {
    format!("{:.2}", *bytes.borrow() as f64 / 1024.0)
}

// Helper methods for error creation
impl OptimizerError {
    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }

    pub fn settings<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::Settings(msg.into()))
    }

    pub fn input<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::Input(msg.into()))
    }
}

// Convert std::io::Error to OptimizerError
impl From<io::Error> for OptimizerError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<image::ImageError> for OptimizerError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(e) => Self::Decode(e.to_string()),
            image::ImageError::Encoding(e) => Self::Encode(e.to_string()),
            image::ImageError::Unsupported(e) => Self::Format(e.to_string()),
            image::ImageError::IoError(e) => Self::IO(e.to_string()),
            other => Self::Encode(other.to_string()),
        }
    }
}
