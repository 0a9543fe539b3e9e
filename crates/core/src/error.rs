//! Error types for the autodecomp pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Fragment not materialized: {0}")]
    FragmentMissing(PathBuf),

    #[error("Decompiler failed on {fragment} ({status}): {stderr}")]
    DecompileFailed {
        fragment: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Parser error: {0}")]
    Parse(String),

    #[error("Build failed ({status}): {stderr}")]
    BuildFailed { status: String, stderr: String },

    #[error("Invalid line {line} (file has {len} lines)")]
    InvalidLine { line: usize, len: usize },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn build_failed(status: impl ToString, stderr: impl Into<String>) -> Self {
        Self::BuildFailed {
            status: status.to_string(),
            stderr: stderr.into(),
        }
    }
}
