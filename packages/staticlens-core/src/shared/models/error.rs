//! Error types for the staticlens-core crate
//!
//! Unified error handling across all features:
//! - Categorized error kinds matching the engine stages
//! - Typed decode failures so cache version bumps stay silent rebuilds
//! - Source error chaining through `std::io::Error`

use std::path::PathBuf;
use thiserror::Error;

/// Cache decode failure detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Persisted cache was written by a different format version
    VersionMismatch { found: u32, expected: u32 },
    /// Payload did not parse as the expected document
    CorruptPayload(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::VersionMismatch { found, expected } => {
                write!(f, "cache version {found} does not match expected {expected}")
            }
            DecodeError::CorruptPayload(detail) => write!(f, "corrupt payload: {detail}"),
        }
    }
}

/// Unified error type for the core engines.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("memory mapping failed with code {0}")]
    MappingFailed(i32),

    #[error("file is empty: {0}")]
    FileEmpty(PathBuf),

    #[error("decode error: {0}")]
    Decode(DecodeError),

    #[error("path escapes the analysis root: {0}")]
    PathOutsideSandbox(PathBuf),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl CoreError {
    /// Stable machine-readable category, mirrored into per-file error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::FileNotFound(_) => "file_not_found",
            CoreError::Io(_) => "io",
            CoreError::MappingFailed(_) => "mapping_failed",
            CoreError::FileEmpty(_) => "file_empty",
            CoreError::Decode(_) => "decode",
            CoreError::PathOutsideSandbox(_) => "path_outside_sandbox",
            CoreError::Parse(_) => "parse",
            CoreError::ResourceExhausted(_) => "resource_exhausted",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
