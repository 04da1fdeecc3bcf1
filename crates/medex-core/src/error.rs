//! Error types and exit codes for medex
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (backend, copy)
//! - 2: Usage error (bad flags/args, missing destination)
//! - 3: Collection/data error (missing collection, invalid frontmatter, etc.)

use std::path::PathBuf;

use thiserror::Error;

use crate::pathlike::PathLikeError;

pub type Result<T> = std::result::Result<T, MedexError>;

/// Exit codes reported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Collection/data error (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during medex operations
#[derive(Error, Debug)]
pub enum MedexError {
    // Usage errors (exit code 2)
    #[error("{0}")]
    Usage(String),

    #[error("destination folder does not exist: {path:?}")]
    DestinationMissing { path: PathBuf },

    // Collection/data errors (exit code 3)
    #[error("collection not found: {search_root:?}")]
    CollectionNotFound { search_root: PathBuf },

    #[error("invalid collection at {root:?}: {reason}")]
    InvalidCollection { root: PathBuf, reason: String },

    #[error("deck not found: {deck}")]
    DeckNotFound { deck: String },

    #[error("invalid frontmatter in {path:?}: {reason}")]
    InvalidFrontmatter { path: PathBuf, reason: String },

    #[error("invalid config in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    // Generic failures (exit code 1)
    #[error(transparent)]
    PathLike(#[from] PathLikeError),

    #[error("failed to copy {filename} to {dest:?}: {source}")]
    Copy {
        filename: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MedexError {
    /// Exit code the CLI should report for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            MedexError::Usage(_) | MedexError::DestinationMissing { .. } => ExitCode::Usage,
            MedexError::CollectionNotFound { .. }
            | MedexError::InvalidCollection { .. }
            | MedexError::DeckNotFound { .. }
            | MedexError::InvalidFrontmatter { .. }
            | MedexError::InvalidConfig { .. } => ExitCode::Data,
            MedexError::PathLike(_) | MedexError::Copy { .. } => ExitCode::Failure,
        }
    }
}
