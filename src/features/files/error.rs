use thiserror::Error;

use crate::core::error::AppError;
use crate::modules::identifier::IdGenerationError;
use crate::modules::storage::BlobError;

/// Classification of a [`FileError`], stable for callers that branch on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParameter,
    NotFound,
    AlreadyExists,
    Io,
    Generation,
    Cancelled,
}

/// Errors returned by file operations
#[derive(Debug, Error)]
pub enum FileError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("identifier generation failed: {0}")]
    Generation(String),

    #[error("operation cancelled: {0}")]
    Cancelled(String),
}

impl FileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            FileError::NotFound(_) => ErrorKind::NotFound,
            FileError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            FileError::Io(_) => ErrorKind::Io,
            FileError::Generation(_) => ErrorKind::Generation,
            FileError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

impl From<BlobError> for FileError {
    fn from(error: BlobError) -> Self {
        match error {
            BlobError::NotFound(path) => {
                FileError::NotFound(format!("blob missing at {}", path.display()))
            }
            BlobError::AlreadyExists(path) => {
                FileError::AlreadyExists(format!("blob already present at {}", path.display()))
            }
            other @ BlobError::Io { .. } => FileError::Io(other.to_string()),
        }
    }
}

impl From<IdGenerationError> for FileError {
    fn from(error: IdGenerationError) -> Self {
        FileError::Generation(error.0)
    }
}

impl From<FileError> for AppError {
    fn from(error: FileError) -> Self {
        match error {
            FileError::InvalidParameter(msg) => AppError::Validation(msg),
            FileError::NotFound(msg) => AppError::NotFound(msg),
            FileError::AlreadyExists(msg) => AppError::Conflict(msg),
            FileError::Cancelled(msg) => AppError::Timeout(msg),
            other @ (FileError::Io(_) | FileError::Generation(_)) => {
                tracing::error!("File operation failed ({:?}): {}", other.kind(), other);
                AppError::Internal(other.to_string())
            }
        }
    }
}
