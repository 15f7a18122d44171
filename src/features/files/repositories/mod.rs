//! Persistence of file metadata
//!
//! Mutating operations take a [`CommitHook`] and must invoke it before the
//! mutation commits, persisting nothing when the hook fails.

#[cfg(test)]
mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::features::files::error::FileError;
use crate::features::files::hooks::CommitHook;
use crate::features::files::models::{FileRecord, NewFileRecord};

#[cfg(test)]
pub use memory::MemoryFileRepository;
pub use postgres::PgFileRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record already deleted: {0}")]
    AlreadyDeleted(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Hook(FileError),
}

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a record, writing its blob through `hook` before committing
    async fn create(
        &self,
        record: NewFileRecord,
        hook: &mut dyn CommitHook,
    ) -> Result<FileRecord, RepositoryError>;

    /// Fetch a record by id, soft-deleted ones included
    async fn retrieve(&self, unique_id: &str) -> Result<FileRecord, RepositoryError>;

    /// Soft-delete a live record, removing its blob through `hook` first.
    /// `deleted_at` is the timestamp the hook returned.
    async fn delete(
        &self,
        unique_id: &str,
        hook: &mut dyn CommitHook,
    ) -> Result<FileRecord, RepositoryError>;

    /// Live records, newest first, plus the total live count
    async fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<FileRecord>, i64), RepositoryError>;
}
