//! Commit hooks that tie a blob side effect to a metadata mutation
//!
//! A repository stages its mutation, calls [`CommitHook::prepare`] to perform
//! the blob side effect, and only commits the mutation if `prepare`
//! succeeded. If the commit itself fails afterwards it calls
//! [`CommitHook::abort`]; otherwise [`CommitHook::commit`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::features::files::error::FileError;
use crate::features::files::models::FileRecord;
use crate::modules::storage::BlobStore;

#[async_trait]
pub trait CommitHook: Send {
    /// Perform the blob side effect for `record`, returning when it happened
    async fn prepare(&mut self, record: &FileRecord) -> Result<DateTime<Utc>, FileError>;

    /// The metadata mutation committed
    async fn commit(&mut self) {}

    /// The metadata mutation failed after `prepare` succeeded
    async fn abort(&mut self);
}

/// Writes the buffered upload to the record's path, refusing to overwrite
pub struct BlobWriteHook {
    store: Arc<dyn BlobStore>,
    data: Vec<u8>,
    written: Option<(PathBuf, DateTime<Utc>)>,
}

impl BlobWriteHook {
    pub fn new(store: Arc<dyn BlobStore>, data: Vec<u8>) -> Self {
        Self {
            store,
            data,
            written: None,
        }
    }

    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        self.written.as_ref().map(|(_, at)| *at)
    }
}

#[async_trait]
impl CommitHook for BlobWriteHook {
    async fn prepare(&mut self, record: &FileRecord) -> Result<DateTime<Utc>, FileError> {
        let path = PathBuf::from(&record.path);

        if self.store.exists(&path).await? {
            return Err(FileError::AlreadyExists(format!(
                "blob already present at {}",
                path.display()
            )));
        }

        // write_new also catches a writer that slipped in after the check
        let written_at = self.store.write_new(&path, &self.data).await?;
        self.written = Some((path, written_at));

        Ok(written_at)
    }

    async fn commit(&mut self) {
        if let Some((path, _)) = &self.written {
            debug!("Blob committed with metadata: {}", path.display());
        }
    }

    async fn abort(&mut self) {
        // Only a blob this hook wrote may be removed
        let Some((path, _)) = self.written.take() else {
            return;
        };

        match self.store.remove(&path).await {
            Ok(_) => warn!(
                "Metadata commit failed, removed freshly written blob {}",
                path.display()
            ),
            Err(e) => error!(
                "Metadata commit failed and blob {} could not be removed, left orphaned: {}",
                path.display(),
                e
            ),
        }
    }
}

/// Removes the record's blob; the record is soft-deleted only after this succeeds
pub struct BlobRemoveHook {
    store: Arc<dyn BlobStore>,
    removed: Option<(PathBuf, DateTime<Utc>)>,
}

impl BlobRemoveHook {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            removed: None,
        }
    }

    pub fn removed_at(&self) -> Option<DateTime<Utc>> {
        self.removed.as_ref().map(|(_, at)| *at)
    }
}

#[async_trait]
impl CommitHook for BlobRemoveHook {
    async fn prepare(&mut self, record: &FileRecord) -> Result<DateTime<Utc>, FileError> {
        let path = PathBuf::from(&record.path);

        if !self.store.exists(&path).await? {
            return Err(FileError::NotFound(format!(
                "blob for file {} missing at {}",
                record.unique_id,
                path.display()
            )));
        }

        let removed_at = self.store.remove(&path).await?;
        self.removed = Some((path, removed_at));

        Ok(removed_at)
    }

    async fn abort(&mut self) {
        // Removal cannot be undone; the live record now points at nothing
        if let Some((path, _)) = &self.removed {
            error!(
                "Blob {} removed but soft delete did not commit, record left without blob",
                path.display()
            );
        }
    }
}
