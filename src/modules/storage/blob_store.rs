//! Filesystem blob store
//!
//! Every operation maps a missing path to [`BlobError::NotFound`] instead of a
//! generic I/O error so callers can branch on absence.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs::{self, DirBuilder, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

/// Open read handle over a blob. The caller owns it and closes it by dropping.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("blob already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("blob I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BlobError {
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => BlobError::NotFound(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => BlobError::AlreadyExists(path.to_path_buf()),
            _ => BlobError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Filesystem-facing blob operations
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether a regular file exists at `path`
    async fn exists(&self, path: &Path) -> Result<bool, BlobError>;

    /// Open a blob for reading
    async fn open(&self, path: &Path) -> Result<BlobReader, BlobError>;

    /// Write a blob, replacing any existing content
    async fn write(&self, path: &Path, data: &[u8]) -> Result<DateTime<Utc>, BlobError>;

    /// Write a blob that must not exist yet. Losing a race against another
    /// writer yields [`BlobError::AlreadyExists`].
    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<DateTime<Utc>, BlobError>;

    /// Remove a blob, returning the removal time
    async fn remove(&self, path: &Path) -> Result<DateTime<Utc>, BlobError>;

    async fn dir_exists(&self, path: &Path) -> Result<bool, BlobError>;

    /// Create a directory and any missing parents
    async fn create_dir(&self, path: &Path, mode: u32) -> Result<DateTime<Utc>, BlobError>;
}

/// Blob store over the local (or mounted) filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBlobStore;

impl LocalBlobStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn exists(&self, path: &Path) -> Result<bool, BlobError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobError::from_io(path, e)),
        }
    }

    async fn open(&self, path: &Path) -> Result<BlobReader, BlobError> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| BlobError::from_io(path, e))?;

        debug!("Blob opened: {}", path.display());
        Ok(Box::pin(file))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<DateTime<Utc>, BlobError> {
        fs::write(path, data)
            .await
            .map_err(|e| BlobError::from_io(path, e))?;

        debug!("Blob written: {} ({} bytes)", path.display(), data.len());
        Ok(Utc::now())
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<DateTime<Utc>, BlobError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| BlobError::from_io(path, e))?;

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // The file is ours, a half-written blob must not survive
            drop(file);
            if let Err(cleanup) = fs::remove_file(path).await {
                warn!(
                    "Failed to remove partial blob {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(BlobError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }

        debug!("Blob created: {} ({} bytes)", path.display(), data.len());
        Ok(Utc::now())
    }

    async fn remove(&self, path: &Path) -> Result<DateTime<Utc>, BlobError> {
        fs::remove_file(path)
            .await
            .map_err(|e| BlobError::from_io(path, e))?;

        debug!("Blob removed: {}", path.display());
        Ok(Utc::now())
    }

    async fn dir_exists(&self, path: &Path) -> Result<bool, BlobError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobError::from_io(path, e)),
        }
    }

    async fn create_dir(&self, path: &Path, mode: u32) -> Result<DateTime<Utc>, BlobError> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;

        builder
            .create(path)
            .await
            .map_err(|e| BlobError::from_io(path, e))?;

        debug!("Directory created: {} (mode {:o})", path.display(), mode);
        Ok(Utc::now())
    }
}
