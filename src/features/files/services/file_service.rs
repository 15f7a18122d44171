use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::features::files::error::FileError;
use crate::features::files::hooks::{BlobRemoveHook, BlobWriteHook};
use crate::features::files::models::{
    DeletedFile, FileInfo, FileRecord, NewFileRecord, RetrievedFile, UploadContent, UploadedFile,
};
use crate::features::files::repositories::{FileRepository, RepositoryError};
use crate::features::files::validation::{RequestValidator, StructuralValidator};
use crate::modules::identifier::{IdGenerator, UuidV7Generator};
use crate::modules::storage::{BlobError, BlobStore, DatePartition, LocationStrategy};
use crate::shared::types::PaginationQuery;

/// Service for file operations
///
/// Keeps a metadata record and its blob in agreement: the blob is written or
/// removed from inside the repository's commit, so a record never commits
/// without its blob side effect having succeeded.
pub struct FileService {
    repository: Arc<dyn FileRepository>,
    blob_store: Arc<dyn BlobStore>,
    location: Arc<dyn LocationStrategy>,
    id_generator: Arc<dyn IdGenerator>,
    validator: Arc<dyn RequestValidator>,
    destination_root: PathBuf,
    dir_mode: u32,
    operation_timeout: Option<Duration>,
}

impl FileService {
    pub fn new(
        repository: Arc<dyn FileRepository>,
        blob_store: Arc<dyn BlobStore>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            repository,
            blob_store,
            location: Arc::new(DatePartition),
            id_generator: Arc::new(UuidV7Generator),
            validator: Arc::new(StructuralValidator),
            destination_root: config.upload_root.clone(),
            dir_mode: config.dir_mode,
            operation_timeout: config.operation_timeout,
        }
    }

    #[cfg(test)]
    pub fn with_location(mut self, location: Arc<dyn LocationStrategy>) -> Self {
        self.location = location;
        self
    }

    #[cfg(test)]
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    #[cfg(test)]
    pub fn with_validator(mut self, validator: Arc<dyn RequestValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Store new content and its metadata
    ///
    /// # Arguments
    /// * `content` - The bytes or stream to store; `None` is rejected
    /// * `info` - Name, mimetype, extension and size supplied by the caller
    ///
    /// # Returns
    /// The persisted record's fields and the time the blob was written
    pub async fn upload(
        &self,
        content: Option<UploadContent>,
        info: FileInfo,
    ) -> Result<UploadedFile, FileError> {
        self.with_deadline("upload", self.upload_inner(content, info))
            .await
    }

    async fn upload_inner(
        &self,
        content: Option<UploadContent>,
        info: FileInfo,
    ) -> Result<UploadedFile, FileError> {
        self.validator
            .validate_upload(content.as_ref(), &info, &self.destination_root)
            .map_err(FileError::InvalidParameter)?;
        let Some(content) = content else {
            return Err(FileError::InvalidParameter(
                "no file content supplied".to_string(),
            ));
        };

        let directory = self.ensure_partition().await?;

        // Buffered so the blob is written at most once, inside the commit
        let data = match content {
            UploadContent::Bytes(data) => data,
            UploadContent::Stream(mut reader) => {
                let mut data = Vec::new();
                reader
                    .read_to_end(&mut data)
                    .await
                    .map_err(|e| FileError::Io(format!("failed to read upload stream: {}", e)))?;
                data
            }
        };

        if data.len() as i64 != info.size {
            warn!(
                "Upload '{}' declared {} bytes but carried {}",
                info.name,
                info.size,
                data.len()
            );
        }

        let unique_id = self.id_generator.generate()?;
        let path = blob_path(&directory, &unique_id, &info.extension)?;

        let record = NewFileRecord {
            unique_id,
            path,
            name: info.name,
            mimetype: info.mimetype,
            extension: info.extension,
            size: info.size,
            created_at: Utc::now(),
        };

        let mut hook = BlobWriteHook::new(Arc::clone(&self.blob_store), data);
        let created = self
            .repository
            .create(record, &mut hook)
            .await
            .map_err(classify)?;

        info!(
            "File uploaded: id={}, path={}, size={}",
            created.unique_id, created.path, created.size
        );

        Ok(UploadedFile {
            uploaded_at: hook.written_at().unwrap_or(created.created_at),
            id: created.unique_id,
            name: created.name,
            path: created.path,
            mimetype: created.mimetype,
            extension: created.extension,
            size: created.size,
        })
    }

    /// Open a live file for reading
    ///
    /// A record whose blob has vanished from disk is reported as not found.
    pub async fn retrieve(&self, file_id: &str) -> Result<RetrievedFile, FileError> {
        self.with_deadline("retrieve", self.retrieve_inner(file_id))
            .await
    }

    async fn retrieve_inner(&self, file_id: &str) -> Result<RetrievedFile, FileError> {
        let record = self.live_record(file_id).await?;

        let reader = self
            .blob_store
            .open(Path::new(&record.path))
            .await
            .map_err(|e| match e {
                BlobError::NotFound(path) => {
                    warn!(
                        "Metadata/blob divergence: file {} has no blob at {}",
                        record.unique_id,
                        path.display()
                    );
                    not_found(&record.unique_id)
                }
                other => FileError::from(other),
            })?;

        debug!("File retrieved: id={}", record.unique_id);
        Ok(RetrievedFile { reader, record })
    }

    /// Metadata of a live file, without opening its blob
    pub async fn describe(&self, file_id: &str) -> Result<FileRecord, FileError> {
        self.with_deadline("describe", self.live_record(file_id))
            .await
    }

    /// Remove a file's blob and soft-delete its record
    ///
    /// # Returns
    /// The deletion timestamp
    pub async fn delete(&self, file_id: &str) -> Result<DeletedFile, FileError> {
        self.with_deadline("delete", self.delete_inner(file_id))
            .await
    }

    async fn delete_inner(&self, file_id: &str) -> Result<DeletedFile, FileError> {
        self.validator
            .validate_id(file_id)
            .map_err(FileError::InvalidParameter)?;

        let mut hook = BlobRemoveHook::new(Arc::clone(&self.blob_store));
        let deleted = self
            .repository
            .delete(file_id, &mut hook)
            .await
            .map_err(classify)?;

        let deleted_at = deleted
            .deleted_at
            .or_else(|| hook.removed_at())
            .unwrap_or_else(Utc::now);

        info!(
            "File soft deleted: id={}, path={}",
            deleted.unique_id, deleted.path
        );

        Ok(DeletedFile {
            id: deleted.unique_id,
            deleted_at,
        })
    }

    /// Page of live files, newest first, with the total live count
    pub async fn list(
        &self,
        query: &PaginationQuery,
    ) -> Result<(Vec<FileRecord>, i64), FileError> {
        let listing = async {
            self.repository
                .list(query.offset(), query.limit())
                .await
                .map_err(classify)
        };
        self.with_deadline("list", listing).await
    }

    async fn live_record(&self, file_id: &str) -> Result<FileRecord, FileError> {
        self.validator
            .validate_id(file_id)
            .map_err(FileError::InvalidParameter)?;

        let record = self
            .repository
            .retrieve(file_id)
            .await
            .map_err(classify)?;

        if record.is_deleted() {
            return Err(not_found(file_id));
        }

        Ok(record)
    }

    /// Make sure today's partition directory exists, returning it
    async fn ensure_partition(&self) -> Result<PathBuf, FileError> {
        let directory = self.destination_root.join(self.location.current_location());

        let exists = self
            .blob_store
            .dir_exists(&directory)
            .await
            .map_err(|e| FileError::Io(e.to_string()))?;

        if !exists {
            self.blob_store
                .create_dir(&directory, self.dir_mode)
                .await
                .map_err(|e| FileError::Io(e.to_string()))?;
            debug!("Partition directory created: {}", directory.display());
        }

        Ok(directory)
    }

    async fn with_deadline<T, F>(&self, operation: &str, future: F) -> Result<T, FileError>
    where
        F: Future<Output = Result<T, FileError>>,
    {
        match self.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, future).await.map_err(|_| {
                warn!("File {} abandoned after {:?}", operation, limit);
                FileError::Cancelled(format!("{} did not finish within {:?}", operation, limit))
            })?,
            None => future.await,
        }
    }
}

/// `directory/unique_id[.extension]` as a UTF-8 string
fn blob_path(directory: &Path, unique_id: &str, extension: &str) -> Result<String, FileError> {
    let file_name = if extension.is_empty() {
        unique_id.to_string()
    } else {
        format!("{}.{}", unique_id, extension)
    };

    directory
        .join(file_name)
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| {
            FileError::Io(format!(
                "upload root {} is not valid UTF-8",
                directory.display()
            ))
        })
}

fn not_found(file_id: &str) -> FileError {
    FileError::NotFound(format!("File {} not found", file_id))
}

/// Re-classify repository sentinels; everything else is transient I/O
fn classify(error: RepositoryError) -> FileError {
    match error {
        RepositoryError::NotFound(id) | RepositoryError::AlreadyDeleted(id) => not_found(&id),
        RepositoryError::Duplicate(path) => {
            FileError::AlreadyExists(format!("a file already exists at {}", path))
        }
        RepositoryError::Hook(e) => e,
        RepositoryError::Database(e) => FileError::Io(format!("metadata store error: {}", e)),
    }
}
