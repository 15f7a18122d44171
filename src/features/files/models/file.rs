use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use validator::Validate;

use crate::modules::storage::BlobReader;
use crate::shared::validation::EXTENSION_REGEX;

/// Database model for file metadata
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FileRecord {
    pub unique_id: String,
    pub path: String,
    pub name: String,
    pub mimetype: String,
    pub extension: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete marker. The blob is gone once this is set.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fields of a record about to be inserted
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub unique_id: String,
    pub path: String,
    pub name: String,
    pub mimetype: String,
    pub extension: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
impl NewFileRecord {
    /// The row as a store holding it in memory would return it
    pub fn into_record(self) -> FileRecord {
        FileRecord {
            unique_id: self.unique_id,
            path: self.path,
            name: self.name,
            mimetype: self.mimetype,
            extension: self.extension,
            size: self.size,
            created_at: self.created_at,
            updated_at: None,
            deleted_at: None,
        }
    }
}

/// Caller-supplied description of an upload
#[derive(Debug, Clone, Validate)]
pub struct FileInfo {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "mimetype must be 1-255 characters"))]
    pub mimetype: String,

    /// Appended to the blob file name, so restricted to a safe alphabet
    #[validate(regex(
        path = *EXTENSION_REGEX,
        message = "extension must be up to 16 alphanumeric characters"
    ))]
    pub extension: String,

    #[validate(range(min = 0, message = "size must not be negative"))]
    pub size: i64,
}

/// Content of an upload, either already in memory or read from a stream
pub enum UploadContent {
    Bytes(Vec<u8>),
    Stream(BlobReader),
}

impl fmt::Debug for UploadContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadContent::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            UploadContent::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub path: String,
    pub mimetype: String,
    pub extension: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// An open blob plus the record describing it
pub struct RetrievedFile {
    pub reader: BlobReader,
    pub record: FileRecord,
}

/// Result of a successful delete
#[derive(Debug, Clone)]
pub struct DeletedFile {
    pub id: String,
    pub deleted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(extension: &str) -> FileInfo {
        FileInfo {
            name: "dolphin.jpg".to_string(),
            mimetype: "image/jpeg".to_string(),
            extension: extension.to_string(),
            size: 12,
        }
    }

    #[test]
    fn test_file_info_validation() {
        assert!(info("jpg").validate().is_ok());
        assert!(info("").validate().is_ok());
        assert!(info("../etc").validate().is_err());
        assert!(info("tar.gz").validate().is_err());

        let mut unnamed = info("jpg");
        unnamed.name = String::new();
        assert!(unnamed.validate().is_err());

        let mut negative = info("jpg");
        negative.size = -1;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_new_record_into_record() {
        let record = NewFileRecord {
            unique_id: "id".to_string(),
            path: "/data/id.jpg".to_string(),
            name: "dolphin.jpg".to_string(),
            mimetype: "image/jpeg".to_string(),
            extension: "jpg".to_string(),
            size: 12,
            created_at: Utc::now(),
        }
        .into_record();

        assert!(!record.is_deleted());
        assert!(record.updated_at.is_none());
    }
}
