use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::files::models::{DeletedFile, FileRecord, UploadedFile};
use crate::shared::validation::EXTENSION_REGEX;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response DTO for a completed upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedFileDto {
    /// Opaque identifier of the stored file
    pub id: String,
    /// Original filename as uploaded
    pub name: String,
    /// Location of the blob on the storage volume
    pub path: String,
    /// MIME type of the file
    pub mimetype: String,
    /// File extension without the dot, may be empty
    pub extension: String,
    /// Size of the file in bytes
    pub size: i64,
    /// Timestamp when the blob was written
    pub uploaded_at: DateTime<Utc>,
}

impl From<UploadedFile> for UploadedFileDto {
    fn from(file: UploadedFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            path: file.path,
            mimetype: file.mimetype,
            extension: file.extension,
            size: file.size,
            uploaded_at: file.uploaded_at,
        }
    }
}

/// Descriptive fields of a stored file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileMetadataDto {
    pub id: String,
    pub name: String,
    pub path: String,
    pub mimetype: String,
    pub extension: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<FileRecord> for FileMetadataDto {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.unique_id,
            name: record.name,
            path: record.path,
            mimetype: record.mimetype,
            extension: record.extension,
            size: record.size,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedFileDto {
    /// Identifier of the deleted file
    pub id: String,
    /// Timestamp when the file was deleted
    pub deleted_at: DateTime<Utc>,
}

impl From<DeletedFile> for DeletedFileDto {
    fn from(file: DeletedFile) -> Self {
        Self {
            id: file.id,
            deleted_at: file.deleted_at,
        }
    }
}

/// MIME type used when the client sends none
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Get file extension from content type
pub fn get_extension_from_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        "text/plain" => Some("txt"),
        "application/json" => Some("json"),
        "video/mp4" => Some("mp4"),
        _ => None,
    }
}

/// Extension for a stored blob: taken from the file name when it has a usable
/// one, otherwise guessed from the content type, otherwise empty
pub fn extension_for(file_name: &str, content_type: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && EXTENSION_REGEX.is_match(ext))
        .or_else(|| get_extension_from_content_type(content_type).map(str::to_string))
        .unwrap_or_default()
}
