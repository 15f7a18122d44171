use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{
    extension_for, DeletedFileDto, FileMetadataDto, UploadFileDto, UploadedFileDto,
    DEFAULT_MIME_TYPE,
};
use crate::features::files::models::{FileInfo, UploadContent};
use crate::features::files::routes::FileState;
use crate::modules::storage::BlobReader;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Bytes read from a blob per response chunk
const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;
/// Chunks buffered between the blob reader task and the response body
const DOWNLOAD_CHANNEL_CAPACITY: usize = 8;

/// Upload a file
///
/// Accepts multipart/form-data with a `file` part. The extension is taken
/// from the part's file name.
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<UploadedFileDto>),
        (status = 400, description = "Missing file or invalid metadata"),
        (status = 409, description = "A blob already exists at the generated path"),
        (status = 413, description = "File exceeds the upload size limit")
    )
)]
pub async fn upload_file(
    State(state): State<FileState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadedFileDto>>)> {
    let mut content: Option<UploadContent> = None;
    let mut file_name = "unnamed".to_string();
    let mut content_type = DEFAULT_MIME_TYPE.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart data", e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        if let Some(ct) = field.content_type() {
            content_type = ct.to_string();
        }
        if let Some(fname) = field.file_name().filter(|s| !s.is_empty()) {
            file_name = fname.to_string();
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file data", e))?;

        if data.len() > state.max_upload_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                state.max_upload_size,
                state.max_upload_size / 1024 / 1024
            )));
        }

        content = Some(UploadContent::Bytes(data.to_vec()));
    }

    let size = match &content {
        Some(UploadContent::Bytes(data)) => data.len() as i64,
        _ => 0,
    };
    let info = FileInfo {
        extension: extension_for(&file_name, &content_type),
        name: file_name,
        mimetype: content_type,
        size,
    };

    let uploaded = state.service.upload(content, info).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(uploaded.into()), None, None)),
    ))
}

/// List stored files
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Live files, newest first", body = ApiResponse<Vec<FileMetadataDto>>)
    )
)]
pub async fn list_files(
    State(state): State<FileState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FileMetadataDto>>>> {
    let (records, total) = state.service.list(&query).await?;
    let files = records.into_iter().map(FileMetadataDto::from).collect();

    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Get a file's metadata
#[utoipa::path(
    get,
    path = "/api/files/{id}/metadata",
    tag = "files",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "File metadata", body = ApiResponse<FileMetadataDto>),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file_metadata(
    State(state): State<FileState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileMetadataDto>>> {
    let record = state.service.describe(&id).await?;

    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

/// Download a file's content
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_file(
    State(state): State<FileState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let retrieved = state.service.retrieve(&id).await?;
    let record = retrieved.record;

    let content_type = HeaderValue::from_str(&record.mimetype)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_MIME_TYPE));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition(&record.name))
        .body(blob_body(retrieved.reader))
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeletedFileDto>),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_file(
    State(state): State<FileState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedFileDto>>> {
    let deleted = state.service.delete(&id).await?;

    Ok(Json(ApiResponse::success(
        Some(deleted.into()),
        Some("File deleted successfully".to_string()),
        None,
    )))
}

/// Body-limit rejections keep their 413, anything else is a malformed request
fn multipart_error(context: &str, error: MultipartError) -> AppError {
    debug!("{}: {}", context, error);
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, error.body_text()))
    } else {
        AppError::BadRequest(format!("{}: {}", context, error.body_text()))
    }
}

/// Stream a blob into a response body from a reader task
fn blob_body(mut reader: BlobReader) -> Body {
    let (tx, rx) = mpsc::channel::<std::io::Result<Bytes>>(DOWNLOAD_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                        debug!("Download receiver dropped, stopping blob read");
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    Body::from_stream(ReceiverStream::new(rx))
}

/// `inline` disposition carrying an ASCII-safe version of the original name
fn content_disposition(name: &str) -> HeaderValue {
    let safe: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    HeaderValue::from_str(&format!("inline; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"))
}
