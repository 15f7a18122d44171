use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, get_file_metadata, list_files, upload_file,
};
use crate::features::files::services::FileService;

/// Headroom on top of the upload limit for multipart boundaries and headers
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(Clone)]
pub struct FileState {
    pub service: Arc<FileService>,
    pub max_upload_size: usize,
}

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>, max_upload_size: usize) -> Router {
    let state = FileState {
        service: file_service,
        max_upload_size,
    };

    Router::new()
        .route(
            "/api/files",
            post(upload_file)
                .layer(DefaultBodyLimit::max(
                    max_upload_size.saturating_add(MULTIPART_OVERHEAD),
                ))
                .get(list_files),
        )
        .route("/api/files/{id}", get(download_file).delete(delete_file))
        .route("/api/files/{id}/metadata", get(get_file_metadata))
        .with_state(state)
}
