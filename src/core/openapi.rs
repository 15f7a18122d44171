use utoipa::{Modify, OpenApi};

use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::get_file_metadata,
        files_handlers::download_file,
        files_handlers::delete_file,
    ),
    components(
        schemas(
            Meta,
            files_dtos::UploadFileDto,
            files_dtos::UploadedFileDto,
            files_dtos::FileMetadataDto,
            files_dtos::DeletedFileDto,
            ApiResponse<files_dtos::UploadedFileDto>,
            ApiResponse<files_dtos::FileMetadataDto>,
            ApiResponse<Vec<files_dtos::FileMetadataDto>>,
            ApiResponse<files_dtos::DeletedFileDto>,
        )
    ),
    tags(
        (name = "files", description = "File upload, retrieval and deletion"),
    ),
    info(
        title = "Berkas API",
        version = "0.1.0",
        description = "API documentation for Berkas file storage",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
