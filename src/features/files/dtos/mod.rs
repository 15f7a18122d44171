pub mod file_dto;

pub use file_dto::{
    extension_for, DeletedFileDto, FileMetadataDto, UploadFileDto, UploadedFileDto,
    DEFAULT_MIME_TYPE,
};
