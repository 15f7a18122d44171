mod file;

pub use file::{
    DeletedFile, FileInfo, FileRecord, NewFileRecord, RetrievedFile, UploadContent, UploadedFile,
};
