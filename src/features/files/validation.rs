//! Structural request validation, run before any file operation touches storage

use std::path::Path;

use validator::Validate;

use crate::features::files::models::{FileInfo, UploadContent};
use crate::shared::validation::FILE_ID_REGEX;

/// Rejects structurally invalid requests. The returned message is surfaced
/// verbatim as an invalid-parameter error.
pub trait RequestValidator: Send + Sync {
    fn validate_upload(
        &self,
        content: Option<&UploadContent>,
        info: &FileInfo,
        destination_root: &Path,
    ) -> Result<(), String>;

    fn validate_id(&self, file_id: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl RequestValidator for StructuralValidator {
    fn validate_upload(
        &self,
        content: Option<&UploadContent>,
        info: &FileInfo,
        destination_root: &Path,
    ) -> Result<(), String> {
        if content.is_none() {
            return Err("no file content supplied".to_string());
        }

        if destination_root.as_os_str().is_empty() {
            return Err("upload destination is not configured".to_string());
        }

        info.validate().map_err(|e| e.to_string())
    }

    fn validate_id(&self, file_id: &str) -> Result<(), String> {
        if file_id.trim().is_empty() {
            return Err("file id is required".to_string());
        }

        if !FILE_ID_REGEX.is_match(file_id) {
            return Err(format!("malformed file id '{}'", file_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::filesystem::en::FileName;
    use fake::Fake;
    use std::path::PathBuf;

    fn info() -> FileInfo {
        let name: String = FileName().fake();
        FileInfo {
            name,
            mimetype: "application/octet-stream".to_string(),
            extension: "bin".to_string(),
            size: 3,
        }
    }

    #[test]
    fn test_upload_requires_content() {
        let result = StructuralValidator.validate_upload(None, &info(), Path::new("/srv/uploads"));
        assert_eq!(result, Err("no file content supplied".to_string()));
    }

    #[test]
    fn test_upload_requires_destination() {
        let content = UploadContent::Bytes(vec![1, 2, 3]);
        let result =
            StructuralValidator.validate_upload(Some(&content), &info(), &PathBuf::new());
        assert_eq!(result, Err("upload destination is not configured".to_string()));
    }

    #[test]
    fn test_upload_rejects_bad_info() {
        let content = UploadContent::Bytes(vec![1, 2, 3]);
        let mut bad = info();
        bad.extension = "../../etc".to_string();

        let result = StructuralValidator.validate_upload(
            Some(&content),
            &bad,
            Path::new("/srv/uploads"),
        );
        assert!(result.unwrap_err().contains("extension"));
    }

    #[test]
    fn test_upload_accepts_valid() {
        let content = UploadContent::Bytes(vec![1, 2, 3]);
        assert!(StructuralValidator
            .validate_upload(Some(&content), &info(), Path::new("/srv/uploads"))
            .is_ok());
    }

    #[test]
    fn test_validate_id() {
        assert!(StructuralValidator.validate_id("").is_err());
        assert!(StructuralValidator.validate_id("   ").is_err());
        assert!(StructuralValidator.validate_id("../secret").is_err());
        assert!(StructuralValidator
            .validate_id("0199f0c2-7a51-7cc3-9b7e-0d2a4c1f9e11")
            .is_ok());
    }
}
