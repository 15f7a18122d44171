use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for file extensions spliced into blob file names
    /// Empty or up to 16 ASCII alphanumerics
    /// - Valid: "jpg", "PDF", "mp4", ""
    /// - Invalid: "tar.gz", "../x", "jp g", "a/b"
    pub static ref EXTENSION_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]{0,16}$").unwrap();

    /// Regex for file identifiers accepted from callers
    /// - Valid: "0199f0c2-7a51-7cc3-9b7e-0d2a4c1f9e11", "abc_123"
    /// - Invalid: "", "a/b", "..", "id with space"
    pub static ref FILE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_regex_valid() {
        assert!(EXTENSION_REGEX.is_match("jpg"));
        assert!(EXTENSION_REGEX.is_match("PDF"));
        assert!(EXTENSION_REGEX.is_match("mp4"));
        assert!(EXTENSION_REGEX.is_match(""));
    }

    #[test]
    fn test_extension_regex_invalid() {
        assert!(!EXTENSION_REGEX.is_match("tar.gz")); // dot
        assert!(!EXTENSION_REGEX.is_match("../x")); // traversal
        assert!(!EXTENSION_REGEX.is_match("jp g")); // space
        assert!(!EXTENSION_REGEX.is_match("a/b")); // separator
        assert!(!EXTENSION_REGEX.is_match("abcdefghijklmnopq")); // 17 chars
    }

    #[test]
    fn test_file_id_regex() {
        assert!(FILE_ID_REGEX.is_match("0199f0c2-7a51-7cc3-9b7e-0d2a4c1f9e11"));
        assert!(FILE_ID_REGEX.is_match("abc_123"));
        assert!(!FILE_ID_REGEX.is_match(""));
        assert!(!FILE_ID_REGEX.is_match("a/b"));
        assert!(!FILE_ID_REGEX.is_match(".."));
        assert!(!FILE_ID_REGEX.is_match("id with space"));
    }
}
