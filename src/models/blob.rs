use serde::{Deserialize, Serialize};

/// Uploaded image stored in redb, keyed by the SHA-256 of its bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobRecord {
    pub content_type: String,
    pub data: Vec<u8>,
    /// User id of the first uploader
    pub uploaded_by: String,
    /// Unix milliseconds
    pub created_at: i64,
}

/// Response to an image upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub storage_id: String,
    pub url: String,
}

/// Validate that a storage id is a SHA-256 hex digest (64 hex characters)
pub fn validate_storage_id(id: &str) -> bool {
    id.len() == 64 && id.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_storage_id() {
        assert!(validate_storage_id(&"a".repeat(64)));
        assert!(validate_storage_id(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        ));
        assert!(!validate_storage_id("abc123"));
        assert!(!validate_storage_id(&"z".repeat(64)));
        assert!(!validate_storage_id(&"a".repeat(65)));
    }
}
