//! Object storage abstraction.
//!
//! Submissions land under `submissions/{id}/...` and derived media is
//! written under `releases/{id}/...`. Keys are `/`-separated relative
//! paths; the filesystem implementation maps them onto a storage root.

mod fs;

pub use fs::FsObjectStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur talking to object storage.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage operations the pipeline needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all object keys under a prefix, sorted lexicographically.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;

    /// Read an object in full.
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Write an object, replacing any existing one at the same key.
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), ObjectStoreError>;

    /// Delete every object under a prefix. Deleting a prefix with no
    /// objects is not an error.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), ObjectStoreError>;
}

/// Build the public URL for a stored object by joining the configured
/// CDN base with the storage key.
pub fn public_url(cdn_base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        cdn_base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Validate a storage key: relative, no empty or traversal segments.
pub(crate) fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    if key.is_empty() || key.starts_with('/') || key.contains('\0') {
        return Err(ObjectStoreError::InvalidKey(key.to_string()));
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_joins_cleanly() {
        assert_eq!(
            public_url("https://cdn.example.com", "releases/x/cover.webp"),
            "https://cdn.example.com/releases/x/cover.webp"
        );
        assert_eq!(
            public_url("https://cdn.example.com/", "/releases/x/cover.webp"),
            "https://cdn.example.com/releases/x/cover.webp"
        );
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("submissions/abc/metadata.json").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("a/../b").is_err());
        assert!(validate_key("a/./b").is_err());
    }
}
