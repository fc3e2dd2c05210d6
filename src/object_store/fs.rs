//! Filesystem-backed object store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::{validate_key, ObjectStore, ObjectStoreError};

/// Object store rooted at a local directory. Keys map directly onto
/// paths below the root.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ObjectStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_to_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let dir = self.key_to_path(prefix.trim_end_matches('/'))?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let root = self.root.clone();
        let keys = tokio::task::spawn_blocking(move || {
            let mut keys = Vec::new();
            for entry in WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(rel) = entry.path().strip_prefix(&root) {
                    // Keys always use forward slashes regardless of platform
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(key);
                }
            }
            keys.sort();
            keys
        })
        .await
        .map_err(|e| ObjectStoreError::Io(std::io::Error::other(e)))?;

        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.key_to_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<(), ObjectStoreError> {
        let path = self.key_to_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), ObjectStoreError> {
        let dir = self.key_to_path(prefix.trim_end_matches('/'))?;
        if dir.exists() {
            fs::remove_dir_all(&dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().join("storage")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (_dir, store) = store();
        store.put("submissions/s1/metadata.json", b"{}").await.unwrap();
        let data = store.get("submissions/s1/metadata.json").await.unwrap();
        assert_eq!(data, b"{}");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get("nope/missing.bin").await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_scoped() {
        let (_dir, store) = store();
        store.put("submissions/s1/tracks/02.wav", b"b").await.unwrap();
        store.put("submissions/s1/tracks/01.wav", b"a").await.unwrap();
        store.put("submissions/s1/metadata.json", b"{}").await.unwrap();
        store.put("submissions/s2/metadata.json", b"{}").await.unwrap();

        let keys = store.list("submissions/s1").await.unwrap();
        assert_eq!(
            keys,
            vec![
                "submissions/s1/metadata.json",
                "submissions/s1/tracks/01.wav",
                "submissions/s1/tracks/02.wav",
            ]
        );
    }

    #[tokio::test]
    async fn test_list_missing_prefix_is_empty() {
        let (_dir, store) = store();
        assert!(store.list("submissions/ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_prefix_removes_everything() {
        let (_dir, store) = store();
        store.put("submissions/s1/metadata.json", b"{}").await.unwrap();
        store.put("submissions/s1/tracks/01.wav", b"a").await.unwrap();

        store.delete_prefix("submissions/s1").await.unwrap();
        assert!(store.list("submissions/s1").await.unwrap().is_empty());

        // Deleting again is fine
        store.delete_prefix("submissions/s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let (_dir, store) = store();
        assert!(store.get("../outside").await.is_err());
        assert!(store.put("a/../../b", b"x").await.is_err());
    }
}
