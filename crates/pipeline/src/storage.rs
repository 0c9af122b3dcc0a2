//! Local file storage for uploaded assets and downloaded generation outputs.
//!
//! Files are addressed by relative storage keys (see
//! [`signage_core::storage`]) under a single root directory. The HTTP
//! server serves the same root under a public URL prefix.

use std::path::{Path, PathBuf};

use signage_core::storage::validate_storage_key;

/// Errors from [`FileStorage`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Stores files under a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    public_prefix: String,
}

impl FileStorage {
    /// `public_prefix` is the URL path the root is served under, e.g. `/files`.
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        let public_prefix = public_prefix.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute (root-joined) path of a key. Rejects keys that would
    /// escape the root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_storage_key(key).map_err(|_| StorageError::InvalidKey(key.to_string()))?;
        Ok(self.root.join(key))
    }

    /// Public URL under which the server exposes a key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_prefix)
    }

    /// Write `bytes` to `key`, creating parent directories as needed.
    /// An existing file is overwritten.
    pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(key, e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(key, e))?;
        tracing::debug!(key, size = bytes.len(), "Stored file");
        Ok(path)
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| io_error(key, e))
    }

    /// Copy the file at `from` to `to`.
    pub async fn copy(&self, from: &str, to: &str) -> Result<u64, StorageError> {
        let source = self.path_for(from)?;
        let dest = self.path_for(to)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(to, e))?;
        }
        tokio::fs::copy(&source, &dest)
            .await
            .map_err(|e| io_error(from, e))
    }

    /// Delete the file at `key`. A file that is already gone is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, "File already deleted");
                Ok(())
            }
            Err(e) => Err(io_error(key, e)),
        }
    }

    /// Delete the directory at `key` and everything below it. A missing
    /// directory is not an error.
    pub async fn delete_dir(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "/files/");
        (dir, storage)
    }

    #[tokio::test]
    async fn put_read_delete() {
        let (_dir, storage) = storage();
        let key = "static-assets/a/b.png";

        let path = storage.put(key, b"png-bytes").await.unwrap();
        assert!(path.ends_with("static-assets/a/b.png"));
        assert_eq!(storage.read(key).await.unwrap(), b"png-bytes");

        storage.delete(key).await.unwrap();
        assert_matches!(storage.read(key).await, Err(StorageError::Io { .. }));
        // Deleting again is fine.
        storage.delete(key).await.unwrap();
    }

    #[tokio::test]
    async fn copy_creates_destination_dirs() {
        let (_dir, storage) = storage();
        storage.put("generations/1/0-x.png", b"abc").await.unwrap();
        let copied = storage
            .copy("generations/1/0-x.png", "static-assets/y.png")
            .await
            .unwrap();
        assert_eq!(copied, 3);
        assert_eq!(storage.read("static-assets/y.png").await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn delete_dir_removes_nested_files() {
        let (_dir, storage) = storage();
        storage.put("generations/7/0-a.png", b"a").await.unwrap();
        storage.put("generations/7/1-b.png", b"b").await.unwrap();
        storage.put("generations/8/0-c.png", b"c").await.unwrap();

        storage.delete_dir("generations/7").await.unwrap();
        assert!(!storage.path_for("generations/7").unwrap().exists());
        assert_eq!(storage.read("generations/8/0-c.png").await.unwrap(), b"c");
        // Missing directory is fine.
        storage.delete_dir("generations/7").await.unwrap();
    }

    #[tokio::test]
    async fn escaping_keys_are_rejected() {
        let (_dir, storage) = storage();
        assert_matches!(
            storage.put("../outside.png", b"x").await,
            Err(StorageError::InvalidKey(_))
        );
        assert_matches!(storage.path_for("/etc/passwd"), Err(StorageError::InvalidKey(_)));
    }

    #[test]
    fn public_url_trims_trailing_slash() {
        let (_dir, storage) = storage();
        assert_eq!(
            storage.public_url("static-assets/a.png"),
            "/files/static-assets/a.png"
        );
    }
}
