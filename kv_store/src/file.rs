//! Directory-backed storage: one file per key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{KeyValueStorage, StorageError};

const VALUE_EXTENSION: &str = "kv";
const TEMP_EXTENSION: &str = "tmp";

/// Persistent storage that keeps each key in its own file under `root`.
///
/// Writes go to a uniquely named temporary file first and are renamed into
/// place, so a reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!("[open] File storage at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

/// Write `contents` to a new file at `path` and flush it to disk.
async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension(format!("{}.{TEMP_EXTENSION}", Uuid::new_v4().simple()));
        let result = match write_synced(&temp_path, value.as_bytes()).await {
            Ok(()) => tokio::fs::rename(&temp_path, &path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("[set_item] Failed to remove {}: {cleanup}", temp_path.display());
                }
            }
            return Err(err.into());
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("kv-store-test-{}", Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = scratch_dir();
        let storage = FileStorage::open(&dir).await.expect("Failed to open storage");
        storage
            .set_item("registration_data", "{\"step\":3}".to_string())
            .await
            .expect("Failed to write");

        let reopened = FileStorage::open(&dir).await.expect("Failed to reopen storage");
        assert_eq!(
            reopened.get_item("registration_data").await.unwrap(),
            Some("{\"step\":3}".to_string())
        );

        reopened.remove_item("registration_data").await.unwrap();
        assert!(reopened.get_item("registration_data").await.unwrap().is_none());
        // Removing an absent key is fine
        reopened.remove_item("registration_data").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = scratch_dir();
        let storage = FileStorage::open(&dir).await.unwrap();

        for key in ["", "../escape", ".hidden", "a/b"] {
            let result = storage.set_item(key, "x".to_string()).await;
            assert!(matches!(result, Err(StorageError::InvalidKey(_))), "{key}");
        }

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    async fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        let mut leftovers = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == TEMP_EXTENSION) {
                leftovers.push(path);
            }
        }
        leftovers
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_temp_file() {
        let dir = scratch_dir();
        let storage = FileStorage::open(&dir).await.unwrap();
        storage.set_item("form_drafts", "{}".to_string()).await.unwrap();
        assert!(leftover_temp_files(&dir).await.is_empty());

        // A directory in the value's place makes the rename fail
        tokio::fs::create_dir(dir.join("last_activity.kv")).await.unwrap();
        let result = storage.set_item("last_activity", "1".to_string()).await;
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(leftover_temp_files(&dir).await.is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_multi_remove_default() {
        let dir = scratch_dir();
        let storage = FileStorage::open(&dir).await.unwrap();
        storage.set_item("a", "1".to_string()).await.unwrap();
        storage.set_item("b", "2".to_string()).await.unwrap();

        storage.multi_remove(&["a", "b", "c"]).await.unwrap();

        assert!(storage.get_item("a").await.unwrap().is_none());
        assert!(storage.get_item("b").await.unwrap().is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
