//! File-based snapshot store for persistent storage.

use crate::error::{validate_collection, StoreError, StoreResult};
use crate::store::SnapshotStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file-based snapshot store.
///
/// Each collection is one file under the root directory
/// (`<root>/<collection>.snapshot`). Snapshots survive process restarts.
///
/// # Durability
///
/// `put` writes to a temporary file in the same directory and renames it
/// over the target, so a crash mid-write leaves either the old or the new
/// snapshot, never a torn one. A missing file reads as `None`
/// (creation-on-first-use semantics).
///
/// # Example
///
/// ```no_run
/// use learnsync_store::{FileStore, SnapshotStore};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = FileStore::new(Path::new("/var/lib/learnsync"));
/// store.put("sync_queue", b"snapshot").await.unwrap();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory is created on first write, not here.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.snapshot"))
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn get(&self, collection: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_collection(collection)?;
        let path = self.collection_path(collection);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path.display().to_string(), e)),
        }
    }

    async fn put(&self, collection: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_collection(collection)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(self.root.display().to_string(), e))?;

        let path = self.collection_path(collection);
        let tmp = self.root.join(format!("{collection}.snapshot.tmp"));

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io(tmp.display().to_string(), e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(path.display().to_string(), e))?;

        debug!(collection, size = bytes.len(), "snapshot written");
        Ok(())
    }

    async fn clear(&self, collection: &str) -> StoreResult<()> {
        validate_collection(collection)?;
        let path = self.collection_path(collection);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path.display().to_string(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("sync_queue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.put("sync_queue", b"first").await.unwrap();
        assert_eq!(
            store.get("sync_queue").await.unwrap(),
            Some(b"first".to_vec())
        );

        store.put("sync_queue", b"second").await.unwrap();
        assert_eq!(
            store.get("sync_queue").await.unwrap(),
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn snapshots_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path());
            store.put("sync_history", b"persisted").await.unwrap();
        }
        // A fresh instance over the same root sees the data
        let reopened = FileStore::new(dir.path());
        assert_eq!(
            reopened.get("sync_history").await.unwrap(),
            Some(b"persisted".to_vec())
        );
    }

    #[tokio::test]
    async fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.put("sync_queue", b"x").await.unwrap();
        store.clear("sync_queue").await.unwrap();
        assert!(store.get("sync_queue").await.unwrap().is_none());
        // Clearing again is a no-op
        store.clear("sync_queue").await.unwrap();
    }

    #[tokio::test]
    async fn root_directory_created_on_first_put() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("sync");
        let store = FileStore::new(&nested);
        store.put("sync_queue", b"x").await.unwrap();
        assert!(nested.join("sync_queue.snapshot").exists());
    }

    #[tokio::test]
    async fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.put("sync_queue", b"x").await.unwrap();
        assert!(!dir.path().join("sync_queue.snapshot.tmp").exists());
    }
}
