//! Media storage for generated post assets.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores one generated preview image per post.
///
/// Storing a new image replaces whatever was stored for that post before.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `bytes` as the preview image of `post_id` and returns its path
    /// relative to the store root.
    async fn store(&self, post_id: i64, bytes: Vec<u8>) -> Result<String, MediaError>;
}

/// Filesystem [`MediaStore`].
///
/// Layout: `{root}/{post_id}/{sha256-prefix}.{ext}`. Files are named after
/// their content so regenerated images bust downstream caches.
///
/// Stores for the same post are serialized within the process; the last one
/// to finish owns the collection.
pub struct FsMediaStore {
    root: PathBuf,
    extension: &'static str,
    post_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "svg",
            post_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(&self, bytes: &[u8]) -> String {
        let digest = hex::encode(Sha256::digest(bytes));
        format!("{}.{}", &digest[..16], self.extension)
    }

    fn post_lock(&self, post_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .post_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|id, lock| *id == post_id || Arc::strong_count(lock) > 1);
        locks.entry(post_id).or_default().clone()
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn store(&self, post_id: i64, bytes: Vec<u8>) -> Result<String, MediaError> {
        let lock = self.post_lock(post_id);
        let _guard = lock.lock().await;

        let dir = self.root.join(post_id.to_string());
        fs::create_dir_all(&dir).await?;

        let file_name = self.file_name(&bytes);
        let target = dir.join(&file_name);
        let tmp = dir.join(format!(".{file_name}.tmp"));

        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &target).await?;

        // Single-file collection: drop every other file of this post.
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy() == file_name.as_str() {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!(post_id, file = %file_name, "Preview image stored");
        Ok(format!("{post_id}/{file_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn files_of(root: &Path, post_id: i64) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(root.join(post_id.to_string())).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names
    }

    #[tokio::test]
    async fn test_store_writes_content_addressed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        let path = store.store(7, b"<svg/>".to_vec()).await.unwrap();

        assert!(path.starts_with("7/"));
        assert!(path.ends_with(".svg"));
        let written = fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(written, b"<svg/>");
    }

    #[tokio::test]
    async fn test_regenerating_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        store.store(7, b"first".to_vec()).await.unwrap();
        let second = store.store(7, b"second".to_vec()).await.unwrap();

        let files = files_of(dir.path(), 7).await;
        assert_eq!(files.len(), 1);
        assert_eq!(format!("7/{}", files[0]), second);
    }

    #[tokio::test]
    async fn test_posts_do_not_share_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        store.store(1, b"one".to_vec()).await.unwrap();
        store.store(2, b"two".to_vec()).await.unwrap();

        assert_eq!(files_of(dir.path(), 1).await.len(), 1);
        assert_eq!(files_of(dir.path(), 2).await.len(), 1);
    }

    #[tokio::test]
    async fn test_same_content_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        let a = store.store(3, b"same".to_vec()).await.unwrap();
        let b = store.store(3, b"same".to_vec()).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(files_of(dir.path(), 3).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stores_leave_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsMediaStore::new(dir.path()));

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.store(5, vec![b'a' + i; 64]).await })
            })
            .collect();

        let mut stored = Vec::new();
        for handle in handles {
            stored.push(handle.await.unwrap().unwrap());
        }

        let files = files_of(dir.path(), 5).await;
        assert_eq!(files.len(), 1);
        assert!(stored.contains(&format!("5/{}", files[0])));
    }

    #[tokio::test]
    async fn test_post_locks_do_not_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        for post_id in 0..10 {
            store.store(post_id, b"x".to_vec()).await.unwrap();
        }

        assert_eq!(store.post_locks.lock().unwrap().len(), 1);
    }
}
