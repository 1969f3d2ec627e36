//! In-process object store for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{ObjectStore, StorageError, check_photo, key_from_url, object_key, public_url};

const PUBLIC_BASE: &str = "http://objects.test";
const BUCKET: &str = "works-portal";

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, (String, Vec<u8>)>>,
    fail_deletes: AtomicBool,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delete fail, to exercise cleanup leakage.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether the object behind `url` is stored. Equivalent to an
    /// anonymous GET succeeding.
    pub async fn contains(&self, url: &str) -> bool {
        match key_from_url(PUBLIC_BASE, BUCKET, url) {
            Ok(key) => self.objects.lock().await.contains_key(key),
            Err(_) => false,
        }
    }

    /// Content type of the object behind `url`.
    pub async fn content_type(&self, url: &str) -> Option<String> {
        let key = key_from_url(PUBLIC_BASE, BUCKET, url).ok()?;
        self.objects.lock().await.get(key).map(|(ct, _)| ct.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        body: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, StorageError> {
        let ext = check_photo(content_type, body.len())?;
        let key = object_key(folder, ext);
        let url = public_url(PUBLIC_BASE, BUCKET, &key);
        self.objects
            .lock()
            .await
            .insert(key, (content_type.to_string(), body));
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = key_from_url(PUBLIC_BASE, BUCKET, url)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete {
                bucket: BUCKET.to_string(),
                key: key.to_string(),
                source: "injected failure".into(),
            });
        }
        self.objects.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uploaded_objects_are_reachable_until_deleted() {
        let store = MemoryObjectStore::new();
        let url = store
            .upload(vec![0xFF, 0xD8], "image/jpeg", "bina-marga")
            .await
            .unwrap();

        assert!(url.starts_with("http://objects.test/works-portal/bina-marga/"));
        assert!(store.contains(&url).await);
        assert_eq!(store.content_type(&url).await.as_deref(), Some("image/jpeg"));

        store.delete(&url).await.unwrap();
        assert!(!store.contains(&url).await);

        store.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_unsupported_media() {
        let store = MemoryObjectStore::new();
        let err = store
            .upload(b"GIF89a".to_vec(), "image/gif", "reports")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UnsupportedContentType { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn injected_delete_failure_keeps_the_object() {
        let store = MemoryObjectStore::new();
        let url = store.upload(vec![1], "image/png", "reports").await.unwrap();

        store.fail_deletes(true);
        let err = store.delete(&url).await.unwrap_err();
        let key = url.trim_start_matches("http://objects.test/");
        assert_eq!(err.object_path().as_deref(), Some(key));
        assert!(store.contains(&url).await);
    }
}
