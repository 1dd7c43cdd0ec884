//! The photo store: the ordered collection of gallery records kept under a
//! single storage key.
//!
//! Every mutation reads the whole collection, changes it and writes it back.
//! Mutations within one process are serialized by a lock; separate processes
//! sharing the same backend can still overwrite each other (last writer wins).

mod record;
mod schema;

use std::sync::{Arc, Mutex};

pub use record::{
    title_from_filename, upload_caption, Category, CategoryFilter, IdAllocator, PhotoId,
    PhotoRecord,
};
pub use schema::SCHEMA_VERSION;

use crate::error::{GalleryError, Result};
use crate::storage::{StorageBackend, GALLERY_KEY};

pub struct PhotoStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
    /// Held across each read-modify-write
    write_lock: Mutex<()>,
}

impl PhotoStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_key(backend, GALLERY_KEY)
    }

    pub fn with_key(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// All records in insertion order, reporting unreadable or unsupported
    /// stored data instead of hiding it.
    pub fn records(&self) -> Result<Vec<PhotoRecord>> {
        let raw = self
            .backend
            .load(&self.key)
            .map_err(|e| GalleryError::StorageReadFailure {
                key: self.key.clone(),
                reason: format!("{:#}", e),
            })?;

        match raw {
            None => Ok(Vec::new()),
            Some(raw) => {
                let decoded = schema::decode(&self.key, &raw)?;
                if let Some(from) = decoded.migrated_from {
                    tracing::debug!(
                        key = %self.key,
                        from,
                        to = SCHEMA_VERSION,
                        "Read gallery in an older layout; it will be upgraded on next write"
                    );
                }
                Ok(decoded.photos)
            }
        }
    }

    /// All records in insertion order; stored data that cannot be read is
    /// treated as an empty gallery.
    pub fn list(&self) -> Vec<PhotoRecord> {
        match self.records() {
            Ok(photos) => photos,
            Err(e) => {
                tracing::warn!("Treating gallery as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &PhotoId) -> Option<PhotoRecord> {
        self.list().into_iter().find(|p| p.id == *id)
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Append a record and persist the whole collection.
    pub fn add(&self, record: PhotoRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut photos = self.load_for_write()?;
        if photos.iter().any(|p| p.id == record.id) {
            return Err(GalleryError::DuplicateId(record.id));
        }

        let id = record.id;
        photos.push(record);
        self.persist(&photos)?;

        tracing::info!(%id, total = photos.len(), "Added photo");
        Ok(())
    }

    /// Remove the record with `id`, if any, and persist the rest.
    /// Returns whether a record was removed.
    pub fn remove(&self, id: &PhotoId) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut photos = self.load_for_write()?;
        let target = id.to_string();
        let before = photos.len();
        photos.retain(|p| p.id.to_string() != target);

        if photos.len() == before {
            tracing::debug!(%id, "Remove of unknown photo ignored");
            return Ok(false);
        }

        self.persist(&photos)?;
        tracing::info!(%id, total = photos.len(), "Removed photo");
        Ok(true)
    }

    /// Current records for a mutation. Data that was read but does not
    /// decode is replaced by the write. A failed read or data from a newer
    /// schema is never overwritten.
    fn load_for_write(&self) -> Result<Vec<PhotoRecord>> {
        match self.records() {
            Ok(photos) => Ok(photos),
            Err(GalleryError::MalformedStoredData { reason, .. }) => {
                tracing::warn!(key = %self.key, "Replacing malformed gallery data: {}", reason);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn persist(&self, photos: &[PhotoRecord]) -> Result<()> {
        let write_failure = |reason: String| GalleryError::StorageWriteFailure {
            key: self.key.clone(),
            reason,
        };

        let raw = schema::encode(photos).map_err(|e| write_failure(e.to_string()))?;
        self.backend
            .save(&self.key, &raw)
            .map_err(|e| write_failure(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory storage whose next `load` fails, like a transient I/O error.
    struct FailingOnce {
        inner: MemoryStorage,
        fail_next_load: AtomicBool,
    }

    impl StorageBackend for FailingOnce {
        fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
            if self.fail_next_load.swap(false, Ordering::SeqCst) {
                anyhow::bail!("Permission denied (os error 13)");
            }
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.inner.save(key, value)
        }

        fn remove(&self, key: &str) -> anyhow::Result<()> {
            self.inner.remove(key)
        }
    }

    fn record(id: i64, category: Category) -> PhotoRecord {
        PhotoRecord {
            id: PhotoId(id),
            url: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            title: format!("photo-{}", id),
            description: "Uploaded on 1/1/2024".to_string(),
            category,
            date: Utc.timestamp_millis_opt(id).unwrap(),
        }
    }

    fn store() -> (Arc<MemoryStorage>, PhotoStore) {
        let backend = Arc::new(MemoryStorage::new());
        let store = PhotoStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let (_, store) = store();
        assert!(store.list().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_adds_and_removes_preserve_order() {
        let (_, store) = store();
        for id in 1..=5 {
            store.add(record(id, Category::Personal)).unwrap();
        }
        assert!(store.remove(&PhotoId(2)).unwrap());
        assert!(store.remove(&PhotoId(4)).unwrap());

        let ids: Vec<i64> = store.list().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_round_trip_keeps_every_field() {
        let (_, store) = store();
        let r = record(42, Category::Travel);
        store.add(r.clone()).unwrap();
        assert_eq!(store.list(), vec![r]);
    }

    #[test]
    fn test_remove_unknown_id_is_a_no_op() {
        let (backend, store) = store();
        store.add(record(1, Category::Personal)).unwrap();
        let before = backend.load(GALLERY_KEY).unwrap();

        assert!(!store.remove(&PhotoId(99)).unwrap());
        assert!(!store.remove(&PhotoId(99)).unwrap());
        assert_eq!(backend.load(GALLERY_KEY).unwrap(), before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_matches_string_ids_from_legacy_data() {
        let (backend, store) = store();
        backend
            .save(
                GALLERY_KEY,
                r#"[{"id":"17","url":"u","title":"t","description":"d","category":"personal","date":"2024-01-01T00:00:00.000Z"}]"#,
            )
            .unwrap();

        assert!(store.remove(&"17".parse::<PhotoId>().unwrap()).unwrap());
        assert!(store.is_empty());
        // The rewrite is in the versioned layout
        let raw = backend.load(GALLERY_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"version":1,"photos":[]}"#);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let (_, store) = store();
        store.add(record(7, Category::Personal)).unwrap();
        let err = store.add(record(7, Category::Travel)).unwrap_err();
        assert_eq!(err, GalleryError::DuplicateId(PhotoId(7)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_malformed_data_reads_empty_and_is_replaced() {
        let (backend, store) = store();
        backend.save(GALLERY_KEY, "{{{ not json").unwrap();

        assert!(store.list().is_empty());
        assert!(matches!(
            store.records(),
            Err(GalleryError::MalformedStoredData { .. })
        ));

        store.add(record(1, Category::Personal)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_failed_read_is_never_overwritten() {
        let backend = Arc::new(FailingOnce {
            inner: MemoryStorage::new(),
            fail_next_load: AtomicBool::new(false),
        });
        let store = PhotoStore::new(backend.clone());
        for id in 1..=3 {
            store.add(record(id, Category::Personal)).unwrap();
        }

        backend.fail_next_load.store(true, Ordering::SeqCst);
        let err = store.add(record(4, Category::Personal)).unwrap_err();
        assert!(matches!(err, GalleryError::StorageReadFailure { .. }));

        backend.fail_next_load.store(true, Ordering::SeqCst);
        assert!(matches!(
            store.remove(&PhotoId(1)),
            Err(GalleryError::StorageReadFailure { .. })
        ));

        let ids: Vec<i64> = store.list().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        store.add(record(4, Category::Personal)).unwrap();
        let ids: Vec<i64> = store.list().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_newer_schema_is_not_overwritten() {
        let (backend, store) = store();
        let future = r#"{"version":2,"photos":{"by_id":{}}}"#;
        backend.save(GALLERY_KEY, future).unwrap();

        assert!(store.list().is_empty());
        assert!(matches!(
            store.add(record(1, Category::Personal)),
            Err(GalleryError::UnsupportedSchemaVersion { found: 2, .. })
        ));
        assert!(store.remove(&PhotoId(1)).is_err());
        assert_eq!(backend.load(GALLERY_KEY).unwrap().as_deref(), Some(future));
    }

    #[test]
    fn test_quota_failure_leaves_collection_unchanged() {
        let backend = Arc::new(MemoryStorage::with_quota(400));
        let store = PhotoStore::new(backend);
        store.add(record(1, Category::Personal)).unwrap();

        let mut big = record(2, Category::Personal);
        big.url = format!("data:image/png;base64,{}", "A".repeat(1_000));
        let err = store.add(big).unwrap_err();

        assert!(matches!(err, GalleryError::StorageWriteFailure { .. }));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let (_, store) = store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store.add(record(t * 100 + i, Category::Personal)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 80);
    }
}
