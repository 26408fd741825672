use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use thiserror::Error;

use crate::{ObjectStore, ObjectWriteParams, OffloadError, OffloadResult};

type Buckets = HashMap<String, HashMap<String, Bytes>>;

/// Failures reported by [`MemoryObjectStore`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("The specified key does not exist: {bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },
}

/// In-memory object store for tests and development.
///
/// Buckets must be created explicitly; clones share the same contents and
/// call counters.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    buckets: Arc<RwLock<Buckets>>,
    puts: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket; existing buckets are left as they are
    pub fn create_bucket<S: Into<String>>(&self, bucket: S) {
        self.buckets.write().entry(bucket.into()).or_default();
    }

    /// Current contents of an object
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets.read().get(bucket)?.get(key).cloned()
    }

    /// Number of objects in a bucket
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, |objects| objects.len())
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        _params: &ObjectWriteParams,
    ) -> OffloadResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| OffloadError::bucket_not_found(bucket))?;
        objects.insert(key.to_string(), body);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> OffloadResult<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| OffloadError::bucket_not_found(bucket))?;
        objects.get(key).cloned().ok_or_else(|| {
            OffloadError::object_store(MemoryStoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> OffloadResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| OffloadError::bucket_not_found(bucket))?;
        // Deleting a missing key succeeds, as it does on S3.
        objects.remove(key);
        Ok(())
    }
}
