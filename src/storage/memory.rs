//! In-process object store
//!
//! Keeps buckets as ordered key/bytes maps. ETags are computed with the
//! configured fingerprint algorithm, the way S3 reports MD5 ETags for
//! single-part uploads. Call counters and failure injection make it the
//! backend of choice for tests.

use super::backend::{ObjectMeta, ObjectStore, ObjectSummary, ProgressFn};
use crate::error::BackendError;
use crate::hash::{fingerprint_bytes, FingerprintAlgorithm};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// Counts of backend calls made against a [`MemoryStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `head_object` calls
    pub heads: usize,
    /// `put_object` calls
    pub puts: usize,
    /// `get_object` calls
    pub gets: usize,
    /// `make_bucket` calls
    pub bucket_creates: usize,
}

/// Object store held entirely in memory
pub struct MemoryStore {
    algorithm: FingerprintAlgorithm,
    buckets: Mutex<Buckets>,
    failing_keys: Mutex<HashSet<String>>,
    fail_probes: AtomicBool,
    heads: AtomicUsize,
    puts: AtomicUsize,
    gets: AtomicUsize,
    bucket_creates: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store using MD5 ETags
    pub fn new() -> Self {
        Self::with_algorithm(FingerprintAlgorithm::Md5)
    }

    /// Create an empty store using the given ETag algorithm
    pub fn with_algorithm(algorithm: FingerprintAlgorithm) -> Self {
        Self {
            algorithm,
            buckets: Mutex::new(BTreeMap::new()),
            failing_keys: Mutex::new(HashSet::new()),
            fail_probes: AtomicBool::new(false),
            heads: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            bucket_creates: AtomicUsize::new(0),
        }
    }

    /// Add an empty bucket
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().entry(bucket.to_string()).or_default();
        self
    }

    /// Store an object directly, bypassing counters
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Read an object directly
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock().get(bucket).and_then(|objects| objects.get(key).cloned())
    }

    /// Keys stored in a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every put/get of this key fail
    pub fn fail_key(&self, key: &str) {
        self.failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string());
    }

    /// Make every HEAD request fail
    pub fn fail_probes(&self, fail: bool) {
        self.fail_probes.store(fail, Ordering::SeqCst);
    }

    /// Calls made so far
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            heads: self.heads.load(Ordering::SeqCst),
            puts: self.puts.load(Ordering::SeqCst),
            gets: self.gets.load(Ordering::SeqCst),
            bucket_creates: self.bucket_creates.load(Ordering::SeqCst),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failing(&self, operation: &str, key: &str) -> Result<(), BackendError> {
        let failing = self.failing_keys.lock().unwrap_or_else(|e| e.into_inner());
        if failing.contains(key) {
            return Err(BackendError::new(operation, format!("injected failure for '{}'", key)));
        }
        Ok(())
    }

    fn etag(&self, data: &[u8]) -> String {
        format!("\"{}\"", fingerprint_bytes(data, self.algorithm))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn fingerprint_algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, BackendError> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        if self.fail_probes.load(Ordering::SeqCst) {
            return Err(BackendError::new("head_object", "connection reset"));
        }
        Ok(self
            .lock()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|data| ObjectMeta {
                etag: Some(self.etag(data)),
                size: data.len() as u64,
            }))
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), BackendError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_failing("put_object", key)?;

        let data = std::fs::read(path)
            .map_err(|e| BackendError::new("put_object", format!("{}: {}", path.display(), e)))?;
        let len = data.len() as u64;

        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| BackendError::new("put_object", format!("NoSuchBucket: {}", bucket)))?;
        objects.insert(key.to_string(), data);
        drop(buckets);

        progress(len, len);
        Ok(())
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), BackendError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_failing("get_object", key)?;

        let data = self
            .object(bucket, key)
            .ok_or_else(|| BackendError::new("get_object", format!("NoSuchKey: {}/{}", bucket, key)))?;
        std::fs::write(path, &data)
            .map_err(|e| BackendError::new("get_object", format!("{}: {}", path.display(), e)))?;

        let len = data.len() as u64;
        progress(len, len);
        Ok(())
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, BackendError> {
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| BackendError::new("list_objects", format!("NoSuchBucket: {}", bucket)))?;
        Ok(objects
            .iter()
            .map(|(key, data)| ObjectSummary {
                key: key.clone(),
                size: data.len() as u64,
                etag: Some(self.etag(data)),
            })
            .collect())
    }

    fn list_buckets(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        Ok(self.lock().contains_key(bucket))
    }

    fn make_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.bucket_creates.fetch_add(1, Ordering::SeqCst);
        let mut buckets = self.lock();
        if buckets.contains_key(bucket) {
            return Err(BackendError::new("make_bucket", format!("BucketAlreadyExists: {}", bucket)));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }
}
