//! Backend capability trait
//!
//! The six vendor call shapes (bucket exists, make bucket, list buckets,
//! put from file, get to file, head object, list objects) plus the derived
//! fingerprint probe and ensure-bucket operations.

use crate::error::BackendError;
use crate::hash::{Fingerprint, FingerprintAlgorithm};
use std::path::Path;
use std::sync::Arc;

/// Progress callback: `(bytes_done, bytes_total)`
pub type ProgressFn<'a> = &'a dyn Fn(u64, u64);

/// Object metadata from a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Backend content-identity token, as returned
    pub etag: Option<String>,
    /// Size in bytes
    pub size: u64,
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// ETag from the listing, if any
    pub etag: Option<String>,
}

/// Why a remote fingerprint is unavailable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// The object does not exist
    NotFound,
    /// The object exists but carries no usable ETag
    NoFingerprint,
    /// The probe failed; treated as absent so the transfer goes ahead
    ProbeFailed(BackendError),
}

/// Result of probing the remote fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteProbe {
    /// Remote content identity
    Present(Fingerprint),
    /// No fingerprint available
    Absent(AbsentReason),
}

/// Outcome of ensuring a bucket exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket was created by this call
    Created,
    /// The bucket was already there; nothing was created
    AlreadyExists,
}

/// Blocking object storage client
pub trait ObjectStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Local algorithm whose digests are comparable with this backend's ETags
    fn fingerprint_algorithm(&self) -> FingerprintAlgorithm {
        FingerprintAlgorithm::Md5
    }

    /// HEAD an object; `Ok(None)` when it does not exist
    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, BackendError>;

    /// Upload a local file as one object
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), BackendError>;

    /// Download one object into a local file
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), BackendError>;

    /// List every object of a bucket
    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, BackendError>;

    /// List bucket names visible to the credentials
    fn list_buckets(&self) -> Result<Vec<String>, BackendError>;

    /// Check whether a bucket exists
    fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError>;

    /// Create a bucket
    fn make_bucket(&self, bucket: &str) -> Result<(), BackendError>;

    /// Probe the remote fingerprint. Never fails: every backend error,
    /// transient or not, reads as absent and forces a transfer.
    fn probe(&self, bucket: &str, key: &str) -> RemoteProbe {
        match self.head_object(bucket, key) {
            Ok(Some(meta)) => match meta.etag.as_deref().and_then(Fingerprint::from_etag) {
                Some(fp) => RemoteProbe::Present(fp),
                None => RemoteProbe::Absent(AbsentReason::NoFingerprint),
            },
            Ok(None) => RemoteProbe::Absent(AbsentReason::NotFound),
            Err(e) => {
                tracing::warn!(
                    backend = self.name(),
                    "Probe of {}/{} failed, treating as absent: {}",
                    bucket,
                    key,
                    e
                );
                RemoteProbe::Absent(AbsentReason::ProbeFailed(e))
            }
        }
    }

    /// Create the bucket unless it already exists
    fn ensure_bucket(&self, bucket: &str) -> Result<BucketStatus, BackendError> {
        if self.bucket_exists(bucket)? {
            return Ok(BucketStatus::AlreadyExists);
        }
        self.make_bucket(bucket)?;
        Ok(BucketStatus::Created)
    }
}

impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fingerprint_algorithm(&self) -> FingerprintAlgorithm {
        (**self).fingerprint_algorithm()
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>, BackendError> {
        (**self).head_object(bucket, key)
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), BackendError> {
        (**self).put_object(bucket, key, path, progress)
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), BackendError> {
        (**self).get_object(bucket, key, path, progress)
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, BackendError> {
        (**self).list_objects(bucket)
    }

    fn list_buckets(&self) -> Result<Vec<String>, BackendError> {
        (**self).list_buckets()
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        (**self).bucket_exists(bucket)
    }

    fn make_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        (**self).make_bucket(bucket)
    }
}
