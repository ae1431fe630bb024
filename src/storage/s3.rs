//! MinIO and Aliyun OSS backends
//!
//! Both speak the S3 API through [`S3Transport`]. MinIO uses path-style
//! requests and HEAD-bucket for existence checks. OSS is virtual-hosted,
//! bound to one bucket at init, and decides existence from the account's
//! bucket list.

use super::backend::{ObjectMeta, ObjectStore, ObjectSummary, ProgressFn};
use super::transport::S3Transport;
use crate::config::{BackendKind, ConnectionConfig};
use crate::error::{BackendError, Result};
use std::path::Path;

/// S3-compatible backend for one [`BackendKind`]
pub struct S3Store {
    kind: BackendKind,
    transport: S3Transport,
}

impl S3Store {
    /// Build the client; OSS configs must name a bucket
    pub fn connect(kind: BackendKind, config: &ConnectionConfig) -> Result<Self> {
        let transport = S3Transport::connect(kind, config)?;
        Ok(Self { kind, transport })
    }

    /// Backend family
    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        match self.kind {
            BackendKind::Minio => "minio",
            BackendKind::Oss => "aliyun-oss",
        }
    }

    fn head_object(&self, bucket: &str, key: &str) -> std::result::Result<Option<ObjectMeta>, BackendError> {
        self.transport.head_object(bucket, key)
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> std::result::Result<(), BackendError> {
        self.transport.put_object(bucket, key, path, progress)
    }

    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> std::result::Result<(), BackendError> {
        self.transport.get_object(bucket, key, path, progress)
    }

    fn list_objects(&self, bucket: &str) -> std::result::Result<Vec<ObjectSummary>, BackendError> {
        self.transport.list_objects(bucket)
    }

    fn list_buckets(&self) -> std::result::Result<Vec<String>, BackendError> {
        self.transport.list_buckets()
    }

    fn bucket_exists(&self, bucket: &str) -> std::result::Result<bool, BackendError> {
        match self.kind {
            BackendKind::Minio => self.transport.head_bucket(bucket),
            BackendKind::Oss => Ok(self.list_buckets()?.iter().any(|name| name == bucket)),
        }
    }

    fn make_bucket(&self, bucket: &str) -> std::result::Result<(), BackendError> {
        self.transport.create_bucket(bucket)
    }
}
