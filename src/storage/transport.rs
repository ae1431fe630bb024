//! Native AWS S3 SDK transport
//!
//! Wraps an `aws_sdk_s3::Client` together with the tokio runtime that drives
//! it, and exposes each SDK call as a blocking method. Works against any
//! S3-compatible endpoint (MinIO, Aliyun OSS).

use super::backend::{ObjectMeta, ObjectSummary, ProgressFn};
use crate::config::{BackendKind, ConnectionConfig, DEFAULT_REGION};
use crate::error::{BackendError, BucketSyncError, Result};
use aws_sdk_s3::config::{RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;

/// Blocking S3 client bound to one endpoint and credential pair
pub struct S3Transport {
    client: aws_sdk_s3::Client,
    runtime: Runtime,
    region: String,
}

impl S3Transport {
    /// Build the SDK client for the given backend and connection parameters
    pub fn connect(kind: BackendKind, config: &ConnectionConfig) -> Result<Self> {
        config.validate(kind)?;

        let endpoint = config.endpoint_url();
        let region = config.region_for(kind);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                BucketSyncError::connection(&endpoint, format!("failed to start runtime: {}", e))
            })?;

        let credentials = aws_credential_types::Credentials::new(
            &config.access_key,
            &config.secret_key,
            None, // session token
            None, // expiry
            "bucketsync-static",
        );

        let sdk_config = runtime.block_on(
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(region.clone()))
                .endpoint_url(&endpoint)
                .credentials_provider(credentials)
                .load(),
        );

        // OSS rejects the SDK's default trailing checksums
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(kind.path_style())
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        tracing::debug!(
            backend = kind.name(),
            endpoint = %endpoint,
            region = %region,
            "S3 client configured"
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            runtime,
            region,
        })
    }

    /// HEAD an object; `Ok(None)` when the backend answers not-found
    pub fn head_object(&self, bucket: &str, key: &str) -> std::result::Result<Option<ObjectMeta>, BackendError> {
        let result = self
            .runtime
            .block_on(self.client.head_object().bucket(bucket).key(key).send());

        match result {
            Ok(head) => Ok(Some(ObjectMeta {
                etag: head.e_tag().map(str::to_string),
                size: head.content_length().unwrap_or(0).max(0) as u64,
            })),
            Err(e) if e.as_service_error().map(|s| s.is_not_found()).unwrap_or(false) => Ok(None),
            Err(e) => Err(sdk_error("head_object", e)),
        }
    }

    /// Upload a file in a single PUT
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> std::result::Result<(), BackendError> {
        self.runtime.block_on(async {
            let size = tokio::fs::metadata(path)
                .await
                .map_err(|e| BackendError::new("put_object", format!("{}: {}", path.display(), e)))?
                .len();

            let body = ByteStream::from_path(path)
                .await
                .map_err(|e| BackendError::new("put_object", format!("{}: {}", path.display(), e)))?;

            progress(0, size);
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(|e| sdk_error("put_object", e))?;
            progress(size, size);

            Ok(())
        })
    }

    /// Stream an object into a local file
    pub fn get_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        progress: ProgressFn<'_>,
    ) -> std::result::Result<(), BackendError> {
        self.runtime.block_on(async {
            let resp = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| sdk_error("get_object", e))?;

            let total = resp.content_length().unwrap_or(0).max(0) as u64;
            let mut body = resp.body;
            let local_err =
                |e: std::io::Error| BackendError::new("get_object", format!("{}: {}", path.display(), e));

            let mut file = tokio::fs::File::create(path).await.map_err(local_err)?;
            let mut done = 0u64;
            progress(done, total);

            while let Some(chunk) = body
                .try_next()
                .await
                .map_err(|e| BackendError::new("get_object", format!("body read failed: {}", e)))?
            {
                file.write_all(&chunk).await.map_err(local_err)?;
                done += chunk.len() as u64;
                progress(done, total);
            }
            file.flush().await.map_err(local_err)?;

            Ok(())
        })
    }

    /// List every object in a bucket, following continuation tokens
    pub fn list_objects(&self, bucket: &str) -> std::result::Result<Vec<ObjectSummary>, BackendError> {
        self.runtime.block_on(async {
            let mut objects = Vec::new();
            let mut continuation_token = None;

            loop {
                let mut req = self.client.list_objects_v2().bucket(bucket);
                if let Some(token) = continuation_token {
                    req = req.continuation_token(token);
                }
                let resp = req.send().await.map_err(|e| sdk_error("list_objects", e))?;

                for obj in resp.contents() {
                    let Some(key) = obj.key() else { continue };
                    objects.push(ObjectSummary {
                        key: key.to_string(),
                        size: obj.size().unwrap_or(0).max(0) as u64,
                        etag: obj.e_tag().map(str::to_string),
                    });
                }

                continuation_token = resp.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            }

            Ok(objects)
        })
    }

    /// List bucket names
    pub fn list_buckets(&self) -> std::result::Result<Vec<String>, BackendError> {
        let resp = self
            .runtime
            .block_on(self.client.list_buckets().send())
            .map_err(|e| sdk_error("list_buckets", e))?;

        Ok(resp
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    /// HEAD a bucket; `false` when the backend answers not-found
    pub fn head_bucket(&self, bucket: &str) -> std::result::Result<bool, BackendError> {
        match self.runtime.block_on(self.client.head_bucket().bucket(bucket).send()) {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().map(|s| s.is_not_found()).unwrap_or(false) => Ok(false),
            Err(e) => Err(sdk_error("bucket_exists", e)),
        }
    }

    /// Create a bucket in the transport's region
    pub fn create_bucket(&self, bucket: &str) -> std::result::Result<(), BackendError> {
        let mut req = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        self.runtime
            .block_on(req.send())
            .map_err(|e| sdk_error("make_bucket", e))?;
        Ok(())
    }
}

/// Flatten an SDK error with its full source chain
fn sdk_error<E>(operation: &str, err: E) -> BackendError
where
    E: std::error::Error,
{
    BackendError::new(operation, format!("{}", DisplayErrorContext(&err)))
}
