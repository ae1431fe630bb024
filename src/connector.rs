//! Connector: one backend client bound to its connection parameters
//!
//! Every node-level operation goes through a [`Connector`]. It validates
//! inputs, resolves the bucket (explicit argument first, then the bucket
//! bound at init), and hands the work to the gated transfer layer.

use crate::config::{BackendKind, ConnectionConfig};
use crate::error::{require_non_empty, BucketSyncError, Result};
use crate::progress::{ProgressReporter, ProgressSummary};
use crate::report::{LogEntry, Outcome, TransferLog};
use crate::storage::{BucketStatus, ObjectStore};
use crate::sync::{
    join_key, DownloadBucketOptions, Transfer, TransferRequest, UploadFilesOptions, UploadFolderOptions,
};
use std::path::Path;

/// Backend client plus the parameters it was built from
pub struct Connector {
    kind: BackendKind,
    config: ConnectionConfig,
    store: Box<dyn ObjectStore>,
    progress: ProgressReporter,
}

impl Connector {
    /// Build the native client for `kind`. With `handshake`, the
    /// credentials are checked with one list-buckets call.
    #[cfg(feature = "native_s3")]
    pub fn connect(kind: BackendKind, config: ConnectionConfig, handshake: bool) -> Result<Self> {
        let store = Box::new(crate::storage::S3Store::connect(kind, &config)?);
        let connector = Self {
            kind,
            config,
            store,
            progress: ProgressReporter::new(),
        };
        if handshake {
            connector.handshake()?;
        }
        Ok(connector)
    }

    /// Wrap an already-built store
    pub fn with_store(kind: BackendKind, config: ConnectionConfig, store: Box<dyn ObjectStore>) -> Self {
        Self {
            kind,
            config,
            store,
            progress: ProgressReporter::disabled(),
        }
    }

    /// Replace the progress reporter
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Backend family
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Connection parameters
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    /// Counters for everything transferred through this connector
    pub fn summary(&self) -> ProgressSummary {
        self.progress.summary()
    }

    /// List buckets once; a rejection is a connection error
    pub fn handshake(&self) -> Result<()> {
        self.store
            .list_buckets()
            .map(|buckets| tracing::debug!("Handshake ok, {} buckets visible", buckets.len()))
            .map_err(|e| BucketSyncError::connection(self.config.endpoint_url(), e.to_string()))
    }

    /// Log entry announcing the connection
    pub fn connected_entry(&self) -> LogEntry {
        LogEntry::new(
            Outcome::Connected,
            format!("Connected to {} at {}", self.kind.name(), self.config.endpoint_url()),
        )
    }

    /// Pick the explicit bucket, else the one bound at init
    pub fn resolve_bucket<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .filter(|b| !b.trim().is_empty())
            .or_else(|| self.config.bucket())
            .ok_or_else(|| BucketSyncError::validation("bucket_name is empty"))
    }

    /// Create a bucket unless it already exists
    pub fn create_bucket(&self, bucket_name: &str) -> Result<LogEntry> {
        require_non_empty(bucket_name, "bucket_name")?;

        let entry = match self.store.ensure_bucket(bucket_name) {
            Ok(BucketStatus::Created) => LogEntry::new(
                Outcome::Created,
                format!("Bucket '{}' created successfully", bucket_name),
            ),
            Ok(BucketStatus::AlreadyExists) => LogEntry::new(
                Outcome::Exists,
                format!("Bucket '{}' already exists", bucket_name),
            ),
            Err(e) => LogEntry::failed(format!("Failed to create bucket: {}", e)),
        };
        Ok(entry)
    }

    /// Upload one file; an empty `object_name` means the file's name
    pub fn upload_file(
        &self,
        bucket: Option<&str>,
        file_path: &Path,
        object_name: &str,
        prefix: &str,
    ) -> Result<LogEntry> {
        let bucket = self.resolve_bucket(bucket)?;
        require_non_empty(&file_path.to_string_lossy(), "file_path")?;

        let name = if object_name.is_empty() {
            file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| BucketSyncError::validation("file_path has no file name"))?
        } else {
            object_name.to_string()
        };
        let key = join_key(prefix, &name);

        self.transfer().upload(&TransferRequest::new(bucket, &key, file_path))
    }

    /// Download one object
    pub fn download_file(&self, bucket: Option<&str>, object_name: &str, file_path: &Path) -> Result<LogEntry> {
        let bucket = self.resolve_bucket(bucket)?;
        require_non_empty(object_name, "object_name")?;
        require_non_empty(&file_path.to_string_lossy(), "file_path")?;

        self.transfer()
            .download(&TransferRequest::new(bucket, object_name, file_path))
    }

    /// Upload every local file matched by a path glob
    pub fn upload_files(&self, bucket: Option<&str>, pattern: &str, options: &UploadFilesOptions) -> Result<TransferLog> {
        let bucket = self.resolve_bucket(bucket)?;
        require_non_empty(pattern, "pattern")?;

        self.transfer().upload_matching(bucket, pattern, options)
    }

    /// Upload a folder tree
    pub fn upload_folder(
        &self,
        bucket: Option<&str>,
        folder: &Path,
        options: &UploadFolderOptions,
    ) -> Result<TransferLog> {
        let bucket = self.resolve_bucket(bucket)?;
        require_non_empty(&folder.to_string_lossy(), "folder_path")?;

        self.transfer().upload_folder(bucket, folder, options)
    }

    /// Download every matching object of a bucket
    pub fn download_bucket(
        &self,
        bucket: Option<&str>,
        folder: &Path,
        options: &DownloadBucketOptions,
    ) -> Result<TransferLog> {
        let bucket = self.resolve_bucket(bucket)?;
        require_non_empty(&folder.to_string_lossy(), "folder_path")?;

        self.transfer().download_bucket(bucket, folder, options)
    }

    fn transfer(&self) -> Transfer<'_> {
        Transfer::new(self.store.as_ref(), &self.progress)
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("kind", &self.kind)
            .field("store", &self.store.name())
            .field("config", &self.config)
            .finish()
    }
}
