//! # BucketSync - Fingerprint-Gated Object Storage Transfers
//!
//! BucketSync moves files between a local base directory and a MinIO or
//! Aliyun OSS bucket. Every transfer first compares the local content
//! fingerprint with the remote ETag and is skipped when nothing changed,
//! so repeated runs against the same data are idempotent.
//!
//! ## Features
//!
//! - **Skip-if-unchanged**: MD5 fingerprints compared against S3/OSS ETags
//! - **Single files, folders and whole buckets**: with glob filtering
//! - **Key remapping**: substring replacement from object key to local path
//! - **Mock mode**: list what a bucket download would do
//! - **Per-item failure capture**: a failed object never aborts a batch
//! - **Human-readable log**: one timestamped line per transfer
//!
//! ## Quick Start
//!
//! ```no_run
//! use bucketsync::config::{BackendKind, ConnectionConfig};
//! use bucketsync::connector::Connector;
//! use std::path::Path;
//!
//! let config = ConnectionConfig::minio("127.0.0.1:9000", "minioadmin", "minioadmin", false);
//! let connector = Connector::connect(BackendKind::Minio, config, true).unwrap();
//!
//! println!("{}", connector.create_bucket("images").unwrap());
//! println!("{}", connector.upload_file(Some("images"), Path::new("output/a.png"), "", "").unwrap());
//! ```
//!
//! ## Folder and Bucket Traversal
//!
//! ```no_run
//! use bucketsync::config::{BackendKind, ConnectionConfig};
//! use bucketsync::connector::Connector;
//! use bucketsync::sync::{DownloadBucketOptions, UploadFolderOptions};
//! use std::path::Path;
//!
//! let config = ConnectionConfig::oss("oss-cn-hangzhou.aliyuncs.com", "id", "secret", "models");
//! let connector = Connector::connect(BackendKind::Oss, config, false).unwrap();
//!
//! let options = UploadFolderOptions {
//!     pattern: "*.png".to_string(),
//!     ..Default::default()
//! };
//! let log = connector.upload_folder(None, Path::new("output"), &options).unwrap();
//! println!("{}", log);
//!
//! let options = DownloadBucketOptions {
//!     replace_from: "loras/".to_string(),
//!     mock: true,
//!     ..Default::default()
//! };
//! println!("{}", connector.download_bucket(None, Path::new("temp"), &options).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connector;
pub mod error;
pub mod hash;
pub mod progress;
pub mod report;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use config::{BackendKind, ConnectionConfig};
pub use connector::Connector;
pub use error::{BucketSyncError, Result};
pub use report::{LogEntry, Outcome, TransferLog};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use bucketsync::prelude::*;
    //! ```

    pub use crate::config::{BackendKind, ConnectionConfig};
    pub use crate::connector::Connector;
    pub use crate::error::{BackendError, BucketSyncError, Result};
    pub use crate::hash::{fingerprint_file, Fingerprint, FingerprintAlgorithm};
    pub use crate::progress::ProgressReporter;
    pub use crate::report::{LogEntry, Outcome, TransferLog};
    pub use crate::storage::{MemoryStore, ObjectStore, RemoteProbe};
    pub use crate::sync::{DownloadBucketOptions, Transfer, TransferRequest, UploadFilesOptions, UploadFolderOptions};
}
