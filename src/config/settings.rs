//! Configuration settings for BucketSync
//!
//! Defines connection parameters, CLI arguments, and per-backend defaults.

use crate::error::{BucketSyncError, IoResultExt, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Region used when nothing better is known
pub const DEFAULT_REGION: &str = "us-east-1";

/// BucketSync - fingerprint-gated transfers between local folders and object storage
#[derive(Parser, Debug, Clone)]
#[command(name = "bucketsync")]
#[command(author = "BucketSync Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upload and download files to MinIO or Aliyun OSS, skipping unchanged content")]
#[command(long_about = r#"
BucketSync uploads and downloads single files, folders and whole buckets
between a local base directory and a MinIO or Aliyun OSS bucket.

Every transfer first compares the local MD5 against the remote ETag and is
skipped when the content is unchanged.

Examples:
  bucketsync --endpoint 127.0.0.1:9000 --bucket images create-bucket images
  bucketsync --bucket images upload-file output/a.png
  bucketsync --backend oss --endpoint oss-cn-hangzhou.aliyuncs.com \
             --bucket models upload-folder output --pattern '*.png'
  bucketsync --backend oss --bucket models download-bucket temp --mock
"#)]
pub struct CliArgs {
    /// Storage backend
    #[arg(long, value_enum, default_value = "minio", env = "BUCKETSYNC_BACKEND")]
    pub backend: BackendKind,

    /// JSON file with connection parameters (flags override it)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Endpoint (host:port or full URL)
    #[arg(long, env = "BUCKETSYNC_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Access key
    #[arg(long, env = "BUCKETSYNC_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long, env = "BUCKETSYNC_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Use HTTPS
    #[arg(long, value_name = "BOOL", env = "BUCKETSYNC_SECURE")]
    pub secure: Option<bool>,

    /// Bucket name (bound to the connector for OSS)
    #[arg(long, env = "BUCKETSYNC_BUCKET")]
    pub bucket: Option<String>,

    /// Signing region
    #[arg(long, env = "BUCKETSYNC_REGION")]
    pub region: Option<String>,

    /// Verify credentials with a list-buckets call when connecting
    #[arg(long)]
    pub handshake: bool,

    /// Base directory that relative local paths are resolved against
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no progress bars, errors only in the log stream)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands, one per node
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the connector and report success
    #[command(name = "init")]
    Init,

    /// Create a bucket unless it already exists
    #[command(name = "create-bucket")]
    CreateBucket {
        /// Bucket to create
        bucket_name: String,
    },

    /// Upload one file
    #[command(name = "upload-file")]
    UploadFile {
        /// Local file, relative to the base directory
        file_path: String,
        /// Object key (defaults to the file name)
        #[arg(long, default_value = "")]
        object_name: String,
        /// Key prefix
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Upload every local file matching a glob
    #[command(name = "upload-files")]
    UploadFiles {
        /// Glob relative to the base directory (e.g. output/*.png)
        pattern: String,
        /// Object key for every match (defaults to each file name)
        #[arg(long, default_value = "")]
        object_name: String,
        /// Key prefix
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Download one object
    #[command(name = "download-file")]
    DownloadFile {
        /// Object key
        object_name: String,
        /// Local destination, relative to the base directory
        file_path: String,
    },

    /// Upload a folder tree
    #[command(name = "upload-folder")]
    UploadFolder {
        /// Folder relative to the base directory
        #[arg(default_value = "output")]
        folder_path: String,
        /// Key prefix
        #[arg(long, default_value = "")]
        prefix: String,
        /// File name pattern
        #[arg(long, default_value = "*")]
        pattern: String,
    },

    /// Download every object of the bucket
    #[command(name = "download-bucket")]
    DownloadBucket {
        /// Destination folder relative to the base directory
        #[arg(default_value = "temp")]
        folder_path: String,
        /// Object key pattern
        #[arg(long, default_value = "*")]
        pattern: String,
        /// Substring of the key to replace in the local path
        #[arg(long, default_value = "")]
        replace_from: String,
        /// Replacement for `replace_from`
        #[arg(long, default_value = "")]
        replace_to: String,
        /// Log what would be downloaded without transferring
        #[arg(long)]
        mock: bool,
    },

    /// List the node table
    #[command(name = "nodes")]
    Nodes,
}

/// Object storage backend family
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// MinIO (S3 API, path-style)
    #[default]
    #[value(name = "minio")]
    Minio,
    /// Aliyun OSS (S3-compatible API, virtual-hosted)
    #[value(name = "oss")]
    Oss,
}

impl BackendKind {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Minio => "Minio",
            Self::Oss => "Aliyun OSS",
        }
    }

    /// Whether connections default to HTTPS
    pub fn default_secure(&self) -> bool {
        match self {
            Self::Minio => false,
            Self::Oss => true,
        }
    }

    /// Whether requests use path-style addressing
    pub fn path_style(&self) -> bool {
        matches!(self, Self::Minio)
    }

    /// Whether the connector must be bound to a bucket
    pub fn requires_bucket(&self) -> bool {
        matches!(self, Self::Oss)
    }
}

/// Connection parameters, immutable once the connector is built
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Endpoint (host:port or full URL)
    pub endpoint: String,
    /// Access key (passed through verbatim)
    #[serde(default)]
    pub access_key: String,
    /// Secret key (passed through verbatim)
    #[serde(default)]
    pub secret_key: String,
    /// Use HTTPS when the endpoint carries no scheme
    #[serde(default)]
    pub secure: bool,
    /// Bucket bound to the connector
    #[serde(default)]
    pub bucket_name: Option<String>,
    /// Signing region override
    #[serde(default)]
    pub region: Option<String>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("secure", &self.secure)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .finish()
    }
}

impl ConnectionConfig {
    /// Empty config carrying the backend's defaults
    pub fn for_backend(kind: BackendKind) -> Self {
        Self {
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            secure: kind.default_secure(),
            bucket_name: None,
            region: None,
        }
    }

    /// Create config for MinIO
    pub fn minio(endpoint: &str, access_key: &str, secret_key: &str, secure: bool) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            secure,
            bucket_name: None,
            region: None,
        }
    }

    /// Create config for Aliyun OSS, bound to one bucket
    pub fn oss(endpoint: &str, access_key_id: &str, access_key_secret: &str, bucket: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            access_key: access_key_id.to_string(),
            secret_key: access_key_secret.to_string(),
            secure: true,
            bucket_name: Some(bucket.to_string()),
            region: None,
        }
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_path(path)?;
        serde_json::from_str(&json)
            .map_err(|e| BucketSyncError::config(format!("{}: {}", path.display(), e)))
    }

    /// Save config to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_path(path)?;
        Ok(())
    }

    /// Build config from CLI arguments, layered over an optional config file
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::for_backend(args.backend),
        };

        if let Some(ref endpoint) = args.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(ref key) = args.access_key {
            config.access_key = key.clone();
        }
        if let Some(ref secret) = args.secret_key {
            config.secret_key = secret.clone();
        }
        if let Some(secure) = args.secure {
            config.secure = secure;
        }
        if let Some(ref bucket) = args.bucket {
            config.bucket_name = Some(bucket.clone()).filter(|b| !b.is_empty());
        }
        if let Some(ref region) = args.region {
            config.region = Some(region.clone()).filter(|r| !r.is_empty());
        }

        Ok(config)
    }

    /// Validate configuration for the given backend
    pub fn validate(&self, kind: BackendKind) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(BucketSyncError::validation("endpoint is empty"));
        }
        if kind.requires_bucket() && self.bucket().is_none() {
            return Err(BucketSyncError::validation(format!(
                "bucket_name is required for {}",
                kind.name()
            )));
        }
        Ok(())
    }

    /// Bound bucket, if any non-empty one was configured
    pub fn bucket(&self) -> Option<&str> {
        self.bucket_name.as_deref().filter(|b| !b.trim().is_empty())
    }

    /// Endpoint as a URL, adding a scheme from `secure` when missing
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if self.secure {
            format!("https://{}", endpoint)
        } else {
            format!("http://{}", endpoint)
        }
    }

    /// Signing region for the given backend
    pub fn region_for(&self, kind: BackendKind) -> String {
        if let Some(region) = &self.region {
            return region.clone();
        }
        match kind {
            BackendKind::Minio => DEFAULT_REGION.to_string(),
            BackendKind::Oss => oss_region_from_endpoint(&self.endpoint)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }
}

/// Derive `oss-cn-hangzhou` from `oss-cn-hangzhou.aliyuncs.com`
pub fn oss_region_from_endpoint(endpoint: &str) -> Option<String> {
    let host = endpoint
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let first = host.split(['.', ':', '/']).next()?;
    if first.starts_with("oss-") {
        Some(first.trim_end_matches("-internal").to_string())
    } else {
        None
    }
}

/// Join a host-relative path onto the base directory
pub fn resolve_under_base(base: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let config = ConnectionConfig::minio("192.168.31.200:9000", "ak", "sk", false);
        assert_eq!(config.endpoint_url(), "http://192.168.31.200:9000");

        let config = ConnectionConfig::minio("play.min.io/", "ak", "sk", true);
        assert_eq!(config.endpoint_url(), "https://play.min.io");

        let config = ConnectionConfig::minio("https://s3.local", "ak", "sk", false);
        assert_eq!(config.endpoint_url(), "https://s3.local");
    }

    #[test]
    fn test_oss_region() {
        assert_eq!(
            oss_region_from_endpoint("oss-cn-hangzhou.aliyuncs.com"),
            Some("oss-cn-hangzhou".to_string())
        );
        assert_eq!(
            oss_region_from_endpoint("https://oss-cn-beijing-internal.aliyuncs.com"),
            Some("oss-cn-beijing".to_string())
        );
        assert_eq!(oss_region_from_endpoint("minio.local:9000"), None);

        let config = ConnectionConfig::oss("oss-cn-shanghai.aliyuncs.com", "id", "secret", "b");
        assert_eq!(config.region_for(BackendKind::Oss), "oss-cn-shanghai");
        assert_eq!(config.region_for(BackendKind::Minio), DEFAULT_REGION);
    }

    #[test]
    fn test_validate() {
        let config = ConnectionConfig::minio("", "ak", "sk", false);
        assert!(config.validate(BackendKind::Minio).unwrap_err().is_validation());

        let config = ConnectionConfig::minio("localhost:9000", "ak", "sk", false);
        assert!(config.validate(BackendKind::Minio).is_ok());
        assert!(config.validate(BackendKind::Oss).is_err());

        let config = ConnectionConfig::oss("oss-cn-hangzhou.aliyuncs.com", "id", "secret", "b");
        assert!(config.validate(BackendKind::Oss).is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ConnectionConfig::minio("localhost:9000", "ak", "super-secret", false);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("conn.json");
        let config = ConnectionConfig::oss("oss-cn-hangzhou.aliyuncs.com", "id", "secret", "models");
        config.save(&path).unwrap();
        assert_eq!(ConnectionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_from_cli_overrides_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("conn.json");
        ConnectionConfig::minio("file-host:9000", "file-ak", "file-sk", false)
            .save(&path)
            .unwrap();

        let args = CliArgs::parse_from([
            "bucketsync",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "flag-host:9000",
            "--bucket",
            "images",
            "init",
        ]);
        let config = ConnectionConfig::from_cli(&args).unwrap();
        assert_eq!(config.endpoint, "flag-host:9000");
        assert_eq!(config.access_key, "file-ak");
        assert_eq!(config.bucket(), Some("images"));
    }

    #[test]
    fn test_resolve_under_base() {
        let base = Path::new("/srv/comfy");
        assert_eq!(resolve_under_base(base, "output/a.png"), PathBuf::from("/srv/comfy/output/a.png"));
        assert_eq!(resolve_under_base(base, "/tmp/x"), PathBuf::from("/tmp/x"));
    }
}
