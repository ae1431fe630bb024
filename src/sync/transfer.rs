//! Single-object transfer
//!
//! Upload and download one object, gated on fingerprints. Backend failures
//! come back as failed log entries so that bulk callers keep iterating;
//! local I/O failures are returned as errors.

use super::gate::{decide, GateDecision};
use crate::error::{IoResultExt, Result};
use crate::hash::fingerprint_file;
use crate::progress::ProgressReporter;
use crate::report::{LogEntry, Outcome};
use crate::storage::ObjectStore;
use std::path::Path;

/// One upload or download target
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    /// Bucket name
    pub bucket: &'a str,
    /// Object key
    pub object_key: &'a str,
    /// Local file
    pub local_path: &'a Path,
}

impl<'a> TransferRequest<'a> {
    /// Create a request
    pub fn new(bucket: &'a str, object_key: &'a str, local_path: &'a Path) -> Self {
        Self {
            bucket,
            object_key,
            local_path,
        }
    }
}

/// Fingerprint-gated transfers through one backend
pub struct Transfer<'a> {
    store: &'a dyn ObjectStore,
    progress: &'a ProgressReporter,
}

impl<'a> Transfer<'a> {
    /// Create a transfer helper
    pub fn new(store: &'a dyn ObjectStore, progress: &'a ProgressReporter) -> Self {
        Self { store, progress }
    }

    /// Backend in use
    pub fn store(&self) -> &'a dyn ObjectStore {
        self.store
    }

    /// Progress reporter in use
    pub fn progress(&self) -> &'a ProgressReporter {
        self.progress
    }

    /// Upload a local file unless the remote object already has its content
    pub fn upload(&self, request: &TransferRequest<'_>) -> Result<LogEntry> {
        let TransferRequest {
            bucket,
            object_key,
            local_path,
        } = *request;

        let local = fingerprint_file(local_path, self.store.fingerprint_algorithm())?;
        let remote = self.store.probe(bucket, object_key);

        match decide(Some(&local), &remote) {
            GateDecision::Skip => {
                return Ok(self.finish(
                    LogEntry::new(
                        Outcome::Skipped,
                        format!("File '{}' has not changed, skipped upload", local_path.display()),
                    ),
                    0,
                ));
            }
            GateDecision::Transfer(reason) => {
                tracing::debug!("Uploading {} to {}/{}: {:?}", local_path.display(), bucket, object_key, reason);
            }
        }

        let bar = self.progress.start_transfer(object_key);
        let result = self
            .store
            .put_object(bucket, object_key, local_path, &|done, total| bar.update(done, total));
        match result {
            Ok(()) => {
                let bytes = bar.position();
                bar.finish();
                Ok(self.finish(
                    LogEntry::new(Outcome::Uploaded, format!("File uploaded to {}/{}", bucket, object_key)),
                    bytes,
                ))
            }
            Err(e) => {
                bar.abandon();
                Ok(self.finish(LogEntry::failed(format!("Failed to upload file: {}", e)), 0))
            }
        }
    }

    /// Download an object unless the local file already has its content
    pub fn download(&self, request: &TransferRequest<'_>) -> Result<LogEntry> {
        let TransferRequest {
            bucket,
            object_key,
            local_path,
        } = *request;

        let remote = self.store.probe(bucket, object_key);
        let local = if local_path.exists() {
            Some(fingerprint_file(local_path, self.store.fingerprint_algorithm())?)
        } else {
            None
        };

        match decide(local.as_ref(), &remote) {
            GateDecision::Skip => {
                return Ok(self.finish(
                    LogEntry::new(
                        Outcome::Skipped,
                        format!("File '{}' has not changed, skipped download", local_path.display()),
                    ),
                    0,
                ));
            }
            GateDecision::Transfer(reason) => {
                tracing::debug!("Downloading {}/{} to {}: {:?}", bucket, object_key, local_path.display(), reason);
            }
        }

        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_path(parent)?;
        }

        let bar = self.progress.start_transfer(object_key);
        let result = self
            .store
            .get_object(bucket, object_key, local_path, &|done, total| bar.update(done, total));
        match result {
            Ok(()) => {
                let bytes = bar.position();
                bar.finish();
                Ok(self.finish(
                    LogEntry::new(
                        Outcome::Downloaded,
                        format!(
                            "File downloaded from {}/{} to {}",
                            bucket,
                            object_key,
                            local_path.display()
                        ),
                    ),
                    bytes,
                ))
            }
            Err(e) => {
                bar.abandon();
                Ok(self.finish(LogEntry::failed(format!("Failed to download file: {}", e)), 0))
            }
        }
    }

    fn finish(&self, entry: LogEntry, bytes: u64) -> LogEntry {
        self.progress.record(entry.outcome(), bytes);
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, MemoryStore, ProgressReporter) {
        (
            TempDir::new().unwrap(),
            MemoryStore::new().with_bucket("b"),
            ProgressReporter::disabled(),
        )
    }

    #[test]
    fn test_upload_is_idempotent() {
        let (dir, store, progress) = setup();
        let transfer = Transfer::new(&store, &progress);
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();
        let request = TransferRequest::new("b", "a.txt", &path);

        let first = transfer.upload(&request).unwrap();
        assert_eq!(first.outcome(), Outcome::Uploaded);
        assert!(first.message().contains("uploaded"));
        assert_eq!(store.calls().puts, 1);

        let second = transfer.upload(&request).unwrap();
        assert_eq!(second.outcome(), Outcome::Skipped);
        assert!(second.message().contains("skipped"));
        assert_eq!(store.calls().puts, 1);

        std::fs::write(&path, "hello!").unwrap();
        let third = transfer.upload(&request).unwrap();
        assert_eq!(third.outcome(), Outcome::Uploaded);
        assert_eq!(store.calls().puts, 2);
        assert_eq!(store.object("b", "a.txt").unwrap(), b"hello!");

        let summary = progress.summary();
        assert_eq!(summary.files_transferred, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.bytes_transferred, 11);
    }

    #[test]
    fn test_download_into_unchanged_file_skips() {
        let (dir, store, progress) = setup();
        store.insert("b", "a.txt", "hello");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let entry = Transfer::new(&store, &progress)
            .download(&TransferRequest::new("b", "a.txt", &path))
            .unwrap();

        assert_eq!(entry.outcome(), Outcome::Skipped);
        assert_eq!(store.calls().gets, 0);
    }

    #[test]
    fn test_download_creates_parent_dirs() {
        let (dir, store, progress) = setup();
        store.insert("b", "models/x/a.bin", vec![1u8, 2, 3]);
        let path = dir.path().join("models/x/a.bin");

        let entry = Transfer::new(&store, &progress)
            .download(&TransferRequest::new("b", "models/x/a.bin", &path))
            .unwrap();

        assert_eq!(entry.outcome(), Outcome::Downloaded);
        assert_eq!(std::fs::read(&path).unwrap(), vec![1u8, 2, 3]);
    }

    #[test]
    fn test_download_overwrites_changed_file() {
        let (dir, store, progress) = setup();
        store.insert("b", "a.txt", "new");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "old").unwrap();

        let entry = Transfer::new(&store, &progress)
            .download(&TransferRequest::new("b", "a.txt", &path))
            .unwrap();

        assert_eq!(entry.outcome(), Outcome::Downloaded);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_backend_failure_becomes_log_entry() {
        let (dir, store, progress) = setup();
        store.fail_key("a.txt");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let entry = Transfer::new(&store, &progress)
            .upload(&TransferRequest::new("b", "a.txt", &path))
            .unwrap();

        assert_eq!(entry.outcome(), Outcome::Failed);
        assert!(entry.message().starts_with("Failed to upload file:"));
    }

    #[test]
    fn test_missing_remote_download_fails_softly() {
        let (dir, store, progress) = setup();
        let path = dir.path().join("nothing.txt");

        let entry = Transfer::new(&store, &progress)
            .download(&TransferRequest::new("b", "nothing.txt", &path))
            .unwrap();

        assert_eq!(entry.outcome(), Outcome::Failed);
        assert!(!path.exists());
    }

    #[test]
    fn test_unreadable_local_file_is_error() {
        let (dir, store, progress) = setup();
        let path = dir.path().join("missing.txt");

        let err = Transfer::new(&store, &progress)
            .upload(&TransferRequest::new("b", "missing.txt", &path))
            .unwrap_err();

        assert_eq!(err.path(), Some(&path));
        assert_eq!(store.calls().puts, 0);
    }

    #[test]
    fn test_probe_failure_forces_upload() {
        let (dir, store, progress) = setup();
        store.insert("b", "a.txt", "hello");
        store.fail_probes(true);
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let entry = Transfer::new(&store, &progress)
            .upload(&TransferRequest::new("b", "a.txt", &path))
            .unwrap();

        assert_eq!(entry.outcome(), Outcome::Uploaded);
        assert_eq!(store.calls().puts, 1);
    }
}
