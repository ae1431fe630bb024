//! Folder, glob and bucket traversal
//!
//! Enumerates local files or remote objects, filters them by pattern,
//! derives the key or local path for each match and runs one gated
//! transfer per item. Items are independent: a failed item is logged and
//! the traversal moves on.

use super::transfer::{Transfer, TransferRequest};
use crate::error::{BucketSyncError, IoResultExt, Result};
use crate::report::{LogEntry, Outcome, TransferLog};
use globset::{Glob, GlobBuilder, GlobMatcher};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Options for uploading a folder tree
#[derive(Debug, Clone)]
pub struct UploadFolderOptions {
    /// Prepended to every object key
    pub prefix: String,
    /// Glob matched against each file name
    pub pattern: String,
}

impl Default for UploadFolderOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            pattern: "*".to_string(),
        }
    }
}

/// Options for uploading the files matched by a local glob
#[derive(Debug, Clone, Default)]
pub struct UploadFilesOptions {
    /// Key for every match; each file's name when empty
    pub object_name: String,
    /// Prepended to every object key
    pub prefix: String,
}

/// Options for downloading a whole bucket
#[derive(Debug, Clone)]
pub struct DownloadBucketOptions {
    /// Glob matched against each full object key
    pub pattern: String,
    /// Substring of the key replaced to form the local path; empty disables
    pub replace_from: String,
    /// Replacement for `replace_from`
    pub replace_to: String,
    /// Only log what would be downloaded
    pub mock: bool,
}

impl Default for DownloadBucketOptions {
    fn default() -> Self {
        Self {
            pattern: "*".to_string(),
            replace_from: String::new(),
            replace_to: String::new(),
            mock: false,
        }
    }
}

/// Compile a name pattern; `*` also matches `/`, and empty means everything
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let pattern = if pattern.is_empty() { "*" } else { pattern };
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| BucketSyncError::pattern(pattern, e.to_string()))
}

/// Join a key prefix and a relative key with a single `/`
pub fn join_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

/// Relative path as a `/`-separated object key
pub fn path_to_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Apply the literal substring remap to an object key
pub fn remap_key(key: &str, replace_from: &str, replace_to: &str) -> String {
    if replace_from.is_empty() {
        key.to_string()
    } else {
        key.replace(replace_from, replace_to)
    }
}

/// Local path for a remapped key, or `None` if it would leave `root`
pub fn local_path_for_key(root: &Path, relative_key: &str) -> Option<PathBuf> {
    let relative = Path::new(relative_key.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || relative.as_os_str().is_empty() {
        None
    } else {
        Some(root.join(relative))
    }
}

fn has_glob_meta(part: &str) -> bool {
    part.contains(['*', '?', '[', '{'])
}

/// Split a path glob into its literal base directory and the glob below it
fn split_glob(pattern: &str) -> (PathBuf, Vec<String>) {
    let mut base = PathBuf::new();
    let mut rest = Vec::new();

    for component in Path::new(pattern).components() {
        let part = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !has_glob_meta(&part) {
            base.push(component);
        } else {
            rest.push(part.into_owned());
        }
    }

    (base, rest)
}

/// A name starting with `.` is only matched by a glob segment that also
/// starts with `.`. Below a `**` segment the alignment is lost, so any
/// dot segment in the pattern admits hidden names.
fn hidden_allowed(segments: &[String], relative: &Path) -> bool {
    let recursive = segments.iter().any(|s| s.contains("**"));
    relative.components().enumerate().all(|(i, component)| {
        if !component.as_os_str().to_string_lossy().starts_with('.') {
            return true;
        }
        if recursive {
            segments.iter().any(|s| s.starts_with('.'))
        } else {
            segments.get(i).is_some_and(|s| s.starts_with('.'))
        }
    })
}

impl<'a> Transfer<'a> {
    /// Upload every file under `root` whose name matches the pattern.
    /// Keys are the path relative to `root`, under the prefix. Symlinked
    /// files are uploaded with their target's content.
    pub fn upload_folder(&self, bucket: &str, root: &Path, options: &UploadFolderOptions) -> Result<TransferLog> {
        let matcher = compile_pattern(&options.pattern)?;
        let mut log = TransferLog::new();

        if root.is_dir() {
            for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
                let entry = match entry {
                    Ok(e) => e,
                    Err(err) => {
                        log.push(LogEntry::failed(format!("Failed to read folder entry: {}", err)));
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !matcher.is_match(entry.file_name()) {
                    continue;
                }

                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                let key = join_key(&options.prefix, &path_to_key(relative));
                log.push(self.upload_item(bucket, &key, entry.path()));
            }
        } else {
            tracing::debug!("Folder {} does not exist", root.display());
        }

        if log.is_empty() {
            log.push(LogEntry::new(Outcome::NoMatch, "no files matched, nothing uploaded"));
        }
        Ok(log)
    }

    /// Upload the files matched by a path glob (`*` stays within one
    /// directory, `**` crosses directories, hidden names need a leading
    /// `.` in the pattern). Each match is stored as
    /// `prefix/(object_name or file name)`.
    pub fn upload_matching(&self, bucket: &str, pattern: &str, options: &UploadFilesOptions) -> Result<TransferLog> {
        let (base, rest) = split_glob(pattern);
        let mut log = TransferLog::new();
        let mut matches = Vec::new();

        if rest.is_empty() {
            if base.is_file() {
                matches.push(base.clone());
            }
        } else {
            let glob = rest.join("/");
            let matcher = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|e| BucketSyncError::pattern(pattern, e.to_string()))?
                .compile_matcher();

            let walk_root = if base.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                base.clone()
            };
            let mut walker = WalkDir::new(&walk_root)
                .follow_links(true)
                .min_depth(1)
                .sort_by_file_name();
            if !glob.contains("**") {
                walker = walker.max_depth(rest.len());
            }

            if walk_root.is_dir() {
                for entry in walker {
                    let entry = match entry {
                        Ok(e) => e,
                        Err(err) => {
                            log.push(LogEntry::failed(format!("Failed to read folder entry: {}", err)));
                            continue;
                        }
                    };
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let relative = entry.path().strip_prefix(&walk_root).unwrap_or(entry.path());
                    if matcher.is_match(path_to_key(relative)) && hidden_allowed(&rest, relative) {
                        matches.push(entry.into_path());
                    }
                }
            }
        }

        for path in &matches {
            let name = if options.object_name.is_empty() {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            } else {
                options.object_name.clone()
            };
            let key = join_key(&options.prefix, &name);
            log.push(self.upload_item(bucket, &key, path));
        }

        if log.is_empty() {
            log.push(LogEntry::new(Outcome::NoMatch, "no files matched, nothing uploaded"));
        }
        Ok(log)
    }

    /// Download every object whose key matches the pattern into `root`,
    /// remapping keys to local paths. Mock mode only logs.
    pub fn download_bucket(&self, bucket: &str, root: &Path, options: &DownloadBucketOptions) -> Result<TransferLog> {
        let matcher = compile_pattern(&options.pattern)?;
        std::fs::create_dir_all(root).with_path(root)?;

        let objects = match self.store().list_objects(bucket) {
            Ok(objects) => objects,
            Err(e) => {
                return Ok(LogEntry::failed(format!("Failed to list objects: {}", e)).into());
            }
        };

        let mut log = TransferLog::new();
        for object in &objects {
            tracing::debug!("Object: {}", object.key);
            if object.key.ends_with('/') || !matcher.is_match(&object.key) {
                continue;
            }

            let relative = remap_key(&object.key, &options.replace_from, &options.replace_to);
            let Some(local_path) = local_path_for_key(root, &relative) else {
                log.push(LogEntry::failed(format!(
                    "Refusing to download {} outside {}",
                    object.key,
                    root.display()
                )));
                continue;
            };

            if options.mock {
                log.push(LogEntry::new(
                    Outcome::Mocked,
                    format!("Mock download: {} to {}", object.key, local_path.display()),
                ));
                continue;
            }

            let request = TransferRequest::new(bucket, &object.key, &local_path);
            let entry = self
                .download(&request)
                .unwrap_or_else(|e| LogEntry::failed(format!("Failed to download file: {}", e)));
            log.push(entry);
        }

        if log.is_empty() {
            log.push(LogEntry::new(Outcome::NoMatch, "no files matched, nothing downloaded"));
        }
        Ok(log)
    }

    fn upload_item(&self, bucket: &str, key: &str, path: &Path) -> LogEntry {
        self.upload(&TransferRequest::new(bucket, key, path))
            .unwrap_or_else(|e| LogEntry::failed(format!("Failed to upload file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressReporter;
    use crate::storage::MemoryStore;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("", "a/b.png"), "a/b.png");
        assert_eq!(join_key("run1/", "/a.png"), "run1/a.png");
        assert_eq!(join_key("run1", "a.png"), "run1/a.png");
    }

    #[test]
    fn test_remap_and_local_path() {
        assert_eq!(remap_key("models/v1/a.bin", "v1/", ""), "models/a.bin");
        assert_eq!(remap_key("models/a.bin", "", "x"), "models/a.bin");

        let root = Path::new("/srv/temp");
        assert_eq!(local_path_for_key(root, "a/b.bin"), Some(PathBuf::from("/srv/temp/a/b.bin")));
        assert_eq!(local_path_for_key(root, "/a.bin"), Some(PathBuf::from("/srv/temp/a.bin")));
        assert_eq!(local_path_for_key(root, "../etc/passwd"), None);
        assert_eq!(local_path_for_key(root, ""), None);
    }

    #[test]
    fn test_upload_folder_filters_by_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "x.png", "png");
        write(dir.path(), "y.txt", "txt");
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();

        let options = UploadFolderOptions {
            pattern: "*.png".to_string(),
            ..Default::default()
        };
        let log = Transfer::new(&store, &progress)
            .upload_folder("b", dir.path(), &options)
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.count(Outcome::Uploaded), 1);
        assert_eq!(store.keys("b"), vec!["x.png".to_string()]);
        assert_eq!(store.calls().puts, 1);
    }

    #[test]
    fn test_upload_folder_keys_are_relative_with_prefix() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "top.txt", "1");
        write(dir.path(), "sub/deep/nested.txt", "2");
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();

        let options = UploadFolderOptions {
            prefix: "run1".to_string(),
            ..Default::default()
        };
        let log = Transfer::new(&store, &progress)
            .upload_folder("b", dir.path(), &options)
            .unwrap();

        assert_eq!(log.count(Outcome::Uploaded), 2);
        assert_eq!(
            store.keys("b"),
            vec!["run1/sub/deep/nested.txt".to_string(), "run1/top.txt".to_string()]
        );
    }

    #[test]
    fn test_upload_folder_no_match_gives_one_entry() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "y.txt", "txt");
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();

        let options = UploadFolderOptions {
            pattern: "*.png".to_string(),
            ..Default::default()
        };
        let log = Transfer::new(&store, &progress)
            .upload_folder("b", dir.path(), &options)
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].outcome(), Outcome::NoMatch);
        assert!(log.to_string().contains("no files matched"));
    }

    #[test]
    fn test_upload_folder_second_run_skips() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "b.txt", "b");
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();
        let transfer = Transfer::new(&store, &progress);

        transfer.upload_folder("b", dir.path(), &UploadFolderOptions::default()).unwrap();
        let log = transfer.upload_folder("b", dir.path(), &UploadFolderOptions::default()).unwrap();

        assert_eq!(log.count(Outcome::Skipped), 2);
        assert_eq!(store.calls().puts, 2);
    }

    #[test]
    fn test_failed_item_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "b.txt", "b");
        write(dir.path(), "c.txt", "c");
        let store = MemoryStore::new().with_bucket("b");
        store.fail_key("b.txt");
        let progress = ProgressReporter::disabled();

        let log = Transfer::new(&store, &progress)
            .upload_folder("b", dir.path(), &UploadFolderOptions::default())
            .unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(log.failures(), 1);
        assert_eq!(log.count(Outcome::Uploaded), 2);
        assert_eq!(log.to_string().lines().count(), 3);
    }

    #[test]
    fn test_upload_folder_missing_root_matches_nothing() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();

        let log = Transfer::new(&store, &progress)
            .upload_folder("b", &dir.path().join("nope"), &UploadFolderOptions::default())
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].outcome(), Outcome::NoMatch);
        assert_eq!(store.calls().puts, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_upload_folder_follows_symlinked_files() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(dir.path(), "plain.png", "plain");
        write(outside.path(), "target.png", "linked");
        std::os::unix::fs::symlink(outside.path().join("target.png"), dir.path().join("link.png")).unwrap();
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();

        let log = Transfer::new(&store, &progress)
            .upload_folder("b", dir.path(), &UploadFolderOptions::default())
            .unwrap();

        assert_eq!(log.count(Outcome::Uploaded), 2);
        assert_eq!(store.keys("b"), vec!["link.png".to_string(), "plain.png".to_string()]);
        assert_eq!(store.object("b", "link.png").unwrap(), b"linked");
    }

    #[test]
    fn test_upload_matching_skips_hidden_names() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.png", "a");
        write(dir.path(), ".hidden", "h");
        write(dir.path(), ".cache/b.png", "b");
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();
        let transfer = Transfer::new(&store, &progress);

        let pattern = format!("{}/*", dir.path().display());
        let log = transfer
            .upload_matching("b", &pattern, &UploadFilesOptions::default())
            .unwrap();
        assert_eq!(log.count(Outcome::Uploaded), 1);
        assert_eq!(store.keys("b"), vec!["a.png".to_string()]);

        let recursive = format!("{}/**/*.png", dir.path().display());
        transfer
            .upload_matching("b", &recursive, &UploadFilesOptions::default())
            .unwrap();
        assert_eq!(store.keys("b"), vec!["a.png".to_string()]);

        let dotted = format!("{}/.*", dir.path().display());
        let log = transfer
            .upload_matching("b", &dotted, &UploadFilesOptions::default())
            .unwrap();
        assert_eq!(log.count(Outcome::Uploaded), 1);
        assert_eq!(store.keys("b"), vec![".hidden".to_string(), "a.png".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_upload_matching_logs_walk_errors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.png", "a");
        std::os::unix::fs::symlink(dir.path().join("missing.png"), dir.path().join("broken.png")).unwrap();
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();

        let pattern = format!("{}/*.png", dir.path().display());
        let log = Transfer::new(&store, &progress)
            .upload_matching("b", &pattern, &UploadFilesOptions::default())
            .unwrap();

        assert_eq!(log.failures(), 1);
        assert_eq!(log.count(Outcome::Uploaded), 1);
        assert!(log.entries()[0].message().starts_with("Failed to read folder entry"));
    }

    #[test]
    fn test_upload_matching_glob() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "output/a.png", "a");
        write(dir.path(), "output/b.png", "b");
        write(dir.path(), "output/c.txt", "c");
        write(dir.path(), "output/sub/d.png", "d");
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();

        let pattern = format!("{}/output/*.png", dir.path().display());
        let options = UploadFilesOptions {
            prefix: "imgs".to_string(),
            ..Default::default()
        };
        let log = Transfer::new(&store, &progress)
            .upload_matching("b", &pattern, &options)
            .unwrap();

        assert_eq!(log.count(Outcome::Uploaded), 2);
        assert_eq!(store.keys("b"), vec!["imgs/a.png".to_string(), "imgs/b.png".to_string()]);
    }

    #[test]
    fn test_upload_matching_literal_path_and_no_match() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "output/a.png", "a");
        let store = MemoryStore::new().with_bucket("b");
        let progress = ProgressReporter::disabled();
        let transfer = Transfer::new(&store, &progress);

        let literal = dir.path().join("output/a.png");
        let options = UploadFilesOptions {
            object_name: "latest.png".to_string(),
            ..Default::default()
        };
        let log = transfer
            .upload_matching("b", &literal.to_string_lossy(), &options)
            .unwrap();
        assert_eq!(log.count(Outcome::Uploaded), 1);
        assert_eq!(store.keys("b"), vec!["latest.png".to_string()]);

        let missing = format!("{}/output/*.jpg", dir.path().display());
        let log = transfer
            .upload_matching("b", &missing, &UploadFilesOptions::default())
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].outcome(), Outcome::NoMatch);
    }

    #[test]
    fn test_download_bucket_with_pattern_and_remap() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new().with_bucket("b");
        store.insert("b", "loras/v2/style.safetensors", "s");
        store.insert("b", "loras/v2/readme.md", "r");
        store.insert("b", "ckpt/base.ckpt", "c");
        let progress = ProgressReporter::disabled();

        let options = DownloadBucketOptions {
            pattern: "loras/*.safetensors".to_string(),
            replace_from: "v2/".to_string(),
            ..Default::default()
        };
        let root = dir.path().join("temp");
        let log = Transfer::new(&store, &progress)
            .download_bucket("b", &root, &options)
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.count(Outcome::Downloaded), 1);
        assert_eq!(std::fs::read_to_string(root.join("loras/style.safetensors")).unwrap(), "s");
        assert!(!root.join("ckpt").exists());
    }

    #[test]
    fn test_download_bucket_mock_transfers_nothing() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new().with_bucket("b");
        store.insert("b", "a.txt", "a");
        let progress = ProgressReporter::disabled();

        let options = DownloadBucketOptions {
            mock: true,
            ..Default::default()
        };
        let log = Transfer::new(&store, &progress)
            .download_bucket("b", dir.path(), &options)
            .unwrap();

        assert_eq!(log.count(Outcome::Mocked), 1);
        assert!(log.to_string().contains("Mock download: a.txt to "));
        assert_eq!(store.calls().gets, 0);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_download_bucket_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new().with_bucket("b");
        store.insert("b", "a.txt", "a");
        store.insert("b", "sub/b.txt", "b");
        let progress = ProgressReporter::disabled();
        let transfer = Transfer::new(&store, &progress);

        let first = transfer.download_bucket("b", dir.path(), &DownloadBucketOptions::default()).unwrap();
        assert_eq!(first.count(Outcome::Downloaded), 2);

        let second = transfer.download_bucket("b", dir.path(), &DownloadBucketOptions::default()).unwrap();
        assert_eq!(second.count(Outcome::Skipped), 2);
        assert_eq!(store.calls().gets, 2);
    }

    #[test]
    fn test_download_bucket_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new().with_bucket("b");
        store.insert("b", "../escape.txt", "x");
        store.insert("b", "folder/", "");
        let progress = ProgressReporter::disabled();

        let root = dir.path().join("temp");
        let log = Transfer::new(&store, &progress)
            .download_bucket("b", &root, &DownloadBucketOptions::default())
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.failures(), 1);
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_download_bucket_list_failure_is_logged() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let progress = ProgressReporter::disabled();

        let log = Transfer::new(&store, &progress)
            .download_bucket("missing", dir.path(), &DownloadBucketOptions::default())
            .unwrap();

        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].message().starts_with("Failed to list objects"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = compile_pattern("[").unwrap_err();
        assert!(matches!(err, BucketSyncError::Pattern { .. }));
    }
}
