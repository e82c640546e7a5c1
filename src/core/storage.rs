//! Well-known storage areas under the launch root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::BringUpError;

pub const CACHE_DIR: &str = "Cache";
pub const DATA_DIR: &str = "Data";
pub const DOCUMENTS_DIR: &str = "Documents";
pub const TEMP_DIR: &str = "Temp";
pub const CRASH_FILE: &str = "app_crash.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> PathBuf {
        self.root.join(CACHE_DIR)
    }

    pub fn data(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn documents(&self) -> PathBuf {
        self.root.join(DOCUMENTS_DIR)
    }

    pub fn temp(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    pub fn crash_file(&self) -> PathBuf {
        self.data().join(CRASH_FILE)
    }

    /// Creates cache, data and documents, empties temp and recreates it.
    ///
    /// Best-effort: every step runs and each failure is returned as a
    /// non-fatal [`BringUpError::FileSystemInit`].
    pub fn initialize(&self) -> Vec<BringUpError> {
        let mut failures = Vec::new();
        let temp = self.temp();

        for (path, source) in empty_dir(&temp, |p| fs::remove_file(p)) {
            failures.push(BringUpError::FileSystemInit { path, source });
        }
        for dir in [self.cache(), self.data(), self.documents(), temp] {
            if let Err(source) = fs::create_dir_all(&dir) {
                failures.push(BringUpError::FileSystemInit { path: dir, source });
            }
        }
        failures
    }
}

/// Deletes every non-directory entry directly inside `dir` (files and
/// symlinks); subdirectories are kept. A failed removal does not stop the
/// sweep; every failure is returned with the path it concerns.
fn empty_dir<F>(dir: &Path, remove: F) -> Vec<(PathBuf, io::Error)>
where
    F: Fn(&Path) -> io::Result<()>,
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => return vec![(dir.to_path_buf(), e)],
    };

    let mut failures = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push((dir.to_path_buf(), e));
                continue;
            }
        };
        let path = entry.path();
        // `DirEntry::file_type` does not follow symlinks.
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {}
            Ok(_) => {
                if let Err(e) = remove(&path) {
                    failures.push((path, e));
                }
            }
            Err(e) => failures.push((path, e)),
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_all_areas() {
        let root = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(root.path());

        assert!(paths.initialize().is_empty());
        for dir in [paths.cache(), paths.data(), paths.documents(), paths.temp()] {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
        assert_eq!(paths.crash_file(), root.path().join("Data/app_crash.json"));
    }

    #[test]
    fn temp_is_emptied_but_not_recursively() {
        let root = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(root.path());
        let nested = paths.temp().join("keep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(paths.temp().join("stale.bin"), b"x").unwrap();
        fs::write(nested.join("inner.bin"), b"y").unwrap();

        assert!(paths.initialize().is_empty());
        assert!(!paths.temp().join("stale.bin").exists());
        assert!(nested.join("inner.bin").exists());
    }

    #[cfg(unix)]
    #[test]
    fn temp_symlinks_are_removed_without_touching_their_target() {
        let root = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(root.path());
        let outside = root.path().join("outside.txt");
        fs::write(&outside, b"keep me").unwrap();
        fs::create_dir_all(paths.temp()).unwrap();
        std::os::unix::fs::symlink(&outside, paths.temp().join("link")).unwrap();
        std::os::unix::fs::symlink(root.path().join("gone"), paths.temp().join("dangling"))
            .unwrap();

        assert!(paths.initialize().is_empty());
        assert_eq!(fs::read_dir(paths.temp()).unwrap().count(), 0);
        assert!(outside.exists());
    }

    #[test]
    fn one_stuck_temp_file_does_not_stop_the_sweep() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.bin", "locked.bin", "b.bin", "c.bin"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let failures = empty_dir(dir.path(), |p| {
            if p.ends_with("locked.bin") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            } else {
                fs::remove_file(p)
            }
        });

        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.ends_with("locked.bin"));
        let left: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from("locked.bin")]);
    }

    #[test]
    fn failures_are_reported_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        // A file where the cache directory should be.
        fs::write(root.path().join(CACHE_DIR), b"").unwrap();
        let paths = StoragePaths::new(root.path());

        let failures = paths.initialize();
        assert_eq!(failures.len(), 1);
        assert!(!failures[0].is_fatal());
        assert!(paths.data().is_dir());
        assert!(paths.temp().is_dir());
    }
}
