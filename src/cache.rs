//! Tool cache.
//!
//! This module contains the durable cache of installed JDKs. Every entry lives in `<root>/<name>/1.0.0/<arch>`
//! and only counts as installed once its sibling marker `<arch>.complete` exists.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace, warn};
use walkdir::WalkDir;

/// The fixed version every entry is stored under.
pub(crate) const CACHE_VERSION: &str = "1.0.0";

// Suffix of the completion marker.
#[doc(hidden)]
const COMPLETE_SUFFIX: &str = ".complete";

// Suffix of the lock file.
#[doc(hidden)]
const LOCK_SUFFIX: &str = ".lock";

// Prefix of the staging directory an entry is copied to before it is moved into place.
#[doc(hidden)]
const STAGING_PREFIX: &str = ".staging-";

/// The tool cache below a root directory.
#[derive(Debug)]
pub(crate) struct ToolCache {
    root: PathBuf,
}

impl ToolCache {
    /// Creates a new `ToolCache` below the given root directory.
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory of the entry for the given name and architecture.
    pub(crate) fn entry_dir(&self, name: &str, arch: &str) -> PathBuf {
        self.root.join(name).join(CACHE_VERSION).join(arch)
    }

    /// Returns the path of the entry, if it was completely installed.
    #[instrument(level = "trace", skip(self), ret)]
    pub(crate) fn find(&self, name: &str, arch: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(name, arch);
        let complete = dir.is_dir() && with_suffix(&dir, COMPLETE_SUFFIX).is_file();
        if complete {
            return Some(dir);
        }

        if dir.exists() {
            debug!(dir = %dir.display(), "ignoring partially installed entry");
        }

        None
    }

    /// Takes the exclusive lock for the given entry, blocking until it becomes available.
    ///
    /// The lock is released when the returned guard is dropped.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn lock(&self, name: &str, arch: &str) -> io::Result<CacheLock> {
        let dir = self.entry_dir(name, arch);
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)?;
        }

        let path = with_suffix(&dir, LOCK_SUFFIX);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.lock()?;
        trace!(lock = %path.display(), "acquired");

        Ok(CacheLock { file, path })
    }

    /// Copies the given directory into the cache and marks the entry as complete.
    ///
    /// The copy is staged next to the entry and renamed into place, the marker is written last.
    #[instrument(err, level = "trace", skip(self))]
    pub(crate) fn store(&self, source: &Path, name: &str, arch: &str) -> io::Result<PathBuf> {
        if !source.is_dir() {
            let msg = format!("{} is not a directory", source.display());
            return Err(io::Error::new(io::ErrorKind::NotADirectory, msg));
        }

        let dir = self.entry_dir(name, arch);
        let marker = with_suffix(&dir, COMPLETE_SUFFIX);
        let parent = dir.parent().ok_or_else(|| io::Error::other("cache entry without parent"))?;
        fs::create_dir_all(parent)?;

        // invalidate the old entry before touching it
        if marker.exists() {
            fs::remove_file(&marker)?;
        }

        let staging = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir_in(parent)?;
        copy_dir(source, staging.path())?;

        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::rename(staging.path(), &dir)?;
        let _ = staging.keep();

        File::create(&marker)?;
        debug!(dir = %dir.display(), "stored in cache");

        Ok(dir)
    }
}

/// Guard for the exclusive lock of a cache entry.
#[derive(Debug)]
pub(crate) struct CacheLock {
    file: File,
    path: PathBuf,
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            warn!(?err, lock = %self.path.display(), "failed to release lock");
        }
    }
}

// Appends the suffix to the given path (`x64` -> `x64.complete`).
#[doc(hidden)]
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(path.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

// Recursively copies the content of `from` into the existing directory `to`.
fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

// Recreates the symlink at the target.
#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let link = fs::read_link(from)?;
    std::os::unix::fs::symlink(link, to)
}

// Copies what the symlink points to.
#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_dir() {
        fs::create_dir_all(to)?;
        copy_dir(from, to)
    } else {
        fs::copy(from, to).map(|_| ())
    }
}
