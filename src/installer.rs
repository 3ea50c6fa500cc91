//! Installer.
//!
//! This module contains the orchestration of a single installation: look up the cache, acquire and unpack the
//! JDK if necessary, store it in the cache and publish the result.

use crate::archive::{self, ArchiveHint, ArchiveType};
use crate::cache::ToolCache;
use crate::config::Settings;
use crate::error::InstallError;
use crate::pack::{self, PackTool};
use crate::publish::{self, Publisher};
use crate::source::{Acquired, Downloader, Resolver};
use crate::vendor;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, instrument};

// Prefix of the scratch directory an archive gets extracted to.
#[doc(hidden)]
const SCRATCH_PREFIX: &str = "temp_";

// Prefix of the directory downloads are placed in.
#[doc(hidden)]
const DOWNLOAD_PREFIX: &str = "download_";

/// The request to install a JDK.
#[derive(Clone, Debug)]
pub(crate) struct InstallRequest {
    /// The version of the JDK (`8`, `1.8`, `17`, ...).
    pub(crate) version: String,
    /// The architecture of the JDK (`x64`, `x86`, `aarch64`, ...).
    pub(crate) arch: String,
    /// URL, archive or directory to install from; empty for the default vendor.
    pub(crate) source: String,
    /// The archive type of the source.
    pub(crate) hint: ArchiveHint,
    /// The `;`-separated names of the variables to bind.
    pub(crate) targets: String,
}

/// Installs JDKs into the tool cache.
pub(crate) struct Installer<'a> {
    cache: ToolCache,
    downloader: &'a dyn Downloader,
    pack_tool: &'a dyn PackTool,
    publisher: &'a dyn Publisher,
    settings: &'a Settings,
}

impl<'a> Installer<'a> {
    /// Creates a new `Installer`.
    pub(crate) fn new(settings: &'a Settings, downloader: &'a dyn Downloader, pack_tool: &'a dyn PackTool, publisher: &'a dyn Publisher) -> Self {
        Self {
            cache: ToolCache::new(&settings.tool_cache),
            downloader,
            pack_tool,
            publisher,
            settings,
        }
    }

    /// Installs the requested JDK (unless it is cached already) and binds the targets to it.
    ///
    /// Returns the path of the installation.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn install(&self, request: &InstallRequest) -> Result<PathBuf, InstallError> {
        let name = vendor::cache_name(&request.version);
        let path = match self.cache.find(&name, &request.arch) {
            Some(path) => {
                debug!(path = %path.display(), "JDK found in cache");
                path
            }
            None => self.provide(&name, request)?,
        };

        publish::bind_targets(&request.targets, &path, self.publisher)?;

        Ok(path)
    }

    // Acquires, unpacks and caches the JDK while holding the lock of the cache entry.
    fn provide(&self, name: &str, request: &InstallRequest) -> Result<PathBuf, InstallError> {
        let _lock = self.cache.lock(name, &request.arch)?;

        // somebody else may have installed it while we were waiting
        if let Some(path) = self.cache.find(name, &request.arch) {
            debug!(path = %path.display(), "JDK installed concurrently");
            return Ok(path);
        }

        fs::create_dir_all(&self.settings.temp_dir)?;
        let downloads = self.temp_dir(DOWNLOAD_PREFIX)?;
        let resolver = Resolver::new(self.settings, self.downloader);
        let acquired = resolver.resolve(&request.source, &request.version, &request.arch, request.hint, downloads.path())?;

        let path = match acquired {
            Acquired::Directory(dir) => self.cache.store(&dir, name, &request.arch)?,
            Acquired::Archive { path, archive_type } => {
                let scratch = self.temp_dir(SCRATCH_PREFIX)?;
                let jdk_dir = self.unpack(&path, archive_type, scratch.path())?;
                self.cache.store(&jdk_dir, name, &request.arch)?
            }
        };
        info!(path = %path.display(), "JDK installed");

        Ok(path)
    }

    // Extracts the archive into the scratch directory and expands its pack files. Returns the JDK root.
    fn unpack(&self, file: &Path, archive_type: ArchiveType, scratch: &Path) -> Result<PathBuf, InstallError> {
        archive::extract(file, archive_type, scratch)?;

        // the first entry is the JDK
        let Some(entry) = fs::read_dir(scratch)?.next() else {
            return Err(InstallError::EmptyArchive(file.to_path_buf()));
        };
        let jdk_dir = entry?.path();
        debug!(jdk_dir = %jdk_dir.display());
        if !jdk_dir.is_dir() {
            return Err(InstallError::NoJdkDirectory(file.to_path_buf()));
        }

        let count = pack::unpack_all(&jdk_dir, &jdk_dir.join("bin"), self.pack_tool)?;
        debug!(count, "unpacked pack files");

        Ok(jdk_dir)
    }

    // Creates a uniquely named directory below the temp root.
    fn temp_dir(&self, prefix: &str) -> Result<TempDir, InstallError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(&self.settings.temp_dir)?;

        Ok(dir)
    }
}
