//! Source.
//!
//! This module contains the code that decides where a JDK comes from: a URL, a local archive, a local directory
//! or the default vendor.

use crate::archive::{ArchiveHint, ArchiveType};
use crate::config::{OS_WINDOWS, Settings};
use crate::error::InstallError;
use crate::vendor;
use reqwest::Url;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

// File name for downloads whose URL does not end with a usable name.
#[doc(hidden)]
const DEFAULT_DOWNLOAD_NAME: &str = "download";

/// Trait for downloaders.
pub(crate) trait Downloader {
    /// Downloads the given URL into `dest_dir` and returns the path of the downloaded file.
    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, InstallError>;
}

/// [`Downloader`] implementation based on a blocking HTTP client.
#[derive(Debug, Default)]
pub(crate) struct HttpDownloader;

impl Downloader for HttpDownloader {
    #[instrument(level = "trace", skip(self))]
    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, InstallError> {
        let name = url_file_name(url).unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());
        let dest = dest_dir.join(name);

        // make request (JDKs are big, so no overall timeout)
        let client = reqwest::blocking::Client::builder()
            .timeout(Option::<Duration>::None)
            .build()
            .map_err(|err| InstallError::download(url, err))?;
        let mut response = client
            .get(url) //
            .header(reqwest::header::ACCEPT, "application/octet-stream") //
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| InstallError::download(url, err))?;

        // download file
        fs::create_dir_all(dest_dir)?;
        trace!(pkg = %dest.display());
        let mut dest_file = File::create(&dest)?;
        let bytes_written = response.copy_to(&mut dest_file).map_err(|err| InstallError::download(url, err))?;
        trace!(bytes_written);

        Ok(dest)
    }
}

/// The result of resolving a source.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Acquired {
    /// An archive that still needs to be extracted.
    Archive { path: PathBuf, archive_type: ArchiveType },
    /// A directory that already is the JDK.
    Directory(PathBuf),
}

/// Resolves the source of a JDK into something on local disk.
pub(crate) struct Resolver<'a> {
    downloader: &'a dyn Downloader,
    settings: &'a Settings,
}

impl<'a> Resolver<'a> {
    /// Creates a new `Resolver`.
    pub(crate) fn new(settings: &'a Settings, downloader: &'a dyn Downloader) -> Self {
        Self { downloader, settings }
    }

    /// Resolves the given source. Downloads are placed into `download_dir`.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn resolve(
        &self,
        source: &str,
        version: &str,
        arch: &str,
        hint: ArchiveHint,
        download_dir: &Path,
    ) -> Result<Acquired, InstallError> {
        if source.is_empty() {
            return self.resolve_vendor(version, arch, hint, download_dir);
        }

        if is_url(source) {
            return self.resolve_url(source, hint, download_dir);
        }

        resolve_local(Path::new(source), hint)
    }

    // Downloads the latest release from the default vendor.
    fn resolve_vendor(&self, version: &str, arch: &str, hint: ArchiveHint, download_dir: &Path) -> Result<Acquired, InstallError> {
        let url = vendor::download_url(&self.settings.endpoint, version, &self.settings.os, arch)?;
        let archive_type = hint.explicit().unwrap_or_else(|| self.host_archive_type());
        debug!(%url, %archive_type, "downloading JDK from default vendor");

        let path = self.downloader.download(url.as_str(), download_dir)?;

        Ok(Acquired::Archive { path, archive_type })
    }

    // Downloads the archive from the given URL.
    fn resolve_url(&self, url: &str, hint: ArchiveHint, download_dir: &Path) -> Result<Acquired, InstallError> {
        let archive_type = match hint {
            ArchiveHint::Explicit(archive_type) => archive_type,
            ArchiveHint::InferFromName => ArchiveType::infer(url_file_name(url).unwrap_or_default()),
            ArchiveHint::Unspecified => {
                warn!(url, "archive extension is required for a URL source");
                return Err(InstallError::MissingArchiveType(url.to_string()));
            }
        };
        debug!(url, %archive_type, "downloading JDK");

        let path = self.downloader.download(url, download_dir)?;

        Ok(Acquired::Archive { path, archive_type })
    }

    // Returns the archive type the default vendor serves for this host.
    fn host_archive_type(&self) -> ArchiveType {
        if self.settings.os == OS_WINDOWS { ArchiveType::Zip } else { ArchiveType::Tar }
    }
}

// Resolves a local archive or directory.
fn resolve_local(path: &Path, hint: ArchiveHint) -> Result<Acquired, InstallError> {
    let Ok(metadata) = fs::metadata(path) else {
        return Err(InstallError::InvalidInput(path.to_path_buf()));
    };

    if metadata.is_dir() {
        debug!(dir = %path.display(), "using JDK directory as-is");
        return Ok(Acquired::Directory(path.to_path_buf()));
    }

    if metadata.is_file() {
        let archive_type = hint.explicit().unwrap_or_else(|| ArchiveType::infer(path));
        return Ok(Acquired::Archive {
            path: path.to_path_buf(),
            archive_type,
        });
    }

    Err(InstallError::InvalidInput(path.to_path_buf()))
}

// Whether the source is a URL.
#[doc(hidden)]
fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

// Returns the last non-empty path segment of the URL.
#[doc(hidden)]
fn url_file_name(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let name = url.path_segments()?.next_back()?;
    (!name.is_empty()).then(|| name.to_string())
}
