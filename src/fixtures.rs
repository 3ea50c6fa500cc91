//! Test fixtures.
//!
//! Helpers to build small archives and fake collaborators for the unit tests.

use crate::config::Settings;
use crate::error::InstallError;
use crate::pack::PackTool;
use crate::publish::Publisher;
use crate::source::Downloader;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Writes a zip archive with the given files (`name`, `content`) to `path`.
pub(crate) fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a tar archive with the given files (`name`, `content`) to `path`, optionally gzipped.
pub(crate) fn write_tar(path: &Path, files: &[(&str, &str)], gzip: bool) {
    let file = File::create(path).unwrap();
    if gzip {
        let encoder = GzEncoder::new(file, Compression::default());
        let encoder = append_files(tar::Builder::new(encoder), files);
        encoder.finish().unwrap();
    } else {
        append_files(tar::Builder::new(file), files);
    }
}

// Appends the files to the builder and returns the underlying writer.
fn append_files<W: Write>(mut builder: tar::Builder<W>, files: &[(&str, &str)]) -> W {
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Creates settings rooted in the given directory.
pub(crate) fn settings(root: &Path) -> Settings {
    Settings {
        endpoint: "https://vendor.invalid/v3/binary/latest/".to_string(),
        env_file: None,
        os: "linux".to_string(),
        path_file: None,
        temp_dir: root.join("temp"),
        tool_cache: root.join("tools"),
    }
}

/// [`Downloader`] that copies a prepared archive instead of talking to the network.
pub(crate) struct FakeDownloader {
    archive: Option<PathBuf>,
    pub(crate) calls: RefCell<Vec<String>>,
}

impl FakeDownloader {
    /// Creates a downloader that serves the given archive for every URL.
    pub(crate) fn serving(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: Some(archive.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Creates a downloader that fails every request.
    pub(crate) fn failing() -> Self {
        Self {
            archive: None,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, InstallError> {
        self.calls.borrow_mut().push(url.to_string());
        let Some(archive) = &self.archive else {
            return Err(InstallError::download(url, io::Error::other("404 Not Found")));
        };
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join("download");
        fs::copy(archive, &dest)?;
        Ok(dest)
    }
}

/// [`PackTool`] that writes a small jar next to each pack file.
#[derive(Default)]
pub(crate) struct FakePackTool {
    pub(crate) unpacked: RefCell<Vec<PathBuf>>,
}

impl PackTool for FakePackTool {
    fn unpack(&self, _bin: &Path, pack: &Path, jar: &Path) -> Result<(), InstallError> {
        fs::write(jar, "jar")?;
        self.unpacked.borrow_mut().push(pack.to_path_buf());
        Ok(())
    }
}

/// [`Publisher`] that records everything it is asked to publish.
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    pub(crate) variables: RefCell<Vec<(String, String)>>,
    pub(crate) paths: RefCell<Vec<PathBuf>>,
    pub(crate) fail: Cell<bool>,
}

impl Publisher for RecordingPublisher {
    fn export_variable(&self, name: &str, value: &str) -> io::Result<()> {
        if self.fail.get() {
            return Err(io::Error::other("read-only environment"));
        }
        self.variables.borrow_mut().push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn add_path(&self, dir: &Path) -> io::Result<()> {
        self.paths.borrow_mut().push(dir.to_path_buf());
        Ok(())
    }
}
