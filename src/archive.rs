//! Archive.
//!
//! This module contains the code to extract a JDK archive (tar, zip or 7z) into a directory.

use crate::error::InstallError;
use flate2::read::GzDecoder;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::{debug, instrument, trace, warn};

// Magic bytes at the start of a gzip stream.
#[doc(hidden)]
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

// Name of the external 7-Zip executable.
#[cfg(windows)]
#[doc(hidden)]
const SEVEN_ZIP_EXE: &str = "7z.exe";

// Name of the external 7-Zip executable.
#[cfg(not(windows))]
#[doc(hidden)]
const SEVEN_ZIP_EXE: &str = "7z";

/// The supported archive types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ArchiveType {
    /// Tar archive, optionally gzipped.
    Tar,
    /// Zip archive.
    Zip,
    /// 7-Zip archive, also the fallback for unknown extensions.
    SevenZip,
}

impl ArchiveType {
    /// Infers the archive type from the name of the given path.
    ///
    /// The content is never inspected, so a mislabeled archive fails later in the decoder.
    pub(crate) fn infer(path: impl AsRef<Path>) -> Self {
        let name = path.as_ref().to_string_lossy();
        if name.ends_with(".tar") || name.ends_with(".tar.gz") {
            Self::Tar
        } else if name.ends_with(".zip") {
            Self::Zip
        } else {
            Self::SevenZip
        }
    }

    /// Returns the extension used on the command line for this archive type.
    pub(crate) fn extension(self) -> &'static str {
        match self {
            Self::Tar => ".tar",
            Self::Zip => ".zip",
            Self::SevenZip => ".7z",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.trim_start_matches('.') {
            "tar" => Ok(Self::Tar),
            "zip" => Ok(Self::Zip),
            "7z" => Ok(Self::SevenZip),
            _ => Err(format!("archive extension should be one of [.zip, .tar, .7z]. Found: {s}")),
        }
    }
}

/// Where the archive type of an acquired archive comes from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum ArchiveHint {
    /// The user named the archive type.
    Explicit(ArchiveType),
    /// The user asked to infer the archive type from the file name.
    InferFromName,
    /// Nothing was given.
    #[default]
    Unspecified,
}

impl ArchiveHint {
    /// Returns the explicit archive type, if any.
    pub(crate) fn explicit(self) -> Option<ArchiveType> {
        match self {
            Self::Explicit(archive_type) => Some(archive_type),
            Self::InferFromName | Self::Unspecified => None,
        }
    }
}

impl FromStr for ArchiveHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(Self::Unspecified),
            "auto" | "infer" => Ok(Self::InferFromName),
            value => value.parse().map(Self::Explicit),
        }
    }
}

/// Extracts the given archive into the destination directory.
#[instrument(level = "trace")]
pub(crate) fn extract(file: &Path, archive_type: ArchiveType, dest: &Path) -> Result<(), InstallError> {
    let metadata = match fs::metadata(file) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(InstallError::NotFound(file.to_path_buf())),
        Err(err) => return Err(err.into()),
    };
    if metadata.is_dir() {
        return Err(InstallError::InvalidInput(file.to_path_buf()));
    }

    fs::create_dir_all(dest)?;
    debug!(file = %file.display(), %archive_type, "extracting");
    match archive_type {
        ArchiveType::Tar => extract_tar(file, dest),
        ArchiveType::Zip => extract_zip(file, dest),
        ArchiveType::SevenZip => extract_7z(file, dest),
    }
}

// Extracts a (possibly gzipped) tar archive.
fn extract_tar(file: &Path, dest: &Path) -> Result<(), InstallError> {
    let mut reader = BufReader::new(File::open(file)?);
    let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    trace!(gzipped);

    let result = if gzipped {
        unpack_tar(tar::Archive::new(GzDecoder::new(reader)), dest)
    } else {
        unpack_tar(tar::Archive::new(reader), dest)
    };

    result.map_err(|err| InstallError::decode(file, err))
}

// Unpacks all entries of the tar archive below the destination directory.
fn unpack_tar<R: Read>(mut archive: tar::Archive<R>, dest: &Path) -> std::io::Result<()> {
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    for entry in archive.entries()? {
        let mut entry = entry?;

        // `unpack_in` refuses names that would escape the destination
        if !entry.unpack_in(dest)? {
            let path_bytes = entry.path_bytes();
            let name = String::from_utf8_lossy(&path_bytes);
            warn!(name = %name, "skipping dangerous name");
        }
    }

    Ok(())
}

// Extracts a zip archive.
fn extract_zip(file: &Path, dest: &Path) -> Result<(), InstallError> {
    let mut zip = zip::ZipArchive::new(File::open(file)?).map_err(|err| InstallError::decode(file, err))?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|err| InstallError::decode(file, err))?;
        let Some(name) = entry.enclosed_name() else {
            warn!(name = entry.name(), "skipping dangerous name");
            continue;
        };

        let target = dest.join(name);
        trace!("unpacking {target:?}");
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        // the content of a symlink entry is the link target
        #[cfg(unix)]
        if entry.is_symlink() {
            let mut link = String::new();
            entry.read_to_string(&mut link).map_err(|err| InstallError::decode(file, err))?;
            std::os::unix::fs::symlink(&link, &target)?;
            continue;
        }

        let mut outfile = File::create(&target)?;
        std::io::copy(&mut entry, &mut outfile).map_err(|err| InstallError::decode(file, err))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

// Extracts a 7z archive with the external 7-Zip executable.
fn extract_7z(file: &Path, dest: &Path) -> Result<(), InstallError> {
    let mut out_dir = std::ffi::OsString::from("-o");
    out_dir.push(dest);

    let status = Command::new(SEVEN_ZIP_EXE)
        .arg("x") // extract with full paths
        .arg("-y") // assume yes on all queries
        .arg(out_dir)
        .arg(file)
        .stdin(Stdio::null()) // disconnect from process
        .stdout(Stdio::null()) // disconnect from process
        .status()
        .map_err(|err| InstallError::decode(file, err))?;
    trace!(?status);

    if !status.success() {
        return Err(InstallError::decode(file, format!("{SEVEN_ZIP_EXE} exited with {status}")));
    }

    Ok(())
}
