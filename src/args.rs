//! Arguments.
//!
//! This module contains the definition for the available command-line parameter.

use crate::archive::ArchiveHint;
use crate::installer::InstallRequest;
use clap::Parser;

#[derive(Debug, Parser)]
#[clap(author)]
pub(crate) struct Args {
    /// The JDK version to install (e.g. 8, 1.8, 11, 17)
    #[clap(short = 'j', long, value_name = "version", env = "INPUT_VERSION", required_unless_present = "version")]
    pub(crate) jdk_version: Option<String>,
    /// The architecture of the JDK
    #[clap(short, long, value_name = "arch", env = "INPUT_ARCHITECTURE", default_value = "x64")]
    pub(crate) architecture: String,
    /// URL, archive or directory to install the JDK from (default: download from the vendor)
    #[clap(short, long, value_name = "source", env = "INPUT_SOURCE", default_value = "")]
    pub(crate) source: String,
    /// The archive type of the source (.zip, .tar, .7z or auto)
    #[clap(short = 'e', long, value_name = "ext", env = "INPUT_ARCHIVEEXTENSION")]
    pub(crate) archive_extension: Option<ArchiveHint>,
    /// Semicolon-separated names of the variables to bind to the installation
    #[clap(short, long, value_name = "names", env = "INPUT_TARGETS", default_value = "JAVA_HOME")]
    pub(crate) targets: String,
    /// Sets a custom config file
    #[clap(short, long, value_name = "file")]
    pub(crate) config: Option<String>,
    /// Suppress unnecessary information
    #[clap(short = 'q', long, action)]
    pub(crate) quiet: bool,
    /// Change level of verbosity (apply multiple times to increase level)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
    /// Print version information
    #[clap(short = 'V', long, action)]
    pub(crate) version: bool,
}

impl Args {
    /// Builds the installation request, if a JDK version was given.
    pub(crate) fn request(&self) -> Option<InstallRequest> {
        let version = self.jdk_version.clone()?;

        Some(InstallRequest {
            version,
            arch: self.architecture.clone(),
            source: self.source.clone(),
            hint: self.archive_extension.unwrap_or_default(),
            targets: self.targets.clone(),
        })
    }
}
