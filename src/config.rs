//! Configuration.
//!
//! This module contains the settings shared by a single run. They are derived from the environment of the
//! build runner and can be overridden from a YAML file.

use crate::vendor::DEFAULT_ENDPOINT;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{instrument, trace};

/// OS tag used for Windows hosts.
pub(crate) const OS_WINDOWS: &str = "windows";

/// OS tag used for macOS hosts.
pub(crate) const OS_MAC: &str = "mac";

/// OS tag used for all other hosts.
pub(crate) const OS_LINUX: &str = "linux";

/// The settings for a single run.
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    /// The base URL of the default vendor endpoint.
    pub(crate) endpoint: String,
    /// The file exported variables get appended to, if any.
    pub(crate) env_file: Option<PathBuf>,
    /// The OS tag (`windows`, `mac` or `linux`).
    pub(crate) os: String,
    /// The file added paths get appended to, if any.
    pub(crate) path_file: Option<PathBuf>,
    /// The root for scratch directories and downloads.
    pub(crate) temp_dir: PathBuf,
    /// The root of the tool cache.
    pub(crate) tool_cache: PathBuf,
}

impl Settings {
    /// Loads the settings from the environment and applies the optional configuration file on top.
    #[instrument(err, level = "trace")]
    pub(crate) fn load(config: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = Self::from_vars(|name| env::var(name).ok());
        if let Some(config) = config {
            let config = SettingsConfig::load_from_file(config)?;
            settings.apply(config)?;
        }

        Ok(settings)
    }

    // Derives the settings from the given variable lookup.
    fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| var(name).filter(|value| !value.is_empty());
        let os = os_tag();
        let base = match os {
            OS_WINDOWS => PathBuf::from(var("USERPROFILE").unwrap_or_else(|| "C:\\".to_string())),
            OS_MAC => PathBuf::from("/Users"),
            _ => PathBuf::from("/home"),
        };
        trace!(base = %base.display());

        let temp_dir = var("RUNNER_TEMP").map_or_else(|| base.join("actions").join("temp"), PathBuf::from);
        let tool_cache = var("RUNNER_TOOL_CACHE").map_or_else(|| base.join("actions").join("cache"), PathBuf::from);

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            env_file: var("GITHUB_ENV").map(PathBuf::from),
            os: os.to_string(),
            path_file: var("GITHUB_PATH").map(PathBuf::from),
            temp_dir,
            tool_cache,
        }
    }

    // Overrides the settings with the values from the configuration file.
    fn apply(&mut self, config: SettingsConfig) -> anyhow::Result<()> {
        if let Some(endpoint) = config.endpoint {
            self.endpoint = shellexpand::full(&endpoint)?.into_owned();
        }
        if let Some(temp_dir) = config.temp_dir {
            self.temp_dir = PathBuf::from(shellexpand::full(&temp_dir)?.as_ref());
        }
        if let Some(tool_cache) = config.tool_cache {
            self.tool_cache = PathBuf::from(shellexpand::full(&tool_cache)?.as_ref());
        }

        Ok(())
    }
}

/// The optional configuration read from a YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct SettingsConfig {
    /// The base URL of the default vendor endpoint.
    pub(crate) endpoint: Option<String>,
    /// The root for scratch directories and downloads.
    pub(crate) temp_dir: Option<String>,
    /// The root of the tool cache.
    pub(crate) tool_cache: Option<String>,
}

impl SettingsConfig {
    /// Loads the configuration from the given filename.
    #[instrument(err, level = "trace")]
    pub(crate) fn load_from_file<P>(filename: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_file = File::open(filename)?;
        let config = serde_yaml::from_reader(config_file)?;

        Ok(config)
    }
}

// Returns the OS tag of the host.
#[doc(hidden)]
fn os_tag() -> &'static str {
    if cfg!(windows) {
        OS_WINDOWS
    } else if cfg!(target_os = "macos") {
        OS_MAC
    } else {
        OS_LINUX
    }
}
