//! Vendor.
//!
//! This module contains the default vendor the JDK gets downloaded from when no source is given.

// https://api.adoptium.net/q/swagger-ui/

use crate::error::InstallError;
use reqwest::Url;

/// Base URL of the default vendor endpoint.
pub(crate) const DEFAULT_ENDPOINT: &str = "https://api.adoptium.net/v3/binary/latest/";

/// The logical name every cache entry is prefixed with.
pub(crate) const TOOL_NAME: &str = "jdk";

/// Returns the name of the cache entry for the given (unnormalized) version.
pub(crate) fn cache_name(version: &str) -> String {
    format!("{TOOL_NAME}-{version}")
}

/// Maps the legacy `1.8` alias to `8`, every other version is returned unchanged.
pub(crate) fn normalize(version: &str) -> &str {
    match version {
        "1.8" => "8",
        _ => version,
    }
}

/// Builds the URL to download the latest GA release of the given version.
pub(crate) fn download_url(endpoint: &str, version: &str, os: &str, arch: &str) -> Result<Url, InstallError> {
    let invalid = |reason: String| InstallError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason,
    };

    let version = normalize(version);
    let url = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
    let url = url
        .join(&format!("{version}/ga/{os}/{arch}/jdk/hotspot/normal/eclipse"))
        .map_err(|err| invalid(err.to_string()))?;

    Ok(url)
}
