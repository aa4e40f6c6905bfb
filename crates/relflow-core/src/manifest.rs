//! Manifest version reader.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use tracing::{debug, warn};

use crate::{CoreError, CoreResult};

static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^version\s*=\s*"([^"]*)""#).expect("invalid regex"));

/// Returns the value of the first `version = "..."` line, if any.
///
/// Lines are scanned in order and scanning stops at the first match, so a
/// `[package]` version wins over later dependency tables. The key must start
/// the line; indented `version` keys belong to nested tables.
pub fn parse_version(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        VERSION_LINE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Reads the version string from a manifest file.
///
/// The value is returned verbatim; a value that is not valid semver only
/// produces a warning.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - No line declares a version
pub fn read_version(path: &Path) -> CoreResult<String> {
    if !path.exists() {
        return Err(CoreError::ManifestNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let version = parse_version(&content).ok_or_else(|| CoreError::MissingField {
        path: path.to_path_buf(),
    })?;

    if let Err(e) = Version::parse(&version) {
        warn!(%version, error = %e, "manifest version is not valid semver");
    }
    debug!(?path, %version, "read manifest version");

    Ok(version)
}
