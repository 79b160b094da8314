//! Version Resolver - Deployment Marker Lookup
//!
//! Reads the deployment version once at startup from an optional text
//! marker (`version.txt`). A missing marker is an expected case and
//! resolves to [`DEFAULT_VERSION`]; the result is immutable for the
//! lifetime of the process and labels every metric and greeting.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Version used when no marker is present.
pub const DEFAULT_VERSION: &str = "v1";

/// Relative path of the version marker.
pub const DEFAULT_MARKER_PATH: &str = "./version.txt";

/// Outcome of version resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Trimmed version string.
    pub version: String,
    /// Whether the fallback was used because the marker was absent or blank.
    pub used_default: bool,
}

impl ResolvedVersion {
    /// Resolve from raw marker contents (`None` when the marker is absent).
    ///
    /// Surrounding whitespace is trimmed; a blank marker falls back to
    /// [`DEFAULT_VERSION`] the same way a missing one does.
    pub fn from_marker(contents: Option<&str>) -> Self {
        match contents.map(str::trim) {
            Some(version) if !version.is_empty() => Self {
                version: version.to_string(),
                used_default: false,
            },
            _ => Self {
                version: DEFAULT_VERSION.to_string(),
                used_default: true,
            },
        }
    }
}

/// Marker exists but could not be read.
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("failed to read version marker {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read the version marker at `path`.
///
/// # Errors
/// Returns [`VersionError::Unreadable`] if the file exists but cannot be
/// read (permissions, invalid UTF-8). A missing file is not an error.
pub fn resolve_version(path: impl AsRef<Path>) -> Result<ResolvedVersion, VersionError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(ResolvedVersion::from_marker(Some(&contents))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ResolvedVersion::from_marker(None)),
        Err(source) => Err(VersionError::Unreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
