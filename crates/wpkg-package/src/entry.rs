//! Package location and entry point resolution.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::error::{PackageError, PackageResult};
use crate::manifest::ManifestKind;

/// Files probed, in order, when a W3C manifest names no content file.
pub const INDEX_CANDIDATES: [&str; 2] = ["index.htm", "index.html"];

/// The URL handed to the renderer for a package's main content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryUrl {
    /// Entry file present inside the package directory.
    File(PathBuf),
    /// Entry name used as-is because no local file exists, e.g. a
    /// server-hosted package.
    Bare(String),
}

impl EntryUrl {
    /// Join `entry_file` onto `base`, falling back to the bare name when the
    /// joined path does not exist.
    #[must_use]
    pub fn resolve(base: &Path, entry_file: &str) -> Self {
        let candidate = base.join(entry_file);
        if candidate.exists() {
            Self::File(candidate)
        } else {
            debug!(
                base = %base.display(),
                entry = entry_file,
                "entry file not found locally, using bare URL"
            );
            Self::Bare(entry_file.to_owned())
        }
    }

    /// Whether the entry resolved to a local file.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// URL string for the renderer. Local files become `file://` URLs.
    #[must_use]
    pub fn to_url_string(&self) -> String {
        match self {
            Self::File(path) => Url::from_file_path(path)
                .map_or_else(|()| path.display().to_string(), |u| u.to_string()),
            Self::Bare(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for EntryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url_string())
    }
}

/// First of `index.htm`, `index.html` present in `base`, or empty.
#[must_use]
pub fn probe_index(base: &Path) -> String {
    INDEX_CANDIDATES
        .iter()
        .find(|name| base.join(name).exists())
        .map(|name| (*name).to_owned())
        .unwrap_or_default()
}

/// Local path for a `file://` URL or a plain path. `None` for other schemes.
#[must_use]
pub fn local_path(url: &str) -> Option<PathBuf> {
    if url.starts_with("file:") {
        return Url::parse(url).ok()?.to_file_path().ok();
    }
    if url.contains("://") {
        return None;
    }
    Some(PathBuf::from(url))
}

/// Directory of the package that `url` points into.
///
/// A URL naming a file inside a package (neither ending in a package
/// extension nor an existing directory) is reduced to its parent.
///
/// # Errors
///
/// Returns [`PackageError::InvalidUrl`] for non-file URLs.
pub fn package_root(url: &str) -> PackageResult<PathBuf> {
    let path = local_path(url).ok_or_else(|| PackageError::InvalidUrl(url.to_owned()))?;
    if ManifestKind::from_path(&path).is_some() || path.is_dir() {
        return Ok(path);
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(path),
    }
}
