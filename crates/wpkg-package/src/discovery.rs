//! Package discovery in library directories.
//!
//! A library directory holds package directories named `*.wgt` or
//! `*.wdgt`. Broken packages are logged and skipped so one bad entry never
//! hides the rest of the library.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PackageError, PackageResult};
use crate::manifest::{ManifestKind, ParsedManifest, describe};

/// A package found in a library directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredPackage {
    /// Package directory.
    pub path: PathBuf,
    /// Dialect detected from the directory contents.
    pub kind: ManifestKind,
    /// `"name version"` label, empty when the manifest has no name.
    pub label: String,
    /// Parsed manifest.
    pub manifest: ParsedManifest,
}

/// Discover packages in each of `dirs`.
///
/// Missing directories are skipped; unreadable ones are logged.
pub fn discover_packages(dirs: &[PathBuf], language: &str) -> Vec<DiscoveredPackage> {
    let mut packages = Vec::new();

    for dir in dirs {
        if !dir.exists() {
            debug!(path = %dir.display(), "library directory does not exist");
            continue;
        }
        info!(path = %dir.display(), "discovering packages");
        match load_packages_from_dir(dir, language) {
            Ok(found) => packages.extend(found),
            Err(e) => warn!(path = %dir.display(), error = %e, "failed to scan library directory"),
        }
    }

    info!(count = packages.len(), "discovered packages");
    packages
}

/// Load every package directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`PackageError::Io`] when `dir` itself cannot be listed.
pub fn load_packages_from_dir(dir: &Path, language: &str) -> PackageResult<Vec<DiscoveredPackage>> {
    let entries = std::fs::read_dir(dir).map_err(|e| PackageError::io(dir, e))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            },
        })
        .filter(|path| path.is_dir() && ManifestKind::from_path(path).is_some())
        .collect();
    paths.sort();

    let mut packages = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(kind) = ManifestKind::detect(&path) else {
            warn!(path = %path.display(), "package directory has no manifest, skipping");
            continue;
        };
        let manifest = kind.parse(&path, language);
        let label = describe(&path.to_string_lossy());
        debug!(path = %path.display(), kind = %kind, label = %label, "found package");
        packages.push(DiscoveredPackage {
            path,
            kind,
            label,
            manifest,
        });
    }
    Ok(packages)
}
