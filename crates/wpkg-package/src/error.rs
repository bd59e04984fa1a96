use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening, wrapping or snapshotting packages.
#[derive(Debug, Error)]
pub enum PackageError {
    /// Neither `config.xml` nor `Info.plist` was found in the package.
    #[error("No package manifest found in {0}")]
    NoManifest(PathBuf),

    /// The package URL could not be turned into a local path.
    #[error("Invalid package URL: {0}")]
    InvalidUrl(String),

    /// No wrapper template matches the resource.
    #[error("No wrapper template for MIME type '{mime_type}' or extension '{extension}'")]
    MissingTemplate {
        /// Effective MIME type used for the lookup.
        mime_type: String,
        /// Resource extension used as fallback key.
        extension: String,
    },

    /// A library-relative operation was requested without a library
    /// directory.
    #[error("No widget library directory configured")]
    NoLibraryDir,

    /// File system operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Snapshot bitmap could not be encoded or decoded.
    #[error("Snapshot error at {path}: {source}")]
    Snapshot {
        /// Snapshot file.
        path: PathBuf,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// The package has no snapshot to save.
    #[error("Package has no snapshot")]
    NoSnapshot,
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized Result type for package operations.
pub type PackageResult<T> = Result<T, PackageError>;
