//! Directory layout of the wpkg home.
//!
//! ```text
//! ~/.wpkg/                  (WpkgHome)
//! ├── config.toml           (user config)
//! ├── library/              (package library, wrappers land in library/Web)
//! ├── snapshots/            (frozen package bitmaps)
//! └── logs/                 (rolling log files)
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Global wpkg home directory (`~/.wpkg/` or `$WPKG_HOME`).
#[derive(Debug, Clone)]
pub struct WpkgHome {
    root: PathBuf,
}

impl WpkgHome {
    /// Resolve the home directory.
    ///
    /// Checks `$WPKG_HOME` first, then falls back to `$HOME/.wpkg/`.
    ///
    /// # Errors
    ///
    /// Returns an error if `$WPKG_HOME` is relative or no home directory can
    /// be determined.
    pub fn resolve() -> io::Result<Self> {
        if let Ok(custom) = std::env::var("WPKG_HOME") {
            let root = PathBuf::from(custom);
            if !root.is_absolute() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "WPKG_HOME must be an absolute path",
                ));
            }
            return Ok(Self { root });
        }

        let base = directories::BaseDirs::new().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "neither WPKG_HOME nor a home directory is available",
            )
        })?;
        Ok(Self {
            root: base.home_dir().join(".wpkg"),
        })
    }

    /// Create from an explicit path.
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the library, snapshot and log directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.library_dir())?;
        std::fs::create_dir_all(self.snapshots_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// User config file (`~/.wpkg/config.toml`).
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Default package library (`~/.wpkg/library/`).
    #[must_use]
    pub fn library_dir(&self) -> PathBuf {
        self.root.join("library")
    }

    /// Snapshot directory (`~/.wpkg/snapshots/`).
    #[must_use]
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    /// Log directory (`~/.wpkg/logs/`).
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let home = WpkgHome::from_path("/tmp/wpkg-home");
        assert_eq!(home.root(), Path::new("/tmp/wpkg-home"));
        assert_eq!(home.config_path(), PathBuf::from("/tmp/wpkg-home/config.toml"));
        assert_eq!(home.library_dir(), PathBuf::from("/tmp/wpkg-home/library"));
        assert_eq!(
            home.snapshots_dir(),
            PathBuf::from("/tmp/wpkg-home/snapshots")
        );
    }

    #[test]
    fn test_ensure_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let home = WpkgHome::from_path(dir.path().join("home"));
        home.ensure().unwrap();
        assert!(home.library_dir().is_dir());
        assert!(home.snapshots_dir().is_dir());
        assert!(home.logs_dir().is_dir());
    }
}
