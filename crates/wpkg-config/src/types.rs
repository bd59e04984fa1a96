//! Configuration types for the wpkg toolkit.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML produces a working configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wrapper template location.
    pub templates: TemplatesSection,
    /// Inline scripts injected into every package.
    pub scripts: ScriptsSection,
    /// Where synthesized packages are written by default.
    pub library: LibrarySection,
    /// Language used to pick localized manifest text.
    pub locale: LocaleSection,
    /// Logging level and format.
    pub logging: LoggingSection,
}

/// Wrapper template directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesSection {
    /// Directory holding `npapi-wrapper.*` templates. Relative paths are
    /// resolved against the wpkg home directory (`$WPKG_HOME` or `~/.wpkg`).
    pub dir: String,
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            dir: "etc".to_owned(),
        }
    }
}

/// Inline script directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsSection {
    /// Directory of `*.js` files injected into every package, relative to the
    /// wpkg home like `templates.dir`. Empty disables injection.
    pub dir: String,
}

/// Package library location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySection {
    /// Library root. Empty means `~/.wpkg/library`.
    pub dir: String,
    /// Sub-directory receiving synthesized web wrappers.
    pub web_subdir: String,
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            dir: String::new(),
            web_subdir: "Web".to_owned(),
        }
    }
}

/// Locale selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleSection {
    /// Language tag such as `en-GB`. Empty means "read `LC_ALL`/`LANG`".
    pub language: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Extra per-crate directives, e.g. `wpkg_package=debug`.
    pub directives: Vec<String>,
    /// Destination (`stderr`, `stdout`, `file`).
    pub target: String,
    /// Log file directory when `target = "file"`. Empty means the `logs`
    /// directory of the wpkg home; relative paths resolve against the home.
    pub dir: String,
    /// File rotation (`daily`, `hourly`, `never`).
    pub rotation: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            target: "stderr".to_owned(),
            dir: String::new(),
            rotation: "daily".to_owned(),
        }
    }
}

impl Config {
    /// Resolve the template directory. Relative paths are joined onto `base`.
    #[must_use]
    pub fn templates_dir(&self, base: &Path) -> PathBuf {
        resolve_against(&self.templates.dir, base)
    }

    /// Resolve the inline script directory, if one is configured.
    #[must_use]
    pub fn scripts_dir(&self, base: &Path) -> Option<PathBuf> {
        if self.scripts.dir.is_empty() {
            None
        } else {
            Some(resolve_against(&self.scripts.dir, base))
        }
    }

    /// Resolve the log file directory. `logs_dir` is used when `logging.dir`
    /// is empty, `base` anchors relative paths.
    #[must_use]
    pub fn log_dir(&self, base: &Path, logs_dir: &Path) -> PathBuf {
        if self.logging.dir.is_empty() {
            logs_dir.to_path_buf()
        } else {
            resolve_against(&self.logging.dir, base)
        }
    }

    /// Directory receiving synthesized web wrappers.
    ///
    /// `default_root` is used when `library.dir` is empty.
    #[must_use]
    pub fn web_library_dir(&self, default_root: &Path) -> PathBuf {
        let root = if self.library.dir.is_empty() {
            default_root.to_path_buf()
        } else {
            PathBuf::from(&self.library.dir)
        };
        root.join(&self.library.web_subdir)
    }
}

fn resolve_against(raw: &str, base: &Path) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_sections_use_defaults() {
        let config: Config = toml::from_str("[templates]\n[library]\n").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.library.web_subdir, "Web");
    }

    #[test]
    fn test_templates_dir_relative_and_absolute() {
        let mut config = Config::default();
        assert_eq!(
            config.templates_dir(Path::new("/home/me/.wpkg")),
            PathBuf::from("/home/me/.wpkg/etc")
        );

        config.templates.dir = "/usr/share/wpkg".to_owned();
        assert_eq!(
            config.templates_dir(Path::new("/home/me/.wpkg")),
            PathBuf::from("/usr/share/wpkg")
        );
    }

    #[test]
    fn test_scripts_dir_disabled_when_empty() {
        let config = Config::default();
        assert!(config.scripts_dir(Path::new("/x")).is_none());
    }

    #[test]
    fn test_web_library_dir() {
        let mut config = Config::default();
        assert_eq!(
            config.web_library_dir(Path::new("/home/me/.wpkg/library")),
            PathBuf::from("/home/me/.wpkg/library/Web")
        );

        config.library.dir = "/srv/widgets".to_owned();
        config.library.web_subdir = "Wrapped".to_owned();
        assert_eq!(
            config.web_library_dir(Path::new("/ignored")),
            PathBuf::from("/srv/widgets/Wrapped")
        );
    }

    #[test]
    fn test_log_dir() {
        let mut config = Config::default();
        let home = Path::new("/home/me/.wpkg");
        let logs = Path::new("/home/me/.wpkg/logs");
        assert_eq!(config.log_dir(home, logs), logs);

        config.logging.dir = "trace".to_owned();
        assert_eq!(config.log_dir(home, logs), home.join("trace"));

        config.logging.dir = "/var/log/wpkg".to_owned();
        assert_eq!(config.log_dir(home, logs), PathBuf::from("/var/log/wpkg"));
    }
}
