//! Shared state for every package opened by one host.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::capability::Platform;
use crate::locale::system_language;
use crate::store::ModifiedSink;
use crate::synth::WrapperSynthesizer;
use crate::template::load_frozen_page;

/// Extension of inline script files.
const SCRIPT_EXTENSION: &str = "js";

/// Host-wide caches and settings shared by packages.
///
/// Every cache is filled at most once, on first use.
pub struct PackageContext {
    language_override: Option<String>,
    language: OnceLock<String>,
    platform: Platform,
    synthesizer: WrapperSynthesizer,
    scripts_dir: Option<PathBuf>,
    inline_scripts: OnceLock<Vec<String>>,
    frozen_page: OnceLock<String>,
    modified_sink: Option<Arc<dyn ModifiedSink>>,
}

impl fmt::Debug for PackageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageContext")
            .field("language_override", &self.language_override)
            .field("platform", &self.platform)
            .field("synthesizer", &self.synthesizer)
            .field("scripts_dir", &self.scripts_dir)
            .field("has_modified_sink", &self.modified_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl PackageContext {
    /// Context reading wrapper templates from `templates_dir`.
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            language_override: None,
            language: OnceLock::new(),
            platform: Platform::current(),
            synthesizer: WrapperSynthesizer::new(templates_dir),
            scripts_dir: None,
            inline_scripts: OnceLock::new(),
            frozen_page: OnceLock::new(),
            modified_sink: None,
        }
    }

    /// Use `language` instead of the process locale. Empty means "detect".
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.language_override = (!language.is_empty()).then_some(language);
        self
    }

    /// Resolve capabilities against `platform` instead of the running one.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Directory holding `*.js` files injected into every package page.
    #[must_use]
    pub fn with_scripts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scripts_dir = Some(dir.into());
        self
    }

    /// Default destination for wrapper packages.
    #[must_use]
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.synthesizer = self.synthesizer.with_library_dir(dir);
        self
    }

    /// Sink attached to the stores of every package opened afterwards.
    #[must_use]
    pub fn with_modified_sink(mut self, sink: Arc<dyn ModifiedSink>) -> Self {
        self.modified_sink = Some(sink);
        self
    }

    /// Language used for localized manifest text.
    pub fn language(&self) -> &str {
        self.language.get_or_init(|| {
            let language = self
                .language_override
                .clone()
                .unwrap_or_else(system_language);
            debug!(language = %language, "resolved package language");
            language
        })
    }

    /// Platform capabilities are resolved against.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Wrapper synthesizer sharing this context's template registry.
    #[must_use]
    pub fn synthesizer(&self) -> &WrapperSynthesizer {
        &self.synthesizer
    }

    /// Inline scripts, read once in file name order.
    pub fn inline_scripts(&self) -> &[String] {
        self.inline_scripts.get_or_init(|| {
            self.scripts_dir
                .as_deref()
                .map(read_scripts)
                .unwrap_or_default()
        })
    }

    /// Default page shown by frozen wrappers, read once.
    pub fn frozen_page(&self) -> &str {
        self.frozen_page
            .get_or_init(|| load_frozen_page(self.synthesizer.templates_dir()))
    }

    pub(crate) fn modified_sink(&self) -> Option<Arc<dyn ModifiedSink>> {
        self.modified_sink.clone()
    }
}

fn read_scripts(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot read inline script directory");
            return Vec::new();
        },
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| match std::fs::read_to_string(&path) {
            Ok(script) => Some(script),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable inline script");
                None
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FROZEN_PAGE_FILE;

    #[test]
    fn test_language_override() {
        let ctx = PackageContext::new("/nonexistent").with_language("fr-CA");
        assert_eq!(ctx.language(), "fr-CA");
    }

    #[test]
    fn test_inline_scripts_sorted_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.js"), "var b;").unwrap();
        std::fs::write(dir.path().join("a.js"), "var a;").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ctx = PackageContext::new("/nonexistent").with_scripts_dir(dir.path());
        assert_eq!(ctx.inline_scripts(), ["var a;", "var b;"]);

        std::fs::write(dir.path().join("c.js"), "var c;").unwrap();
        assert_eq!(ctx.inline_scripts().len(), 2);
    }

    #[test]
    fn test_no_scripts_dir() {
        let ctx = PackageContext::new("/nonexistent");
        assert!(ctx.inline_scripts().is_empty());
    }

    #[test]
    fn test_frozen_page_read_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FROZEN_PAGE_FILE), "<p>frozen</p>").unwrap();

        let ctx = PackageContext::new(dir.path());
        assert_eq!(ctx.frozen_page(), "<p>frozen</p>");

        std::fs::remove_file(dir.path().join(FROZEN_PAGE_FILE)).unwrap();
        assert_eq!(ctx.frozen_page(), "<p>frozen</p>");
    }
}
