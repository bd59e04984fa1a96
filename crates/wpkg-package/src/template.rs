//! Wrapper template registry.
//!
//! Templates live in a single directory. HTML templates are named
//! `npapi-wrapper.<mime1>.<mime2>.<ext>.<htm|html>` and are registered under
//! both the MIME type `<mime1>/<mime2>` and the extension `<ext>`. The shared
//! config template is `npapi-wrapper.config.xml`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// File name prefix shared by every wrapper template.
pub const TEMPLATE_PREFIX: &str = "npapi-wrapper";

/// Shared config template file name.
pub const CONFIG_TEMPLATE_FILE: &str = "npapi-wrapper.config.xml";

/// Page shown in place of a frozen package's live content.
pub const FROZEN_PAGE_FILE: &str = "freezedWidgetWrapper.html";

/// Read-only set of wrapper templates loaded from one directory.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    dir: PathBuf,
    templates: HashMap<String, String>,
    mime_by_extension: HashMap<String, String>,
    config_template: String,
}

impl TemplateRegistry {
    /// Scan `dir` for wrapper templates.
    ///
    /// Unreadable or empty files are logged and skipped. Files are visited in
    /// name order, so on a key collision the last name wins.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let mut registry = Self {
            dir: dir.to_path_buf(),
            ..Self::default()
        };

        let mut names: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|name| is_template_name(name))
                .collect(),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "cannot read template directory");
                Vec::new()
            },
        };
        names.sort();

        for name in names {
            let tokens: Vec<&str> = name.split('.').collect();
            let [.., mime_major, mime_minor, extension, _html] = tokens.as_slice() else {
                debug!(file = %name, "template name has too few parts, skipping");
                continue;
            };
            let path = dir.join(&name);
            let Some(text) = read_non_empty(&path) else {
                continue;
            };
            let mime_type = format!("{mime_major}/{mime_minor}");
            debug!(file = %name, mime_type = %mime_type, extension = %extension, "registered wrapper template");
            registry
                .mime_by_extension
                .insert((*extension).to_owned(), mime_type.clone());
            registry.templates.insert(mime_type, text.clone());
            registry.templates.insert((*extension).to_owned(), text);
        }

        registry.config_template =
            read_non_empty(&dir.join(CONFIG_TEMPLATE_FILE)).unwrap_or_default();

        info!(
            path = %dir.display(),
            keys = registry.templates.len(),
            "loaded wrapper templates"
        );
        registry
    }

    /// Directory the registry was loaded from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template registered under a MIME type or extension.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Whether a template is registered under exactly `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// MIME type declared by the template registered for `extension`.
    #[must_use]
    pub fn mime_for_extension(&self, extension: &str) -> Option<&str> {
        self.mime_by_extension.get(extension).map(String::as_str)
    }

    /// Shared config template text, empty when the file is missing.
    #[must_use]
    pub fn config_template(&self) -> &str {
        &self.config_template
    }

    /// Extension to MIME type pairs, sorted by extension.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<&str, &str> {
        self.mime_by_extension
            .iter()
            .map(|(ext, mime)| (ext.as_str(), mime.as_str()))
            .collect()
    }

    /// Whether no HTML template was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn is_template_name(name: &str) -> bool {
    name.starts_with(TEMPLATE_PREFIX)
        && (name.ends_with(".htm") || name.ends_with(".html"))
}

fn read_non_empty(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => {
            debug!(path = %path.display(), "template file is empty, skipping");
            None
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read template file");
            None
        },
    }
}

/// Read the frozen-package page from the template directory.
///
/// Returns an empty string when the file is missing or empty.
#[must_use]
pub fn load_frozen_page(dir: &Path) -> String {
    let path = dir.join(FROZEN_PAGE_FILE);
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            if text.is_empty() {
                debug!(path = %path.display(), "frozen page is empty");
            }
            text
        },
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot open frozen page");
            String::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_templates(dir: &Path) {
        std::fs::write(
            dir.join("npapi-wrapper.application.x-shockwave-flash.swf.htm"),
            "<embed src=\"{in.url}\" width=\"{in.width}\" height=\"{in.height}\"/>",
        )
        .unwrap();
        std::fs::write(
            dir.join("npapi-wrapper.application.pdf.pdf.html"),
            "<object data=\"{in.url}\"></object>",
        )
        .unwrap();
        std::fs::write(
            dir.join(CONFIG_TEMPLATE_FILE),
            "<widget id=\"{in.id}\" width=\"{in.width}\" height=\"{in.height}\"><name>{in.name}</name><content src=\"{in.startFile}\"/></widget>",
        )
        .unwrap();
    }

    #[test]
    fn test_registers_mime_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path());
        let registry = TemplateRegistry::load(dir.path());

        assert!(registry.contains("application/x-shockwave-flash"));
        assert!(registry.contains("swf"));
        assert_eq!(
            registry.get("swf"),
            registry.get("application/x-shockwave-flash")
        );
        assert!(registry.contains("application/pdf"));
        assert_eq!(registry.mime_for_extension("pdf"), Some("application/pdf"));
        assert!(registry.config_template().contains("{in.startFile}"));
    }

    #[test]
    fn test_skips_unqualified_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("npapi-wrapper.swf.htm"), "short").unwrap();
        std::fs::write(dir.path().join("npapi-wrapper.video.mp4.mp4.htm"), "").unwrap();
        std::fs::write(dir.path().join("other.application.pdf.pdf.htm"), "x").unwrap();
        std::fs::write(dir.path().join("npapi-wrapper.application.pdf.pdf.txt"), "x").unwrap();

        let registry = TemplateRegistry::load(dir.path());
        assert!(registry.is_empty());
        assert_eq!(registry.config_template(), "");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let registry = TemplateRegistry::load(Path::new("/nonexistent/templates"));
        assert!(registry.is_empty());
        assert!(!registry.contains("swf"));
    }

    #[test]
    fn test_entries_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path());
        let registry = TemplateRegistry::load(dir.path());
        let entries: Vec<(&str, &str)> = registry.entries().into_iter().collect();
        assert_eq!(
            entries,
            vec![
                ("pdf", "application/pdf"),
                ("swf", "application/x-shockwave-flash")
            ]
        );
    }

    #[test]
    fn test_frozen_page() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_frozen_page(dir.path()), "");

        std::fs::write(dir.path().join(FROZEN_PAGE_FILE), "<html>frozen</html>").unwrap();
        assert_eq!(load_frozen_page(dir.path()), "<html>frozen</html>");
    }
}
