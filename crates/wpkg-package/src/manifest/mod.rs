//! Manifest dialects and the normalized metadata model.
//!
//! Two dialects are supported: W3C widgets (`config.xml`) and Apple
//! dashboard widgets (`Info.plist`). Both normalize into a
//! [`ParsedManifest`]. A malformed or incomplete manifest is never an
//! error: every field falls back to its documented default.

mod apple;
mod w3c;

use std::fmt;
use std::path::Path;

use serde::Serialize;

pub use apple::AppleDialect;
pub use w3c::W3cDialect;

use crate::capability::Capabilities;
use crate::entry::{EntryUrl, local_path};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Size used when a manifest declares no usable geometry.
    pub const DEFAULT: Self = Self::new(300, 150);

    /// Create a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Identity metadata shared by both dialects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetMetadata {
    /// Package identifier (usually a URI).
    pub id: String,
    /// Version string.
    pub version: String,
    /// Display name, localized when the manifest offers translations.
    pub name: String,
    /// Description, localized when the manifest offers translations.
    pub description: String,
    /// Author name.
    pub author: String,
    /// Author home page.
    pub author_href: String,
    /// Author e-mail address.
    pub author_email: String,
}

/// A `<preference>` declared in a W3C manifest.
///
/// These are exposed for inspection only; they never seed the package's
/// preference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestPreference {
    /// Preference key.
    pub name: String,
    /// Initial value.
    pub value: String,
    /// Whether scripts may change it.
    pub readonly: bool,
}

/// Everything read from a package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedManifest {
    /// Dialect the manifest was read with.
    pub kind: ManifestKind,
    /// Identity metadata.
    pub metadata: WidgetMetadata,
    /// Size the package asks to be displayed at.
    pub nominal_size: Size,
    /// Whether the host may resize the package.
    pub resizable: bool,
    /// Whether the package may be frozen to a bitmap.
    pub freezable: bool,
    /// Normalized (trimmed, lower-cased) roles string.
    pub roles: String,
    /// Content and tool masks derived from `roles`.
    pub capabilities: Capabilities,
    /// Entry file named by the manifest, possibly empty.
    pub entry_file: String,
    /// Declared preferences (not applied).
    pub preferences: Vec<ManifestPreference>,
}

impl ParsedManifest {
    /// Manifest with every field at its default for `kind`.
    #[must_use]
    pub fn defaults(kind: ManifestKind) -> Self {
        Self {
            kind,
            metadata: WidgetMetadata::default(),
            nominal_size: Size::DEFAULT,
            resizable: false,
            freezable: true,
            roles: String::new(),
            capabilities: Capabilities::default(),
            entry_file: String::new(),
            preferences: Vec::new(),
        }
    }
}

/// Dialect-specific parsing rules.
pub trait Dialect {
    /// The manifest kind this dialect handles.
    const KIND: ManifestKind;

    /// Whether `base` holds this dialect's manifest file.
    fn detect(base: &Path) -> bool {
        base.join(Self::KIND.manifest_file_name()).is_file()
    }

    /// Read and normalize the manifest in `base`.
    fn parse_metadata(base: &Path, language: &str) -> ParsedManifest;

    /// Resolve the entry URL for a parsed manifest.
    fn resolve_entry(base: &Path, manifest: &ParsedManifest) -> EntryUrl;

    /// Short `"name version"` label, empty when the manifest has no name.
    fn describe(base: &Path) -> String;
}

/// Closed set of supported manifest dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// W3C widget packaging (`config.xml`, `.wgt`).
    W3c,
    /// Apple dashboard widget (`Info.plist`, `.wdgt`).
    Apple,
}

impl ManifestKind {
    /// Manifest file name inside the package directory.
    #[must_use]
    pub fn manifest_file_name(self) -> &'static str {
        match self {
            Self::W3c => "config.xml",
            Self::Apple => "Info.plist",
        }
    }

    /// Package directory extension.
    #[must_use]
    pub fn package_extension(self) -> &'static str {
        match self {
            Self::W3c => "wgt",
            Self::Apple => "wdgt",
        }
    }

    /// MIME type of packages of this kind.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::W3c => "application/widget",
            Self::Apple => "application/vnd.apple-widget",
        }
    }

    /// Kind implied by a package path's extension, if any.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "wgt" => Some(Self::W3c),
            "wdgt" => Some(Self::Apple),
            _ => None,
        }
    }

    /// Kind implied by a package URL's extension, if any.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let trimmed = url.trim_end_matches('/');
        Self::from_path(Path::new(trimmed))
    }

    /// Detect the dialect of the package in `base`: `config.xml` first,
    /// then `Info.plist`.
    #[must_use]
    pub fn detect(base: &Path) -> Option<Self> {
        if W3cDialect::detect(base) {
            Some(Self::W3c)
        } else if AppleDialect::detect(base) {
            Some(Self::Apple)
        } else {
            None
        }
    }

    /// Parse the manifest in `base` with this dialect.
    #[must_use]
    pub fn parse(self, base: &Path, language: &str) -> ParsedManifest {
        match self {
            Self::W3c => W3cDialect::parse_metadata(base, language),
            Self::Apple => AppleDialect::parse_metadata(base, language),
        }
    }

    /// Resolve the entry URL of a manifest parsed with this dialect.
    #[must_use]
    pub fn resolve_entry(self, base: &Path, manifest: &ParsedManifest) -> EntryUrl {
        match self {
            Self::W3c => W3cDialect::resolve_entry(base, manifest),
            Self::Apple => AppleDialect::resolve_entry(base, manifest),
        }
    }

    fn describe(self, base: &Path) -> String {
        match self {
            Self::W3c => W3cDialect::describe(base),
            Self::Apple => AppleDialect::describe(base),
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::W3c => f.write_str("w3c"),
            Self::Apple => f.write_str("apple"),
        }
    }
}

/// `"name version"` for the package at `url`.
///
/// The version is omitted when empty; the result is empty when the manifest
/// has no name or the package cannot be read.
#[must_use]
pub fn describe(url: &str) -> String {
    let Some(base) = local_path(url) else {
        return String::new();
    };
    ManifestKind::detect(&base)
        .map(|kind| kind.describe(&base))
        .unwrap_or_default()
}

pub(crate) fn join_label(name: &str, version: &str) -> String {
    if name.is_empty() {
        String::new()
    } else if version.is_empty() {
        name.to_owned()
    } else {
        format!("{name} {version}")
    }
}

/// Read a manifest file, logging instead of failing when it is unreadable.
pub(crate) fn read_manifest(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "manifest unreadable, using defaults");
            None
        },
    }
}
