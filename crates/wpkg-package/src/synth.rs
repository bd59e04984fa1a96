//! Wrapper package synthesis.
//!
//! Produces new W3C packages that wrap an external resource (through a
//! registered HTML template) or a piece of raw markup, so the result can be
//! opened like any other package.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, info, warn};

use crate::entry::local_path;
use crate::error::{PackageError, PackageResult};
use crate::manifest::{ManifestKind, Size};
use crate::template::TemplateRegistry;

/// Entry file written into every template-based wrapper.
pub const START_FILE: &str = "index.htm";

const W3C_NAMESPACE: &str = "http://www.w3.org/ns/widgets";
const VENDOR_NAMESPACE: &str = "http://uniboard.mnemis.com/widgets";
const VENDOR_ID_BASE: &str = "http://uniboard.mnemis.com/";

/// What to wrap and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapRequest {
    resource_url: String,
    mime_type: Option<String>,
    size: Size,
    name: Option<String>,
}

impl WrapRequest {
    /// Wrap `resource_url` (a local path, `file://` URL or remote URL) at
    /// `size`.
    #[must_use]
    pub fn new(resource_url: impl Into<String>, size: Size) -> Self {
        Self {
            resource_url: resource_url.into(),
            mime_type: None,
            size,
            name: None,
        }
    }

    /// Use this MIME type instead of deriving one from the extension.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        self.mime_type = (!mime_type.is_empty()).then_some(mime_type);
        self
    }

    /// Use this display name instead of the resource's base name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    /// Resource being wrapped.
    #[must_use]
    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    /// Requested size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }
}

/// Builds wrapper packages from a lazily loaded template registry.
#[derive(Debug)]
pub struct WrapperSynthesizer {
    templates_dir: PathBuf,
    library_dir: Option<PathBuf>,
    registry: OnceLock<TemplateRegistry>,
}

impl WrapperSynthesizer {
    /// Create a synthesizer reading templates from `templates_dir`.
    ///
    /// The directory is not scanned until a template is first needed.
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            library_dir: None,
            registry: OnceLock::new(),
        }
    }

    /// Default destination for [`Self::synthesize_in_library`].
    #[must_use]
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }

    /// Template directory.
    #[must_use]
    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// The template registry, loaded on first access.
    pub fn registry(&self) -> &TemplateRegistry {
        self.registry
            .get_or_init(|| TemplateRegistry::load(&self.templates_dir))
    }

    /// Whether a template is registered under exactly `mime_type`.
    pub fn has_wrapper(&self, mime_type: &str) -> bool {
        self.registry().contains(mime_type)
    }

    /// Wrap a resource into `target_dir/<name>.wgt`.
    ///
    /// Any existing package directory at that path is deleted first. A local
    /// resource is copied into the package; a remote one is referenced by
    /// URL.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::MissingTemplate`] when no template matches,
    /// or [`PackageError::Io`] when the package cannot be written. In the
    /// latter case a previous package at the same path is already gone.
    pub fn synthesize(&self, request: &WrapRequest, target_dir: &Path) -> PackageResult<PathBuf> {
        let registry = self.registry();

        let local = local_path(&request.resource_url).filter(|p| p.is_file());
        let stripped = local_path(&request.resource_url)
            .map_or_else(|| request.resource_url.clone(), |p| p.display().to_string());
        let file_name = file_name_of(&stripped);
        let url = if local.is_some() {
            file_name.clone()
        } else {
            stripped.clone()
        };

        let name = request
            .name
            .clone()
            .unwrap_or_else(|| file_name.split('.').next().unwrap_or_default().to_owned());
        let extension = extension_of(&file_name);
        let mime_type = request
            .mime_type
            .clone()
            .or_else(|| registry.mime_for_extension(&extension).map(str::to_owned))
            .unwrap_or_default();

        let template = registry
            .get(&mime_type)
            .filter(|_| !mime_type.is_empty())
            .or_else(|| registry.get(&extension))
            .ok_or_else(|| {
                warn!(
                    resource = %request.resource_url,
                    mime_type = %mime_type,
                    extension = %extension,
                    "no wrapper template"
                );
                PackageError::MissingTemplate {
                    mime_type: mime_type.clone(),
                    extension: extension.clone(),
                }
            })?;

        let width = request.size.width.to_string();
        let height = request.size.height.to_string();
        let html = template
            .replace("{in.url}", &url)
            .replace("{in.width}", &width)
            .replace("{in.height}", &height);
        let config = registry
            .config_template()
            .replace("{in.id}", &escape_xml(&url))
            .replace("{in.width}", &width)
            .replace("{in.height}", &height)
            .replace("{in.name}", &escape_xml(&name))
            .replace("{in.startFile}", START_FILE);

        create_dir(target_dir)?;
        let package_dir = target_dir.join(package_dir_name(&name));
        if package_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&package_dir) {
                warn!(path = %package_dir.display(), error = %e, "cannot delete previous package");
            }
        }
        create_dir(&package_dir)?;

        if let Some(source) = &local {
            let target = package_dir.join(&file_name);
            std::fs::copy(source, &target).map_err(|e| {
                warn!(source = %source.display(), target = %target.display(), error = %e, "cannot copy resource");
                PackageError::io(&target, e)
            })?;
        }

        write_file(&package_dir.join(ManifestKind::W3c.manifest_file_name()), &config)?;
        write_file(&package_dir.join(START_FILE), &html)?;

        info!(
            path = %package_dir.display(),
            mime_type = %mime_type,
            size = %request.size,
            "synthesized wrapper package"
        );
        Ok(package_dir)
    }

    /// Wrap a resource into the configured library directory.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::NoLibraryDir`] when no library directory was
    /// configured, otherwise the errors of [`Self::synthesize`].
    pub fn synthesize_in_library(&self, request: &WrapRequest) -> PackageResult<PathBuf> {
        let dir = self.library_dir.as_deref().ok_or(PackageError::NoLibraryDir)?;
        self.synthesize(request, dir)
    }
}

/// Wrap raw markup into a new package under `target_dir`.
///
/// The package is named `<name>.wgt`, or `<name>N.wgt` with the smallest
/// `N >= 1` that does not exist yet. The markup lands in `<name>.html`.
///
/// # Errors
///
/// Returns [`PackageError::Io`] when a file cannot be written.
pub fn synthesize_from_markup(
    markup: &str,
    target_dir: &Path,
    size: Size,
    name: &str,
) -> PackageResult<PathBuf> {
    let package_dir = next_available(target_dir, name);
    create_dir(&package_dir)?;

    let escaped = escape_xml(name);
    let html_file = format!("{name}.html");
    let mut config = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        config,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <widget xmlns=\"{W3C_NAMESPACE}\"\n\
         \x20   xmlns:ub=\"{VENDOR_NAMESPACE}\"\n\
         \x20   id=\"{VENDOR_ID_BASE}{escaped}\"\n\
         \x20   version=\"1.0\"\n\
         \x20   width=\"{width}\"\n\
         \x20   height=\"{height}\"\n\
         \x20   ub:resizable=\"true\">\n\
         \x20 <name>{escaped}</name>\n\
         \x20 <content src=\"{src}\"/>\n\
         </widget>\n",
        width = size.width,
        height = size.height,
        src = escape_xml(&html_file),
    );
    write_file(&package_dir.join(ManifestKind::W3c.manifest_file_name()), &config)?;

    let html = format!(
        "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">\n\
         <html>\n\
         <head>\n\
         \x20   <meta http-equiv=\"content-type\" content=\"text/html; charset=utf-8\">\n\
         </head>\n\
         \x20 <body>\n\
         {markup}\n\
         \x20 </body>\n\
         </html>\n"
    );
    write_file(&package_dir.join(&html_file), &html)?;

    info!(path = %package_dir.display(), size = %size, "synthesized markup package");
    Ok(package_dir)
}

fn package_dir_name(name: &str) -> String {
    format!("{name}.{}", ManifestKind::W3c.package_extension())
}

fn next_available(target_dir: &Path, name: &str) -> PathBuf {
    let first = target_dir.join(package_dir_name(name));
    if !first.exists() {
        return first;
    }
    (1_u32..)
        .map(|i| target_dir.join(package_dir_name(&format!("{name}{i}"))))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

fn file_name_of(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_owned()
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn create_dir(dir: &Path) -> PackageResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        warn!(path = %dir.display(), error = %e, "cannot create directory");
        PackageError::io(dir, e)
    })
}

fn write_file(path: &Path, contents: &str) -> PackageResult<()> {
    debug!(path = %path.display(), bytes = contents.len(), "writing package file");
    std::fs::write(path, contents).map_err(|e| {
        warn!(path = %path.display(), error = %e, "cannot write file");
        PackageError::io(path, e)
    })
}
