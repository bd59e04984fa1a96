//! `wpkg wrap` and `wpkg wrap-html`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use wpkg_package::{PackageContext, Size, WrapRequest, synthesize_from_markup};

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct Created<'a> {
    path: &'a Path,
    size: Size,
}

/// Options shared by both wrap commands.
pub(crate) struct WrapOptions {
    /// Display name override.
    pub(crate) name: Option<String>,
    /// Requested size.
    pub(crate) size: Size,
    /// Output directory; the configured library when `None`.
    pub(crate) out: Option<PathBuf>,
}

/// Wrap an external resource into a package.
pub(crate) fn wrap_resource(
    ctx: &PackageContext,
    resource: &str,
    mime_type: Option<String>,
    options: WrapOptions,
    format: OutputFormat,
) -> Result<()> {
    let mut request = WrapRequest::new(resource, options.size);
    if let Some(mime) = mime_type {
        request = request.with_mime_type(mime);
    }
    if let Some(name) = options.name {
        request = request.with_name(name);
    }

    let synthesizer = ctx.synthesizer();
    let path = match options.out {
        Some(dir) => synthesizer.synthesize(&request, &dir)?,
        None => synthesizer.synthesize_in_library(&request)?,
    };
    report(&path, options.size, format)
}

/// Wrap the contents of an HTML fragment file into a package.
pub(crate) fn wrap_markup(
    file: &Path,
    default_out: &Path,
    options: WrapOptions,
    format: OutputFormat,
) -> Result<()> {
    let markup = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = options.name.unwrap_or_else(|| {
        file.file_stem()
            .map_or_else(|| "widget".to_owned(), |s| s.to_string_lossy().into_owned())
    });
    let out = options.out.unwrap_or_else(|| default_out.to_path_buf());
    let path = synthesize_from_markup(&markup, &out, options.size, &name)?;
    report(&path, options.size, format)
}

fn report(path: &Path, size: Size, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&Created { path, size }),
        OutputFormat::Pretty => {
            println!(
                "{}",
                Theme::success(&format!("created {} ({size})", path.display()))
            );
            Ok(())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_markup_defaults_name_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let fragment = dir.path().join("note.html");
        std::fs::write(&fragment, "<p>hi</p>").unwrap();
        let out = dir.path().join("out");

        let options = WrapOptions {
            name: None,
            size: Size::new(200, 100),
            out: None,
        };
        wrap_markup(&fragment, &out, options, OutputFormat::Json).unwrap();
        assert!(out.join("note.wgt").join("note.html").is_file());
        assert!(out.join("note.wgt").join("config.xml").is_file());
    }

    #[test]
    fn test_wrap_resource_missing_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PackageContext::new(dir.path().join("etc"));
        let options = WrapOptions {
            name: None,
            size: Size::DEFAULT,
            out: Some(dir.path().to_path_buf()),
        };
        let result = wrap_resource(&ctx, "movie.swf", None, options, OutputFormat::Json);
        assert!(result.is_err());
    }
}
