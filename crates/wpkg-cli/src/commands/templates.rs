//! `wpkg templates`.

use anyhow::Result;
use serde::Serialize;
use wpkg_package::PackageContext;

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct Listing<'a> {
    dir: String,
    templates: Vec<Entry<'a>>,
    config_template: bool,
    frozen_page: bool,
}

#[derive(Serialize)]
struct Entry<'a> {
    extension: &'a str,
    mime_type: &'a str,
}

/// List the wrapper templates registered from the template directory.
pub(crate) fn list_templates(ctx: &PackageContext, format: OutputFormat) -> Result<()> {
    let registry = ctx.synthesizer().registry();
    let listing = Listing {
        dir: registry.dir().display().to_string(),
        templates: registry
            .entries()
            .into_iter()
            .map(|(extension, mime_type)| Entry {
                extension,
                mime_type,
            })
            .collect(),
        config_template: !registry.config_template().is_empty(),
        frozen_page: !ctx.frozen_page().is_empty(),
    };

    if format == OutputFormat::Json {
        return print_json(&listing);
    }

    println!("{}", Theme::header("Wrapper templates"));
    println!("{}", Theme::dimmed(&listing.dir));
    println!("{}", Theme::separator());
    if listing.templates.is_empty() {
        println!("{}", Theme::warning("no templates registered"));
    }
    for entry in &listing.templates {
        println!("  .{:<10} {}", entry.extension, entry.mime_type);
    }
    if !listing.config_template {
        println!("{}", Theme::warning("config template missing, wrappers cannot be created"));
    }
    if !listing.frozen_page {
        println!("{}", Theme::dimmed("no frozen wrapper page"));
    }
    Ok(())
}
