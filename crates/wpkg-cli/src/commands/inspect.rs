//! `wpkg describe` and `wpkg inspect`.

use anyhow::Result;
use serde::Serialize;
use wpkg_package::icon::IconSource;
use wpkg_package::manifest::ManifestPreference;
use wpkg_package::{
    Capabilities, ManifestKind, NullRenderer, PackageContext, Size, WidgetMetadata,
    WidgetPackage, describe,
};

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct Label<'a> {
    url: &'a str,
    label: String,
}

/// Print the `"name version"` label of a package.
pub(crate) fn describe_package(url: &str, format: OutputFormat) -> Result<()> {
    let label = describe(url);
    match format {
        OutputFormat::Json => print_json(&Label { url, label }),
        OutputFormat::Pretty => {
            if label.is_empty() {
                println!("{}", Theme::warning("package has no name"));
            } else {
                println!("{label}");
            }
            Ok(())
        },
    }
}

/// Everything `inspect` reports.
#[derive(Serialize)]
struct Report<'a> {
    path: String,
    kind: ManifestKind,
    metadata: &'a WidgetMetadata,
    nominal_size: Size,
    resizable: bool,
    freezable: bool,
    roles: &'a str,
    capabilities: Capabilities,
    can_be_content: bool,
    can_be_tool: bool,
    entry: String,
    entry_is_local: bool,
    icon: IconSource,
    preferences: &'a [ManifestPreference],
}

/// Open a package and print its normalized manifest.
pub(crate) fn inspect_package(url: &str, ctx: &PackageContext, format: OutputFormat) -> Result<()> {
    let package = WidgetPackage::open(url, ctx, Box::new(NullRenderer))?;
    let manifest = package.manifest();
    let report = Report {
        path: package.base_path().display().to_string(),
        kind: package.kind(),
        metadata: package.metadata(),
        nominal_size: package.nominal_size(),
        resizable: package.is_resizable(),
        freezable: package.is_freezable(),
        roles: &manifest.roles,
        capabilities: manifest.capabilities,
        can_be_content: package.can_be_content(),
        can_be_tool: package.can_be_tool(),
        entry: package.entry().to_url_string(),
        entry_is_local: package.entry().is_local(),
        icon: package.icon(),
        preferences: &manifest.preferences,
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Pretty => {
            print_report(&report);
            Ok(())
        },
    }
}

fn print_report(report: &Report<'_>) {
    let meta = report.metadata;
    let title = if meta.name.is_empty() {
        report.path.as_str()
    } else {
        meta.name.as_str()
    };
    println!("{}", Theme::header(title));
    println!("{}", Theme::separator());
    println!("{}", Theme::kv("path", &report.path));
    println!("{}", Theme::kv("kind", &report.kind.to_string()));
    if !meta.id.is_empty() {
        println!("{}", Theme::kv("id", &meta.id));
    }
    if !meta.version.is_empty() {
        println!("{}", Theme::kv("version", &meta.version));
    }
    if !meta.description.is_empty() {
        println!("{}", Theme::kv("description", &meta.description));
    }
    if !meta.author.is_empty() {
        let mut author = meta.author.clone();
        if !meta.author_email.is_empty() {
            author.push_str(&format!(" <{}>", meta.author_email));
        }
        println!("{}", Theme::kv("author", &author));
    }
    println!("{}", Theme::kv("size", &report.nominal_size.to_string()));
    println!("{}", Theme::kv("resizable", &Theme::flag(report.resizable)));
    println!("{}", Theme::kv("freezable", &Theme::flag(report.freezable)));
    if !report.roles.is_empty() {
        println!("{}", Theme::kv("roles", report.roles));
    }
    println!(
        "{}",
        Theme::kv(
            "content",
            &format!(
                "{} ({})",
                report.capabilities.content,
                Theme::flag(report.can_be_content)
            )
        )
    );
    println!(
        "{}",
        Theme::kv(
            "tool",
            &format!(
                "{} ({})",
                report.capabilities.tool,
                Theme::flag(report.can_be_tool)
            )
        )
    );
    let entry = if report.entry_is_local {
        report.entry.clone()
    } else {
        format!("{} {}", report.entry, Theme::dimmed("(not in package)"))
    };
    println!("{}", Theme::kv("entry", &entry));
    let icon = match &report.icon {
        IconSource::File(path) => path.display().to_string(),
        IconSource::Default => Theme::dimmed("default"),
    };
    println!("{}", Theme::kv("icon", &icon));

    if !report.preferences.is_empty() {
        println!();
        println!("{}", Theme::header("Preferences"));
        for pref in report.preferences {
            let readonly = if pref.readonly {
                Theme::dimmed(" (readonly)")
            } else {
                String::new()
            };
            println!("  {} = {}{readonly}", pref.name, pref.value);
        }
    }
}
