//! `wpkg list`.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use wpkg_package::{ManifestKind, discover_packages};

use crate::formatter::{OutputFormat, print_json};
use crate::theme::Theme;

#[derive(Serialize)]
struct Row {
    path: String,
    kind: ManifestKind,
    label: String,
    id: String,
}

/// List the packages found in `dirs`.
pub(crate) fn list_packages(dirs: &[PathBuf], language: &str, format: OutputFormat) -> Result<()> {
    let rows: Vec<Row> = discover_packages(dirs, language)
        .into_iter()
        .map(|pkg| Row {
            path: pkg.path.display().to_string(),
            kind: pkg.kind,
            label: pkg.label,
            id: pkg.manifest.metadata.id,
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        for dir in dirs {
            println!("{}", Theme::dimmed(&format!("no packages in {}", dir.display())));
        }
        return Ok(());
    }

    println!("{}", Theme::header(&format!("Packages ({})", rows.len())));
    println!("{}", Theme::separator());
    for row in &rows {
        let label = if row.label.is_empty() {
            Theme::dimmed("(unnamed)")
        } else {
            row.label.clone()
        };
        println!("  {label:<30} {:<6} {}", row.kind, Theme::dimmed(&row.path));
    }
    Ok(())
}
