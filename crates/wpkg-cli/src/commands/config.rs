//! CLI handlers for the `wpkg config` subcommand.

use anyhow::Result;
use wpkg_config::{ResolvedConfig, ShowFormat, WpkgHome};

use crate::theme::Theme;

/// Show the resolved configuration with source annotations.
pub(crate) fn show_config(
    resolved: &ResolvedConfig,
    format: &str,
    section: Option<&str>,
) -> Result<()> {
    let show_format = match format {
        "json" => ShowFormat::Json,
        _ => ShowFormat::Toml,
    };

    let output = resolved
        .show(show_format, section)
        .map_err(|e| anyhow::anyhow!("failed to format config: {e}"))?;

    println!("{output}");
    Ok(())
}

/// Show all config file paths that are checked.
pub(crate) fn show_paths(home: &WpkgHome) {
    let home_root = home.root().to_string_lossy().to_string();
    let workspace = std::env::current_dir()
        .ok()
        .map(|p| p.to_string_lossy().to_string());

    let paths = ResolvedConfig::config_paths(Some(&home_root), workspace.as_deref());

    println!("{}", Theme::header("Configuration files (lowest precedence first)"));
    for (i, path) in paths.iter().enumerate() {
        let status = if std::path::Path::new(path).exists() {
            "found".to_owned()
        } else {
            Theme::dimmed("not found")
        };
        println!("  {}. {path}  [{status}]", i.saturating_add(1));
    }

    println!();
    println!("{}", Theme::header("Environment variable fallbacks"));
    for (var, field) in wpkg_config::env::env_mappings() {
        println!("  {var:<20} -> {field}");
    }
}
