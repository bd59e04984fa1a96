//! Config file discovery and layered loading.
//!
//! 1. Parse `defaults.toml`
//! 2. Merge `/etc/wpkg/config.toml` (system)
//! 3. Merge `~/.wpkg/config.toml` (user)
//! 4. Merge `{workspace}/.wpkg/config.toml` (workspace)
//! 5. Apply `WPKG_*` fallbacks for fields still at their default
//! 6. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dirs::WpkgHome;
use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

const SYSTEM_CONFIG_PATH: &str = "/etc/wpkg/config.toml";

/// Load the configuration with layered file precedence.
///
/// `home_override` is treated as the wpkg home itself (the directory that
/// holds `config.toml`), bypassing `$WPKG_HOME` and `~/.wpkg`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let home = match home_override {
        Some(h) => WpkgHome::from_path(h),
        None => WpkgHome::resolve().map_err(|_| ConfigError::NoHomeDir)?,
    };
    load_layers(
        Some(Path::new(SYSTEM_CONFIG_PATH)),
        &home,
        workspace_root,
        &collect_env_vars(),
    )
}

fn load_layers(
    system_path: Option<&Path>,
    home: &WpkgHome,
    workspace_root: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    let workspace_path = workspace_root.map(|root| root.join(".wpkg").join("config.toml"));
    let layers: [(Option<PathBuf>, ConfigLayer); 3] = [
        (system_path.map(Path::to_path_buf), ConfigLayer::System),
        (Some(home.config_path()), ConfigLayer::User),
        (workspace_path, ConfigLayer::Workspace),
    ];

    for (path, layer) in layers {
        let Some(path) = path else {
            continue;
        };
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge_tracking(&mut merged, &overlay, "", &layer, &mut field_sources);
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), layer = %layer, "loaded config");
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, oversized, malformed
/// or invalid.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Read and parse a TOML file, returning `None` if it doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}
