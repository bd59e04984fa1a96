//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];
const LOG_TARGETS: &[&str] = &["stderr", "stdout", "file"];
const LOG_ROTATIONS: &[&str] = &["daily", "hourly", "never"];

/// Validate a merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_templates(config)?;
    validate_library(config)?;
    validate_locale(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_templates(config: &Config) -> ConfigResult<()> {
    if config.templates.dir.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "templates.dir".to_owned(),
            message: "template directory must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_library(config: &Config) -> ConfigResult<()> {
    let subdir = &config.library.web_subdir;
    if subdir.is_empty() || subdir.contains("..") || subdir.starts_with('/') {
        return Err(ConfigError::ValidationError {
            field: "library.web_subdir".to_owned(),
            message: format!("'{subdir}' must be a non-empty relative directory name"),
        });
    }
    Ok(())
}

/// Accepts an empty string (use the process locale) or `ll`, `ll-CC`, `ll_CC`.
fn validate_locale(config: &Config) -> ConfigResult<()> {
    let lang = &config.locale.language;
    if lang.is_empty() {
        return Ok(());
    }

    let mut parts = lang.split(['-', '_']);
    let primary_ok = parts
        .next()
        .is_some_and(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_alphabetic()));
    let region_ok = parts
        .next()
        .is_none_or(|r| !r.is_empty() && r.chars().all(|c| c.is_ascii_alphanumeric()));
    if !primary_ok || !region_ok || parts.next().is_some() {
        return Err(ConfigError::ValidationError {
            field: "locale.language".to_owned(),
            message: format!("'{lang}' is not a language tag like 'en' or 'en-GB'"),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;
    one_of("logging.level", &logging.level, LOG_LEVELS)?;
    one_of("logging.format", &logging.format, LOG_FORMATS)?;
    one_of("logging.target", &logging.target, LOG_TARGETS)?;
    one_of("logging.rotation", &logging.rotation, LOG_ROTATIONS)
}

/// Case-insensitive membership check for enumerated string fields.
fn one_of(field: &str, value: &str, allowed: &[&str]) -> ConfigResult<()> {
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_owned(),
        message: format!("unknown value '{value}'; expected one of: {}", allowed.join(", ")),
    })
}
