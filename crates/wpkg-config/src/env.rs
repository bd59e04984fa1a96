//! Environment variable fallbacks.
//!
//! `WPKG_*` variables only fill fields that no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "WPKG_TEMPLATES_DIR",
        field_path: "templates.dir",
    },
    EnvMapping {
        var_name: "WPKG_SCRIPTS_DIR",
        field_path: "scripts.dir",
    },
    EnvMapping {
        var_name: "WPKG_LIBRARY_DIR",
        field_path: "library.dir",
    },
    EnvMapping {
        var_name: "WPKG_LANGUAGE",
        field_path: "locale.language",
    },
    EnvMapping {
        var_name: "WPKG_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "WPKG_LOG_FORMAT",
        field_path: "logging.format",
    },
    EnvMapping {
        var_name: "WPKG_LOG_DIR",
        field_path: "logging.dir",
    },
];

/// `(variable, field path)` pairs consulted as fallbacks.
pub fn env_mappings() -> impl Iterator<Item = (&'static str, &'static str)> {
    ENV_MAPPINGS.iter().map(|m| (m.var_name, m.field_path))
}

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply environment fallbacks to fields that were set by defaults only.
///
/// Returns the number of variables applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if set_string_field(merged, mapping.field_path, val) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set `section.key` to a string value, creating the section if needed.
fn set_string_field(root: &mut toml::Value, path: &str, val: &str) -> bool {
    let Some((section, key)) = path.split_once('.') else {
        return false;
    };
    let Some(table) = root.as_table_mut() else {
        return false;
    };
    let entry = table
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    match entry.as_table_mut() {
        Some(section_table) => {
            section_table.insert(key.to_owned(), toml::Value::String(val.to_owned()));
            true
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_mappings_listed() {
        let mappings: Vec<_> = env_mappings().collect();
        assert!(mappings.contains(&("WPKG_LANGUAGE", "locale.language")));
        assert_eq!(mappings.len(), ENV_MAPPINGS.len());
    }

    fn defaults() -> (toml::Value, FieldSources) {
        let val: toml::Value =
            toml::from_str("[locale]\nlanguage = \"\"\n[logging]\nlevel = \"info\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("locale.language".to_owned(), ConfigLayer::Defaults);
        sources.insert("logging.level".to_owned(), ConfigLayer::Defaults);
        (val, sources)
    }

    #[test]
    fn test_env_fills_default_field() {
        let (mut val, mut sources) = defaults();
        let env: HashMap<String, String> =
            [("WPKG_LANGUAGE".to_owned(), "de-DE".to_owned())].into();

        let applied = apply_env_fallbacks(&mut val, &mut sources, &env);

        assert_eq!(applied, 1);
        assert_eq!(val["locale"]["language"].as_str(), Some("de-DE"));
        assert_eq!(
            sources.get("locale.language"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_does_not_override_file() {
        let (mut val, mut sources) = defaults();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);
        let env: HashMap<String, String> =
            [("WPKG_LOG_LEVEL".to_owned(), "trace".to_owned())].into();

        let applied = apply_env_fallbacks(&mut val, &mut sources, &env);

        assert_eq!(applied, 0);
        assert_eq!(val["logging"]["level"].as_str(), Some("info"));
    }

    #[test]
    fn test_env_creates_missing_section() {
        let mut val = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env: HashMap<String, String> =
            [("WPKG_LIBRARY_DIR".to_owned(), "/srv/lib".to_owned())].into();

        apply_env_fallbacks(&mut val, &mut sources, &env);

        assert_eq!(val["library"]["dir"].as_str(), Some("/srv/lib"));
    }
}
