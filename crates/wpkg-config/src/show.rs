//! Source-annotated display for `config show`.

use std::fmt::{self, Write as _};

use crate::merge::FieldSources;
use crate::types::Config;

/// A resolved configuration together with source annotations.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path to the layer that set it.
    pub field_sources: FieldSources,
    /// Config files that were loaded, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Output format for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML with inline comments naming the source layer.
    Toml,
    /// Plain JSON.
    Json,
}

impl ResolvedConfig {
    /// Render the configuration, optionally restricted to one section.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or `section` does not exist.
    pub fn show(&self, format: ShowFormat, section: Option<&str>) -> Result<String, fmt::Error> {
        match format {
            ShowFormat::Toml => self.show_toml(section),
            ShowFormat::Json => {
                let val = self.section_value(section)?;
                serde_json::to_string_pretty(&val).map_err(|_| fmt::Error)
            },
        }
    }

    fn section_value(&self, section: Option<&str>) -> Result<toml::Value, fmt::Error> {
        let val = toml::Value::try_from(&self.config).map_err(|_| fmt::Error)?;
        match section {
            Some(name) => val.get(name).cloned().ok_or(fmt::Error),
            None => Ok(val),
        }
    }

    fn show_toml(&self, section: Option<&str>) -> Result<String, fmt::Error> {
        let body = toml::to_string_pretty(&self.section_value(section)?).map_err(|_| fmt::Error)?;

        let mut output = String::new();
        output.push_str("# Resolved wpkg configuration\n");
        output.push_str("# Source annotations: [defaults] [system] [user] [workspace] [env]\n");

        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Loaded files (in precedence order):\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                writeln!(output, "#   {}. {path}", i.saturating_add(1))?;
            }
        }
        output.push('\n');

        let mut current = section.unwrap_or("").to_owned();
        for line in body.lines() {
            let trimmed = line.trim();
            if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
                current = match section {
                    Some(s) => format!("{s}.{header}"),
                    None => header.to_owned(),
                };
                writeln!(output, "{line}")?;
                continue;
            }
            match self.annotate(trimmed, &current) {
                Some(layer) => writeln!(output, "{line}  # [{layer}]")?,
                None => writeln!(output, "{line}")?,
            }
        }

        Ok(output)
    }

    fn annotate(&self, line: &str, prefix: &str) -> Option<String> {
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let key = line.split('=').next()?.trim();
        let path = if prefix.is_empty() {
            key.to_owned()
        } else {
            format!("{prefix}.{key}")
        };
        self.field_sources.get(&path).map(ToString::to_string)
    }

    /// Config file paths checked during loading, lowest precedence first.
    #[must_use]
    pub fn config_paths(home: Option<&str>, workspace_root: Option<&str>) -> Vec<String> {
        vec![
            "/etc/wpkg/config.toml".to_owned(),
            home.map_or_else(
                || "~/.wpkg/config.toml".to_owned(),
                |h| format!("{h}/config.toml"),
            ),
            workspace_root.map_or_else(
                || "{workspace}/.wpkg/config.toml".to_owned(),
                |ws| format!("{ws}/.wpkg/config.toml"),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ConfigLayer;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("templates.dir".to_owned(), ConfigLayer::User);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: vec!["/home/me/.wpkg/config.toml".to_owned()],
        }
    }

    #[test]
    fn test_show_toml_annotates() {
        let output = resolved().show(ShowFormat::Toml, None).unwrap();
        assert!(output.contains("Resolved wpkg configuration"));
        assert!(output.contains("1. /home/me/.wpkg/config.toml"));
        assert!(output.contains("dir = \"etc\"  # [user (~/.wpkg/config.toml)]"));
    }

    #[test]
    fn test_show_json_is_valid() {
        let output = resolved().show(ShowFormat::Json, None).unwrap();
        let val: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(val["library"]["web_subdir"], "Web");
    }

    #[test]
    fn test_show_section() {
        let output = resolved().show(ShowFormat::Toml, Some("logging")).unwrap();
        assert!(output.contains("compact"));
        assert!(!output.contains("web_subdir"));
    }

    #[test]
    fn test_show_unknown_section_fails() {
        assert!(resolved().show(ShowFormat::Json, Some("nope")).is_err());
    }

    #[test]
    fn test_config_paths() {
        let paths = ResolvedConfig::config_paths(Some("/home/me/.wpkg"), Some("/work"));
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[1], "/home/me/.wpkg/config.toml");
        assert_eq!(paths[2], "/work/.wpkg/config.toml");
    }
}
