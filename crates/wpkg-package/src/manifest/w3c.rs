use std::path::Path;

use tracing::debug;

use super::{
    Dialect, ManifestKind, ManifestPreference, ParsedManifest, Size, join_label, read_manifest,
};
use crate::capability::{Capabilities, DEFAULT_ROLES};
use crate::entry::{EntryUrl, probe_index};
use crate::locale::localized_text;
use crate::tree::{TreeNode, parse_xml};

/// W3C widget packaging, `config.xml` rooted at `<widget>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct W3cDialect;

impl Dialect for W3cDialect {
    const KIND: ManifestKind = ManifestKind::W3c;

    fn parse_metadata(base: &Path, language: &str) -> ParsedManifest {
        let path = base.join(Self::KIND.manifest_file_name());
        let Some(text) = read_manifest(&path) else {
            return parse_widget::<roxmltree::Node<'_, '_>>(None, language);
        };
        match parse_xml(&text) {
            Ok(doc) => {
                let widget = doc.root().descendants_by_tag("widget").into_iter().next();
                parse_widget(widget, language)
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "malformed config.xml, using defaults");
                parse_widget::<roxmltree::Node<'_, '_>>(None, language)
            },
        }
    }

    fn resolve_entry(base: &Path, manifest: &ParsedManifest) -> EntryUrl {
        let entry_file = if manifest.entry_file.is_empty() {
            probe_index(base)
        } else {
            manifest.entry_file.clone()
        };
        EntryUrl::resolve(base, &entry_file)
    }

    fn describe(base: &Path) -> String {
        let Some(text) = read_manifest(&base.join(Self::KIND.manifest_file_name())) else {
            return String::new();
        };
        let Ok(doc) = parse_xml(&text) else {
            return String::new();
        };
        let root = doc.root_element();
        if TreeNode::tag(&root) != "widget" {
            return String::new();
        }
        let name = TreeNode::first_child(&root, "name")
            .map(|n| TreeNode::text(&n))
            .unwrap_or_default();
        join_label(&name, &root.attribute_or("version", ""))
    }
}

/// Normalize a `<widget>` element. `None` yields the documented defaults.
pub(crate) fn parse_widget<N: TreeNode>(widget: Option<N>, language: &str) -> ParsedManifest {
    let mut manifest = ParsedManifest::defaults(ManifestKind::W3c);

    let Some(widget) = widget else {
        debug!("config.xml has no <widget> element, using defaults");
        manifest.roles = DEFAULT_ROLES.to_owned();
        manifest.capabilities = Capabilities::from_roles(DEFAULT_ROLES);
        return manifest;
    };

    manifest.nominal_size = Size::new(
        dimension(&widget, "width", Size::DEFAULT.width),
        dimension(&widget, "height", Size::DEFAULT.height),
    );

    let meta = &mut manifest.metadata;
    meta.id = widget
        .attribute("id")
        .filter(|id| !id.is_empty())
        .or_else(|| widget.attribute("identifier"))
        .unwrap_or_default()
        .to_owned();
    meta.version = widget.attribute_or("version", "");
    meta.name = localized_text(&widget.descendants_by_tag("name"), language);
    meta.description = localized_text(&widget.descendants_by_tag("description"), language);

    if let Some(author) = widget.descendants_by_tag("author").first() {
        meta.author = author.text();
        meta.author_href = author.attribute_or("href", "");
        meta.author_email = author.attribute_or("email", "");
    }

    manifest.resizable = widget.attribute_or("ub:resizable", "false") == "true";
    manifest.freezable = widget.attribute_or("ub:freezable", "true") == "true";
    manifest.roles = widget
        .attribute_or("ub:roles", DEFAULT_ROLES)
        .trim()
        .to_lowercase();
    manifest.capabilities = Capabilities::from_roles(&manifest.roles);

    if let Some(content) = widget.descendants_by_tag("content").first() {
        manifest.entry_file = content.attribute_or("src", "");
    }

    manifest.preferences = widget
        .descendants_by_tag("preference")
        .iter()
        .filter_map(|pref| {
            let name = pref.attribute_or("name", "");
            (!name.is_empty()).then(|| ManifestPreference {
                name,
                value: pref.attribute_or("value", ""),
                readonly: pref.attribute_or("readonly", "false") == "true",
            })
        })
        .collect();

    manifest
}

fn dimension<N: TreeNode>(widget: &N, attr: &str, default: u32) -> u32 {
    match widget.attribute(attr) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            debug!(attribute = attr, value = raw, "unparsable dimension, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityMask;

    fn write_config(body: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.xml"), body).unwrap();
        dir
    }

    const FULL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<widget xmlns="http://www.w3.org/ns/widgets"
        xmlns:ub="http://uniboard.mnemis.com/widgets"
        id="http://example.org/clock" version="2.1"
        width="320" height="240"
        ub:resizable="true" ub:freezable="false" ub:roles=" Tool CMAC ">
    <name xml:lang="en">Clock</name>
    <name xml:lang="fr">Horloge</name>
    <description>Shows the time</description>
    <author href="http://example.org" email="jane@example.org">Jane Doe</author>
    <content src="clock.html"/>
    <preference name="tz" value="UTC" readonly="true"/>
    <preference value="ignored"/>
</widget>"#;

    #[test]
    fn test_full_manifest() {
        let dir = write_config(FULL);
        let m = W3cDialect::parse_metadata(dir.path(), "fr-FR");

        assert_eq!(m.nominal_size, Size::new(320, 240));
        assert_eq!(m.metadata.id, "http://example.org/clock");
        assert_eq!(m.metadata.version, "2.1");
        assert_eq!(m.metadata.name, "Horloge");
        assert_eq!(m.metadata.description, "Shows the time");
        assert_eq!(m.metadata.author, "Jane Doe");
        assert_eq!(m.metadata.author_href, "http://example.org");
        assert_eq!(m.metadata.author_email, "jane@example.org");
        assert!(m.resizable);
        assert!(!m.freezable);
        assert_eq!(m.roles, "tool cmac");
        assert_eq!(m.capabilities.tool, CapabilityMask::ALL);
        assert_eq!(m.capabilities.content, CapabilityMask::MAC);
        assert_eq!(m.entry_file, "clock.html");
        assert_eq!(
            m.preferences,
            vec![ManifestPreference {
                name: "tz".to_owned(),
                value: "UTC".to_owned(),
                readonly: true,
            }]
        );
    }

    #[test]
    fn test_identifier_fallback_and_defaults() {
        let dir = write_config(r#"<widget identifier="legacy-id"><name>Old</name></widget>"#);
        let m = W3cDialect::parse_metadata(dir.path(), "en");

        assert_eq!(m.metadata.id, "legacy-id");
        assert_eq!(m.nominal_size, Size::DEFAULT);
        assert!(!m.resizable);
        assert!(m.freezable);
        assert_eq!(m.roles, "content tool");
        assert_eq!(m.capabilities.content, CapabilityMask::ALL);
    }

    #[test]
    fn test_missing_widget_element_degrades_to_defaults() {
        let dir = write_config("<gadget width=\"10\"/>");
        let m = W3cDialect::parse_metadata(dir.path(), "en");

        assert_eq!(m.nominal_size, Size::new(300, 150));
        assert_eq!(m.capabilities.content, CapabilityMask::ALL);
        assert_eq!(m.capabilities.tool, CapabilityMask::ALL);
        assert_eq!(m.metadata, crate::manifest::WidgetMetadata::default());
    }

    #[test]
    fn test_malformed_xml_degrades_to_defaults() {
        let dir = write_config("<widget width=");
        let m = W3cDialect::parse_metadata(dir.path(), "en");
        assert_eq!(m.nominal_size, Size::DEFAULT);
        assert_eq!(m.capabilities.tool, CapabilityMask::ALL);
    }

    #[test]
    fn test_unparsable_dimension_uses_default() {
        let dir = write_config(r#"<widget width="wide" height="90"/>"#);
        let m = W3cDialect::parse_metadata(dir.path(), "en");
        assert_eq!(m.nominal_size, Size::new(300, 90));
    }

    #[test]
    fn test_entry_probes_index_files() {
        let dir = write_config("<widget/>");
        std::fs::write(dir.path().join("index.html"), "").unwrap();
        let m = W3cDialect::parse_metadata(dir.path(), "en");

        assert_eq!(
            W3cDialect::resolve_entry(dir.path(), &m),
            EntryUrl::File(dir.path().join("index.html"))
        );
    }

    #[test]
    fn test_entry_remote_content_is_bare() {
        let dir = write_config(r#"<widget><content src="http://example.org/app/"/></widget>"#);
        let m = W3cDialect::parse_metadata(dir.path(), "en");

        assert_eq!(
            W3cDialect::resolve_entry(dir.path(), &m),
            EntryUrl::Bare("http://example.org/app/".to_owned())
        );
    }

    #[test]
    fn test_describe_uses_first_name_and_version() {
        let dir = write_config(FULL);
        assert_eq!(W3cDialect::describe(dir.path()), "Clock 2.1");

        let dir = write_config(r#"<widget version="1.0"/>"#);
        assert_eq!(W3cDialect::describe(dir.path()), "");
    }
}
