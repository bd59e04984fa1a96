use std::path::Path;

use tracing::debug;

use super::{Dialect, ManifestKind, ParsedManifest, Size, join_label, read_manifest};
use crate::entry::EntryUrl;
use crate::tree::{TreeNode, parse_xml};

const DISPLAY_NAME_KEY: &str = "CFBundleDisplayName";
const SHORT_VERSION_KEY: &str = "CFBundleShortVersionString";
const IDENTIFIER_KEY: &str = "CFBundleIdentifier";
const MAIN_HTML_KEY: &str = "MainHTML";

/// Image whose dimensions give an Apple widget its nominal size.
pub const DEFAULT_IMAGE: &str = "Default.png";

/// Apple dashboard widget, `Info.plist` rooted at `<plist><dict>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppleDialect;

/// Values picked out of the top-level plist dictionary.
#[derive(Debug, Default, PartialEq, Eq)]
struct BundleKeys {
    display_name: String,
    short_version: String,
    identifier: String,
}

impl Dialect for AppleDialect {
    const KIND: ManifestKind = ManifestKind::Apple;

    fn parse_metadata(base: &Path, _language: &str) -> ParsedManifest {
        let mut manifest = ParsedManifest::defaults(ManifestKind::Apple);
        manifest.nominal_size = default_image_size(base);

        let Some(text) = read_manifest(&base.join(Self::KIND.manifest_file_name())) else {
            return manifest;
        };

        let keys = bundle_keys(&text);
        manifest.metadata.name = keys.display_name;
        manifest.metadata.version = keys.short_version;
        manifest.metadata.id = keys.identifier;
        manifest.entry_file = main_html(&text).unwrap_or_default();
        manifest
    }

    fn resolve_entry(base: &Path, manifest: &ParsedManifest) -> EntryUrl {
        EntryUrl::resolve(base, &manifest.entry_file)
    }

    fn describe(base: &Path) -> String {
        read_manifest(&base.join(Self::KIND.manifest_file_name()))
            .map(|text| {
                let keys = bundle_keys(&text);
                join_label(&keys.display_name, &keys.short_version)
            })
            .unwrap_or_default()
    }
}

fn bundle_keys(text: &str) -> BundleKeys {
    match parse_xml(text) {
        Ok(doc) => {
            let root = doc.root_element();
            if TreeNode::tag(&root) != "plist" {
                return BundleKeys::default();
            }
            TreeNode::first_child(&root, "dict")
                .map(|dict| scan_dict(&dict))
                .unwrap_or_default()
        },
        Err(e) => {
            debug!(error = %e, "malformed Info.plist, using defaults");
            BundleKeys::default()
        },
    }
}

/// Scan a plist dictionary for recognized keys.
///
/// A value is taken only from the node immediately following the key, and
/// only when that node is an element. Anything else leaves the field empty.
fn scan_dict<N: TreeNode>(dict: &N) -> BundleKeys {
    let mut keys = BundleKeys::default();
    for pair in dict.child_nodes().windows(2) {
        let [key, value] = pair else {
            continue;
        };
        if !key.is_element() || !value.is_element() {
            continue;
        }
        let slot = match key.text().as_str() {
            DISPLAY_NAME_KEY => &mut keys.display_name,
            SHORT_VERSION_KEY => &mut keys.short_version,
            IDENTIFIER_KEY => &mut keys.identifier,
            _ => continue,
        };
        *slot = value.text();
    }
    keys
}

/// Entry file named by the `MainHTML` key.
///
/// Located by scanning the raw text for the key and then the next
/// `<string>` span, without parsing the plist.
fn main_html(plist: &str) -> Option<String> {
    let (_, after_key) = plist.split_once(MAIN_HTML_KEY)?;
    let (_, after_open) = after_key.split_once("<string>")?;
    let (value, _) = after_open.split_once("</string>")?;
    Some(value.to_owned())
}

fn default_image_size(base: &Path) -> Size {
    let path = base.join(DEFAULT_IMAGE);
    match image::image_dimensions(&path) {
        Ok((width, height)) => Size::new(width, height),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no usable Default.png, using default size");
            Size::DEFAULT
        },
    }
}
