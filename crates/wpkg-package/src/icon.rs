//! Package icon lookup.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Icon file names tried in order. The last one is the Apple convention.
pub const ICON_CANDIDATES: [&str; 5] = ["icon.svg", "icon.ico", "icon.png", "icon.gif", "Icon.png"];

/// Where a package's icon comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconSource {
    /// An icon file inside the package.
    File(PathBuf),
    /// The host's built-in default widget icon.
    Default,
}

/// First existing icon in `base`, else [`IconSource::Default`].
#[must_use]
pub fn resolve_icon(base: &Path) -> IconSource {
    ICON_CANDIDATES
        .iter()
        .map(|name| base.join(name))
        .find(|path| path.is_file())
        .map_or(IconSource::Default, IconSource::File)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_when_no_icon() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_icon(dir.path()), IconSource::Default);
    }

    #[test]
    fn test_candidate_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Icon.png"), b"apple").unwrap();
        assert_eq!(
            resolve_icon(dir.path()),
            IconSource::File(dir.path().join("Icon.png"))
        );

        std::fs::write(dir.path().join("icon.png"), b"png").unwrap();
        assert_eq!(
            resolve_icon(dir.path()),
            IconSource::File(dir.path().join("icon.png"))
        );

        std::fs::write(dir.path().join("icon.svg"), b"<svg/>").unwrap();
        assert_eq!(
            resolve_icon(dir.path()),
            IconSource::File(dir.path().join("icon.svg"))
        );
    }
}
