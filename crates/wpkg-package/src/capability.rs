//! Platform-scoped "content" and "tool" capability masks.

use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Set of platforms a package role is enabled on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CapabilityMask: u8 {
        /// Windows.
        const WIN = 0b001;
        /// macOS.
        const MAC = 0b010;
        /// Linux and other Unix systems.
        const UNIX = 0b100;
        /// Every platform.
        const ALL = Self::WIN.bits() | Self::MAC.bits() | Self::UNIX.bits();
    }
}

impl fmt::Display for CapabilityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("all");
        }
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|").to_lowercase())
    }
}

impl Serialize for CapabilityMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Operating system family the process runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows.
    Win,
    /// macOS.
    Mac,
    /// Everything else.
    Unix,
}

impl Platform {
    /// Platform of the running process.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Win
        } else if cfg!(target_os = "macos") {
            Self::Mac
        } else {
            Self::Unix
        }
    }

    /// The single mask bit representing this platform.
    #[must_use]
    pub fn bit(self) -> CapabilityMask {
        match self {
            Self::Win => CapabilityMask::WIN,
            Self::Mac => CapabilityMask::MAC,
            Self::Unix => CapabilityMask::UNIX,
        }
    }
}

/// Default roles string when a manifest does not declare any.
pub const DEFAULT_ROLES: &str = "content tool";

/// Content and tool masks resolved from a roles string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    /// Platforms on which the package may be placed as content.
    pub content: CapabilityMask,
    /// Platforms on which the package may be used as a tool.
    pub tool: CapabilityMask,
}

impl Capabilities {
    /// Resolve both masks from a roles string.
    ///
    /// The string is trimmed and lower-cased first. Keywords are matched by
    /// plain substring containment, so `"toolbox"` also enables the tool role.
    #[must_use]
    pub fn from_roles(roles: &str) -> Self {
        let roles = roles.trim().to_lowercase();
        Self {
            tool: resolve_axis(&roles, "tool", ["twin", "tmac", "tunix"]),
            content: resolve_axis(&roles, "content", ["cwin", "cmac", "cunix"]),
        }
    }

    /// Whether the package may be placed as content on `platform`.
    #[must_use]
    pub fn can_be_content(&self, platform: Platform) -> bool {
        self.content.intersects(platform.bit())
    }

    /// Whether the package may be used as a tool on `platform`.
    #[must_use]
    pub fn can_be_tool(&self, platform: Platform) -> bool {
        self.tool.intersects(platform.bit())
    }
}

fn resolve_axis(roles: &str, keyword: &str, tokens: [&str; 3]) -> CapabilityMask {
    let mut mask = if roles.is_empty() || roles.contains(keyword) {
        CapabilityMask::ALL
    } else {
        CapabilityMask::empty()
    };
    let bits = [CapabilityMask::WIN, CapabilityMask::MAC, CapabilityMask::UNIX];
    for (token, bit) in tokens.iter().zip(bits) {
        if roles.contains(token) {
            mask |= bit;
        }
    }
    mask
}
