//! Localized text selection among repeated manifest elements.

use crate::tree::TreeNode;

/// Pick the text of the element that best matches `language`.
///
/// Candidates are compared on their `xml:lang` attribute:
/// 1. an exact match (ASCII case-insensitive),
/// 2. a two-letter tag equal to the first two letters of `language`,
/// 3. the first candidate in document order,
/// 4. an empty string when there are no candidates.
pub fn localized_text<N: TreeNode>(candidates: &[N], language: &str) -> String {
    let tag_of = |node: &N| node.attribute("xml:lang").unwrap_or_default().to_owned();

    if let Some(exact) = candidates
        .iter()
        .find(|n| !language.is_empty() && tag_of(n).eq_ignore_ascii_case(language))
    {
        return exact.text();
    }

    if let Some(primary) = language.get(..2) {
        if let Some(prefix) = candidates.iter().find(|n| {
            let tag = tag_of(n);
            tag.len() == 2 && tag.eq_ignore_ascii_case(primary)
        }) {
            return prefix.text();
        }
    }

    candidates.first().map(TreeNode::text).unwrap_or_default()
}

/// Turn a POSIX locale string into a language tag.
///
/// `en_GB.UTF-8` becomes `en-GB`; `C`, `POSIX` and empty strings yield an
/// empty tag, which matches nothing.
#[must_use]
pub fn normalize_language(raw: &str) -> String {
    let base = raw
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return String::new();
    }
    base.replace('_', "-")
}

/// Language of the running process, read from `LC_ALL`, `LC_MESSAGES` and
/// `LANG` in that order.
#[must_use]
pub fn system_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|raw| normalize_language(&raw))
        .find(|lang| !lang.is_empty())
        .unwrap_or_default()
}
