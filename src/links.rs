//! Link extraction from a live page.
//!
//! Sessions can ask their tab for every anchor on the current page. The
//! extraction runs a script in the page that collects each anchor's
//! selector, target and visibility; the raw rows then go through a
//! cleanup pass that normalizes whitespace, drops anchors carrying no
//! usable signal and removes duplicates while preserving first-seen
//! order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Script evaluated in the page to collect anchors.
///
/// Kept as a single expression so the driver can wrap it for transport.
/// Selector strategy, most to least specific: own id, then tag plus
/// classes, prefixed with the parent id when one exists.
pub(crate) const LINKS_SCRIPT: &str = r#"(() => {
  const cssPath = (el) => {
    if (el.id) return '#' + el.id;
    let path = el.tagName.toLowerCase();
    if (el.classList.length > 0) {
      path += '.' + Array.from(el.classList).join('.');
    }
    const parent = el.parentElement;
    if (parent && parent.id) return '#' + parent.id + ' > ' + path;
    return path;
  };
  const isVisible = (el) => {
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
      && style.visibility !== 'hidden' && style.display !== 'none';
  };
  return Array.from(document.querySelectorAll('a')).map((el) => ({
    classes: Array.from(el.classList),
    href: el.href || null,
    id: el.id || null,
    selector: cssPath(el),
    text: (el.textContent || ''),
    visible: isVisible(el)
  }));
})()"#;

/// One anchor found on the page.
///
/// `selector` is a best-effort CSS path suitable for a follow-up click
/// command; `href` is the resolved absolute target when the anchor has
/// one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLink {
    /// CSS classes on the anchor, sorted and de-duplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Resolved target of the anchor, if it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// The anchor's element id, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// CSS path usable to click this anchor.
    pub selector: String,
    /// Anchor text with whitespace collapsed.
    #[serde(default)]
    pub text: String,
    /// Whether the anchor was rendered and visible at extraction time.
    #[serde(default)]
    pub visible: bool,
}

/// Parse the script output into raw link rows.
///
/// A null result means the script evaluated to nothing, which happens on
/// pages without a document. That is no links, not an error.
pub(crate) fn parse_links(value: serde_json::Value) -> Result<Vec<PageLink>, serde_json::Error> {
    if value.is_null() {
        return Ok(Vec::new());
    }

    serde_json::from_value(value)
}

/// Normalize, filter and de-duplicate raw link rows.
///
/// - Text whitespace is collapsed to single spaces and trimmed
/// - Classes are sorted and de-duplicated, empty ones dropped
/// - Empty `href`/`id` strings become absent
/// - Anchors with neither text nor target are dropped
/// - Duplicates are removed, keeping the first occurrence
pub(crate) fn clean_links(raw: Vec<PageLink>) -> Vec<PageLink> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::with_capacity(raw.len());

    for mut link in raw {
        link.text = link.text.split_whitespace().collect::<Vec<_>>().join(" ");

        link.classes.retain(|class| !class.is_empty());
        link.classes.sort_unstable();
        link.classes.dedup();

        link.href = link.href.filter(|href| !href.is_empty());
        link.id = link.id.filter(|id| !id.is_empty());

        if link.selector.is_empty() || (link.text.is_empty() && link.href.is_none()) {
            continue;
        }

        if seen.insert(dedupe_key(&link)) {
            links.push(link);
        }
    }

    links
}

/// Stable identity of a link, built from its url-encoded fields.
///
/// Encoding each field keeps the joining `&` unambiguous no matter what
/// characters the page put into them.
fn dedupe_key(link: &PageLink) -> String {
    [
        urlencoding::encode(&link.classes.join(" ")).into_owned(),
        urlencoding::encode(link.href.as_deref().unwrap_or("")).into_owned(),
        urlencoding::encode(link.id.as_deref().unwrap_or("")).into_owned(),
        urlencoding::encode(&link.selector).into_owned(),
        urlencoding::encode(&link.text).into_owned(),
        String::from(if link.visible { "1" } else { "0" }),
    ]
    .join("&")
}

// ============================================================================
// Unit Tests
// ============================================================================
