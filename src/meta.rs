//! Open Graph and Twitter meta tags for a page's card.
//!
//! Tags serialize the way host templates consume them, as flat objects:
//!
//! ```json
//! { "property": "og:image", "content": "https://example.com/assets/images/social/setup.png" }
//! { "name": "twitter:card", "content": "summary_large_image" }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::imaging::compositor::{CARD_HEIGHT, CARD_WIDTH};

/// One `<meta>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaTag {
    Property { property: String, content: String },
    Name { name: String, content: String },
}

impl MetaTag {
    pub fn property(property: &str, content: impl Into<String>) -> Self {
        MetaTag::Property {
            property: property.to_string(),
            content: content.into(),
        }
    }

    pub fn name(name: &str, content: impl Into<String>) -> Self {
        MetaTag::Name {
            name: name.to_string(),
            content: content.into(),
        }
    }

    /// The `property` or `name` attribute.
    pub fn key(&self) -> &str {
        match self {
            MetaTag::Property { property, .. } => property,
            MetaTag::Name { name, .. } => name,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            MetaTag::Property { content, .. } | MetaTag::Name { content, .. } => content,
        }
    }

    /// The tag as a page metadata value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetaTag::Property { property, content } => {
                serde_json::json!({ "property": property, "content": content })
            }
            MetaTag::Name { name, content } => serde_json::json!({ "name": name, "content": content }),
        }
    }
}

/// Everything the tags of one page are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub site_name: &'a str,
    pub is_homepage: bool,
    /// Absolute (or `./`-relative) URL of the card image.
    pub image_url: &'a str,
    pub canonical_url: Option<&'a str>,
}

/// Page title as shown in link previews: `"<title> - <site>"`, except on the
/// homepage.
pub fn display_title(title: &str, site_name: &str, is_homepage: bool) -> String {
    if is_homepage {
        title.to_string()
    } else {
        format!("{title} - {site_name}")
    }
}

/// Generate the meta tags for one page, in a fixed order.
pub fn generate_meta(page: &PageMeta<'_>) -> Vec<MetaTag> {
    let title = display_title(page.title, page.site_name, page.is_homepage);
    vec![
        MetaTag::property("og:type", "website"),
        MetaTag::property("og:title", title.as_str()),
        MetaTag::property("og:description", page.description),
        MetaTag::property("og:image", page.image_url),
        MetaTag::property("og:image:type", "image/png"),
        MetaTag::property("og:image:width", CARD_WIDTH.to_string()),
        MetaTag::property("og:image:height", CARD_HEIGHT.to_string()),
        MetaTag::property("og:url", page.canonical_url.unwrap_or_default()),
        MetaTag::name("twitter:card", "summary_large_image"),
        MetaTag::name("twitter:title", title.as_str()),
        MetaTag::name("twitter:description", page.description),
        MetaTag::name("twitter:image", page.image_url),
    ]
}

/// Public URL of a page's card.
///
/// `<site_url or ".">/<cards_dir>/<src_uri without extension>.png`, always
/// with forward slashes.
pub fn card_url(site_url: Option<&str>, cards_dir: &str, src_uri: &str) -> String {
    let base = site_url.filter(|u| !u.is_empty()).unwrap_or(".");
    let normalized = src_uri.replace('\\', "/");
    let file = strip_extension(&normalized);
    let segments = [
        base.trim_end_matches('/'),
        cards_dir.trim_matches('/'),
        file.trim_start_matches('/'),
    ];
    let joined = segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    format!("{joined}.png")
}

/// Output path of a page's card: `<site_dir>/<cards_dir>/<src_path>.png`.
pub fn card_path(site_dir: &Path, cards_dir: &str, src_path: &str) -> PathBuf {
    let file = strip_extension(src_path);
    site_dir.join(cards_dir).join(format!("{file}.png"))
}

/// Drop the extension of the last path segment, if it has one.
fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..name_start + dot],
        _ => path,
    }
}
