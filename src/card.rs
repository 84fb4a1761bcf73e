//! Card requests and their content fingerprints.
//!
//! A [`CardRequest`] is everything that ends up as text on a card. Its
//! [`Fingerprint`] is the MD5 of the UTF-8 concatenation of the three fields,
//! with no separator, which is also the cache file name. Two pages with the
//! same site name, title, and description therefore share one cached image.
//!
//! Collisions are not handled: the key space is a single site's page titles,
//! nobody is choosing inputs adversarially, and a collision would at worst
//! show the wrong card.

use md5::{Digest, Md5};
use std::fmt;

/// Text content of one social card. Immutable once submitted for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub site_name: String,
    pub title: String,
    pub description: String,
}

impl CardRequest {
    pub fn new(
        site_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Content fingerprint used as the cache key.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Md5::new();
        hasher.update(self.site_name.as_bytes());
        hasher.update(self.title.as_bytes());
        hasher.update(self.description.as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }
}

/// Lowercase hex MD5 digest of a [`CardRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_md5_of_concatenation() {
        let request = CardRequest::new("Docs", "Getting Started", "A short guide");
        let expected = format!("{:x}", Md5::digest(b"DocsGetting StartedA short guide"));
        assert_eq!(request.fingerprint().as_str(), expected);
    }

    #[test]
    fn fingerprint_known_value() {
        // md5("") is a fixed, well-known digest.
        let request = CardRequest::new("", "", "");
        assert_eq!(
            request.fingerprint().to_string(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn fingerprint_deterministic() {
        let a = CardRequest::new("Docs", "Install", "How to install");
        let b = a.clone();
        assert_eq!(a.fingerprint(), a.fingerprint());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().as_str().len(), 32);
    }

    #[test]
    fn fingerprint_varies_with_each_field() {
        let base = CardRequest::new("Docs", "Install", "How to install");
        let other_site = CardRequest::new("Guide", "Install", "How to install");
        let other_title = CardRequest::new("Docs", "Setup", "How to install");
        let other_desc = CardRequest::new("Docs", "Install", "How to set up");
        assert_ne!(base.fingerprint(), other_site.fingerprint());
        assert_ne!(base.fingerprint(), other_title.fingerprint());
        assert_ne!(base.fingerprint(), other_desc.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_field_boundaries() {
        // Concatenation without separator: only the joined bytes matter.
        let a = CardRequest::new("Doc", "sInstall", "");
        let b = CardRequest::new("Docs", "Install", "");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
