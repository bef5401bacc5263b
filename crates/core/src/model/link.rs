//! Downloadable link candidates.

use serde::{Deserialize, Serialize};

/// Quality label used by placeholder links that only point at a search page.
pub const SEARCH_ONLY_QUALITY: &str = "search-only";

/// Size label used when a source does not report one.
pub const UNKNOWN_SIZE: &str = "N/A";

/// Number of address characters that take part in a link signature.
const SIGNATURE_ADDRESS_CHARS: usize = 50;

/// A single way of obtaining a title's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// Free-form quality label ("1080p", "720p", "search-only", ...).
    pub quality: String,
    /// Free-form size label ("1.9 GB", "N/A", ...).
    pub size: String,
    /// Seed count, 0 when the source has no seed data.
    #[serde(default)]
    pub seeds: u32,
    /// Magnet URI, HTTP URL or bot deep link.
    pub address: String,
    /// Name of the provider that produced the link.
    pub source: String,
    /// Content can be fetched without an external client.
    #[serde(default)]
    pub is_direct: bool,
    /// Placeholder pointing at an external search page.
    #[serde(default)]
    pub is_search_link: bool,
    /// Fulfilled by an external chat bot.
    #[serde(default)]
    pub is_bot_link: bool,
}

/// Deduplication key of a link within one title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkSignature {
    quality: String,
    size: String,
    address_prefix: String,
}

impl Link {
    /// Create a torrent-style link with no flags set.
    pub fn new(
        quality: impl Into<String>,
        size: impl Into<String>,
        seeds: u32,
        address: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            quality: quality.into(),
            size: size.into(),
            seeds,
            address: address.into(),
            source: source.into(),
            is_direct: false,
            is_search_link: false,
            is_bot_link: false,
        }
    }

    /// Create a placeholder link pointing at an external search page.
    pub fn search_placeholder(address: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            is_search_link: true,
            ..Self::new(SEARCH_ONLY_QUALITY, UNKNOWN_SIZE, 0, address, source)
        }
    }

    /// Mark the link as directly fetchable.
    pub fn direct(mut self) -> Self {
        self.is_direct = true;
        self
    }

    /// Mark the link as fulfilled by a chat bot.
    pub fn bot(mut self) -> Self {
        self.is_bot_link = true;
        self
    }

    /// Whether this link is a real result rather than a search placeholder.
    pub fn is_usable(&self) -> bool {
        !self.is_search_link
    }

    /// Signature used to deduplicate links inside a title.
    pub fn signature(&self) -> LinkSignature {
        LinkSignature {
            quality: self.quality.clone(),
            size: self.size.clone(),
            address_prefix: self.address.chars().take(SIGNATURE_ADDRESS_CHARS).collect(),
        }
    }
}

/// Whether a link list contains at least one real result.
pub fn has_usable_links(links: &[Link]) -> bool {
    links.iter().any(Link::is_usable)
}

/// Build a magnet URI from an info hash and display name.
pub fn magnet_uri(info_hash: &str, display_name: &str) -> String {
    format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        info_hash.to_lowercase(),
        urlencoding::encode(display_name)
    )
}

/// Render a byte count the way scrapers usually show it.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return UNKNOWN_SIZE.to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_uses_address_prefix() {
        let prefix = "magnet:?xt=urn:btih:0123456789abcdef0123456789abcd";
        let a = Link::new("1080p", "2 GB", 10, format!("{}&tr=one", prefix), "a");
        let b = Link::new("1080p", "2 GB", 99, format!("{}&tr=two", prefix), "b");
        assert_eq!(prefix.chars().count(), 50);
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_signature_differs_on_quality() {
        let a = Link::new("1080p", "2 GB", 10, "magnet:?xt=urn:btih:abc", "a");
        let b = Link::new("720p", "2 GB", 10, "magnet:?xt=urn:btih:abc", "a");
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn test_search_placeholder_is_not_usable() {
        let link = Link::search_placeholder("https://example.org/search?q=x", "search_links");
        assert!(!link.is_usable());
        assert_eq!(link.quality, SEARCH_ONLY_QUALITY);
        assert_eq!(link.size, UNKNOWN_SIZE);
        assert!(!has_usable_links(&[link]));
    }

    #[test]
    fn test_magnet_uri() {
        let uri = magnet_uri("ABCDEF", "Some Movie");
        assert_eq!(uri, "magnet:?xt=urn:btih:abcdef&dn=Some%20Movie");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "N/A");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.00 GB");
    }
}
