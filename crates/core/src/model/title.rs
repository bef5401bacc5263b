//! Canonical movie/show records and the raw shape providers emit.

use serde::{Deserialize, Serialize};

use super::link::{has_usable_links, Link};

/// Normalize a title for keying: trimmed, inner whitespace collapsed, lowercase.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Identity key of a title: `lowercase(title) + "|" + year`.
pub fn identity_key(title: &str, year: Option<u32>) -> String {
    match year {
        Some(year) => format!("{}|{}", normalize_title(title), year),
        None => format!("{}|", normalize_title(title)),
    }
}

/// Clamp a provider rating into the 0-10 range, dropping non-finite values.
pub fn clamp_rating(rating: Option<f32>) -> Option<f32> {
    rating
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 10.0))
}

/// A record as returned by one provider, before merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// Name of the provider that produced this record.
    pub source: String,
    /// Provider-private handle for a follow-up detail fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_ref: Option<String>,
}

impl RawRecord {
    /// Create a bare record with a title and source.
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_year(mut self, year: Option<u32>) -> Self {
        self.year = year;
        self
    }

    pub fn with_rating(mut self, rating: Option<f32>) -> Self {
        self.rating = clamp_rating(rating);
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    /// Identity key of the title this record describes.
    pub fn key(&self) -> String {
        identity_key(&self.title, self.year)
    }
}

/// A canonical title merged from one or more provider records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    /// Display title (from the first record seen).
    pub title: String,
    /// Original or master title, when a provider reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Rating on a 0-10 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    /// Deduplicated links, ranked once the title has been through the ranker.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Providers that contributed to this title, in order of contribution.
    #[serde(default)]
    pub providers: Vec<String>,
}

impl Title {
    /// Identity key, shared by every record merged into this title.
    pub fn key(&self) -> String {
        identity_key(&self.title, self.year)
    }

    /// Whether at least one link is a real result.
    pub fn has_usable_links(&self) -> bool {
        has_usable_links(&self.links)
    }

    /// Whether the cascade should be run for this title.
    pub fn needs_resolution(&self) -> bool {
        !self.has_usable_links()
    }

    /// Record that `provider` contributed to this title.
    pub fn add_provider(&mut self, provider: &str) {
        if !self.providers.iter().any(|p| p == provider) {
            self.providers.push(provider.to_string());
        }
    }

    /// Rating used for ordering; missing ratings count as zero.
    pub fn sort_rating(&self) -> f32 {
        self.rating.unwrap_or(0.0)
    }

    /// Lookup record used to probe providers for this title's links.
    pub fn as_record(&self) -> RawRecord {
        RawRecord {
            title: self.title.clone(),
            original_title: self.original_title.clone(),
            year: self.year,
            rating: self.rating,
            poster: self.poster.clone(),
            synopsis: self.synopsis.clone(),
            genres: self.genres.clone(),
            links: Vec::new(),
            source: String::new(),
            detail_ref: None,
        }
    }
}

impl From<RawRecord> for Title {
    fn from(r: RawRecord) -> Self {
        let mut title = Self {
            title: r.title.split_whitespace().collect::<Vec<_>>().join(" "),
            original_title: r.original_title,
            year: r.year,
            rating: clamp_rating(r.rating),
            poster: r.poster,
            synopsis: r.synopsis,
            genres: r.genres,
            // Links go through the merger so they are deduplicated.
            links: Vec::new(),
            providers: Vec::new(),
        };
        title.add_provider(&r.source);
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_normalizes_case_and_whitespace() {
        assert_eq!(identity_key("  The   Matrix ", Some(1999)), "the matrix|1999");
        assert_eq!(identity_key("THE MATRIX", Some(1999)), "the matrix|1999");
        assert_eq!(identity_key("Heat", None), "heat|");
    }

    #[test]
    fn test_clamp_rating() {
        assert_eq!(clamp_rating(Some(11.0)), Some(10.0));
        assert_eq!(clamp_rating(Some(-1.0)), Some(0.0));
        assert_eq!(clamp_rating(Some(f32::NAN)), None);
        assert_eq!(clamp_rating(None), None);
    }

    #[test]
    fn test_title_from_record() {
        let record = RawRecord::new(" Inception ", "tmdb")
            .with_year(Some(2010))
            .with_rating(Some(8.8));
        let title = Title::from(record);

        assert_eq!(title.title, "Inception");
        assert_eq!(title.key(), "inception|2010");
        assert_eq!(title.providers, vec!["tmdb"]);
        assert!(title.links.is_empty());
        assert!(title.needs_resolution());
    }

    #[test]
    fn test_add_provider_is_unique() {
        let mut title = Title::from(RawRecord::new("Heat", "yts"));
        title.add_provider("yts");
        title.add_provider("apibay");
        assert_eq!(title.providers, vec!["yts", "apibay"]);
    }

    #[test]
    fn test_sort_rating_defaults_to_zero() {
        let title = Title::from(RawRecord::new("Heat", "yts"));
        assert_eq!(title.sort_rating(), 0.0);
    }
}
