//! Placeholder links to external search pages.
//!
//! Never hits the network. For every term it returns a single record whose
//! links point at configured search sites, so a title always has somewhere
//! to look even when no index carries it. These links are not usable
//! results and trigger the fallback cascade.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::release::parse_release_name;
use super::{Provider, ProviderError, ProviderSettings};
use crate::model::{Capability, Link, ProviderDescriptor, RawRecord};

const DEFAULT_PRIORITY: u32 = 100;
const QUERY_PLACEHOLDER: &str = "{query}";

/// An external site searched by URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSite {
    pub name: String,
    /// URL containing `{query}`, replaced with the encoded search term.
    pub url_template: String,
}

impl SearchSite {
    pub fn url_for(&self, term: &str) -> String {
        self.url_template
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(term))
    }
}

fn default_sites() -> Vec<SearchSite> {
    vec![
        SearchSite {
            name: "rutracker".to_string(),
            url_template: "https://rutracker.org/forum/tracker.php?nm={query}".to_string(),
        },
        SearchSite {
            name: "1337x".to_string(),
            url_template: "https://1337x.to/search/{query}/1/".to_string(),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLinksConfig {
    #[serde(default = "default_sites")]
    pub sites: Vec<SearchSite>,
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

impl Default for SearchLinksConfig {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            settings: ProviderSettings::default(),
        }
    }
}

pub struct SearchLinksProvider {
    descriptor: ProviderDescriptor,
    sites: Vec<SearchSite>,
}

impl SearchLinksProvider {
    pub fn new(config: SearchLinksConfig) -> Result<Self, ProviderError> {
        if let Some(site) = config
            .sites
            .iter()
            .find(|s| !s.url_template.contains(QUERY_PLACEHOLDER))
        {
            return Err(ProviderError::NotConfigured(format!(
                "search site '{}' has no {} placeholder",
                site.name, QUERY_PLACEHOLDER
            )));
        }

        Ok(Self {
            // Searched with the master title so its record merges with the
            // metadata record of the same film.
            descriptor: config.settings.descriptor(
                "search_links",
                DEFAULT_PRIORITY,
                Capability::Links,
                true,
            ),
            sites: config.sites,
        })
    }

    fn links_for(&self, term: &str) -> Vec<Link> {
        self.sites
            .iter()
            .map(|site| Link::search_placeholder(site.url_for(term), site.name.clone()))
            .collect()
    }
}

#[async_trait]
impl Provider for SearchLinksProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        let term = term.trim();
        if term.is_empty() || limit == 0 || self.sites.is_empty() {
            return Ok(Vec::new());
        }

        // "Inception 2010" keys as ("inception", 2010) like the metadata record.
        let parsed = parse_release_name(term);
        let title = if parsed.title.is_empty() {
            term.to_string()
        } else {
            parsed.title
        };

        Ok(vec![RawRecord::new(title, self.descriptor.name.clone())
            .with_year(parsed.year)
            .with_links(self.links_for(term))])
    }

    async fn resolve(&self, record: &RawRecord) -> Result<Vec<Link>, ProviderError> {
        let term = match record.year {
            Some(year) => format!("{} {}", record.title, year),
            None => record.title.clone(),
        };
        Ok(self.links_for(&term))
    }
}
