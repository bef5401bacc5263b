//! The Pirate Bay JSON API (apibay).
//!
//! Results are bare torrents with a release name, so title and year are
//! recovered with the release-name parser.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::release::parse_release_name;
use super::{check_status, MirrorList, Provider, ProviderError, ProviderSettings};
use crate::model::{format_size, magnet_uri, Capability, Link, ProviderDescriptor, RawRecord};

const DEFAULT_PRIORITY: u32 = 20;

/// Id apibay returns for its "No results returned" sentinel row.
const NO_RESULTS_ID: &str = "0";

fn default_mirrors() -> Vec<String> {
    vec!["https://apibay.org".to_string()]
}

/// Video category on the index.
fn default_category() -> String {
    "200".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApibayConfig {
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

impl Default for ApibayConfig {
    fn default() -> Self {
        Self {
            mirrors: default_mirrors(),
            category: default_category(),
            settings: ProviderSettings::default(),
        }
    }
}

pub struct ApibayProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    mirrors: MirrorList,
    category: String,
}

impl ApibayProvider {
    pub fn new(config: ApibayConfig) -> Result<Self, ProviderError> {
        let mirrors = MirrorList::new(config.mirrors);
        if mirrors.is_empty() {
            return Err(ProviderError::NotConfigured(
                "apibay needs at least one mirror".to_string(),
            ));
        }

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            descriptor: config
                .settings
                .descriptor("apibay", DEFAULT_PRIORITY, Capability::Links, false),
            mirrors,
            category: config.category,
        })
    }

    async fn query(&self, base: String, term: &str) -> Result<Vec<ApibayTorrent>, ProviderError> {
        let url = format!("{}/q.php", base);
        debug!(url = %url, term = term, "apibay search");

        let response = self
            .client
            .get(&url)
            .query(&[("q", term), ("cat", self.category.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse apibay response: {}", e)))
    }
}

#[async_trait]
impl Provider for ApibayProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        let torrents = self.mirrors.fetch(|base| self.query(base, term)).await?;

        Ok(torrents
            .into_iter()
            .filter(|t| t.id != NO_RESULTS_ID)
            .filter_map(|t| t.into_record(&self.descriptor.name))
            .take(limit)
            .collect())
    }
}

/// One row of the apibay response. Numbers arrive as strings.
#[derive(Debug, Deserialize)]
struct ApibayTorrent {
    id: String,
    name: String,
    info_hash: String,
    #[serde(default)]
    seeders: String,
    #[serde(default)]
    size: String,
}

impl ApibayTorrent {
    fn into_record(self, source: &str) -> Option<RawRecord> {
        let parsed = parse_release_name(&self.name);
        if parsed.title.is_empty() {
            return None;
        }

        let size = self.size.parse::<u64>().map(format_size).unwrap_or_else(|_| {
            crate::model::UNKNOWN_SIZE.to_string()
        });
        let link = Link::new(
            parsed.quality,
            size,
            self.seeders.parse().unwrap_or(0),
            magnet_uri(&self.info_hash, &self.name),
            source,
        );

        Some(
            RawRecord::new(parsed.title, source)
                .with_year(parsed.year)
                .with_links(vec![link]),
        )
    }
}
