//! Jackett torrent indexer proxy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::release::parse_release_name;
use super::{check_status, Provider, ProviderError, ProviderSettings};
use crate::model::{format_size, magnet_uri, Capability, Link, ProviderDescriptor, RawRecord};

const DEFAULT_PRIORITY: u32 = 30;
/// Jackett category ids for movies and TV.
const VIDEO_CATEGORIES: [u32; 2] = [2000, 5000];

fn default_indexers() -> Vec<String> {
    vec!["all".to_string()]
}

/// Jackett provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JackettConfig {
    /// Jackett base URL (e.g. http://localhost:9117).
    pub url: String,
    /// Jackett API key.
    pub api_key: String,
    /// Indexers to query; "all" is Jackett's aggregate indexer.
    #[serde(default = "default_indexers")]
    pub indexers: Vec<String>,
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

pub struct JackettProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    url: String,
    api_key: String,
    indexers: Vec<String>,
}

impl JackettProvider {
    pub fn new(config: JackettConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Jackett API key is required".to_string(),
            ));
        }

        let indexers = if config.indexers.is_empty() {
            default_indexers()
        } else {
            config.indexers
        };

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            descriptor: config
                .settings
                .descriptor("jackett", DEFAULT_PRIORITY, Capability::Links, false),
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            indexers,
        })
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, term: &str, indexer: &str) -> String {
        let mut url = format!(
            "{}/api/v2.0/indexers/{}/results?apikey={}&Query={}",
            self.url,
            urlencoding::encode(indexer),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(term)
        );
        for cat in VIDEO_CATEGORIES {
            url.push_str(&format!("&Category[]={}", cat));
        }
        url
    }

    /// Search a single indexer.
    async fn search_indexer(
        &self,
        term: &str,
        indexer: &str,
    ) -> Result<Vec<JackettResult>, ProviderError> {
        let url = self.build_search_url(term, indexer);
        debug!(indexer = indexer, "Searching Jackett");

        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;

        let jackett_response: JackettResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse response: {}", e)))?;

        debug!(
            indexer = indexer,
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(jackett_response.Results)
    }
}

#[async_trait]
impl Provider for JackettProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        let search_futures: Vec<_> = self
            .indexers
            .iter()
            .map(|indexer| async move { (indexer, self.search_indexer(term, indexer).await) })
            .collect();

        let results = futures::future::join_all(search_futures).await;

        let mut rows = Vec::new();
        let mut last_error = None;
        for (indexer, result) in results {
            match result {
                Ok(mut found) => rows.append(&mut found),
                Err(e) => {
                    warn!(indexer = %indexer, error = %e, "Indexer search failed");
                    last_error = Some(e);
                }
            }
        }

        // Only an error when every indexer failed.
        if rows.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(rows
            .into_iter()
            .filter_map(|r| r.into_record(&self.descriptor.name))
            .take(limit)
            .collect())
    }
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    MagnetUri: Option<String>,
    Link: Option<String>,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
}

impl JackettResult {
    fn into_record(self, source: &str) -> Option<RawRecord> {
        let address = match (self.MagnetUri, self.InfoHash, self.Link) {
            (Some(magnet), _, _) => magnet,
            (None, Some(hash), _) => magnet_uri(&hash, &self.Title),
            (None, None, Some(link)) => link,
            (None, None, None) => return None,
        };

        let parsed = parse_release_name(&self.Title);
        if parsed.title.is_empty() {
            return None;
        }

        let link = Link::new(
            parsed.quality,
            format_size(self.Size.unwrap_or(0).max(0) as u64),
            self.Seeders.unwrap_or(0).max(0) as u32,
            address,
            source,
        );

        Some(
            RawRecord::new(parsed.title, source)
                .with_year(parsed.year)
                .with_links(vec![link]),
        )
    }
}
