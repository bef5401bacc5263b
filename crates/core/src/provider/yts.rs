//! YTS movie index.
//!
//! YTS publishes a JSON API on several mirror domains. Each movie carries its
//! metadata and a list of torrents, so this source supplies both.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, MirrorList, Provider, ProviderError, ProviderSettings};
use crate::model::{clamp_rating, magnet_uri, Capability, Link, ProviderDescriptor, RawRecord};

const DEFAULT_PRIORITY: u32 = 10;

fn default_mirrors() -> Vec<String> {
    vec![
        "https://yts.mx".to_string(),
        "https://yts.lt".to_string(),
        "https://yts.am".to_string(),
    ]
}

/// YTS provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtsConfig {
    /// Mirror base URLs, tried in order.
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<String>,
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

impl Default for YtsConfig {
    fn default() -> Self {
        Self {
            mirrors: default_mirrors(),
            settings: ProviderSettings::default(),
        }
    }
}

pub struct YtsProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    mirrors: MirrorList,
}

impl YtsProvider {
    pub fn new(config: YtsConfig) -> Result<Self, ProviderError> {
        let mirrors = MirrorList::new(config.mirrors);
        if mirrors.is_empty() {
            return Err(ProviderError::NotConfigured(
                "YTS needs at least one mirror".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            descriptor: config
                .settings
                .descriptor("yts", DEFAULT_PRIORITY, Capability::Both, false),
            mirrors,
        })
    }

    async fn list_movies(
        &self,
        base: String,
        term: &str,
        limit: usize,
    ) -> Result<Vec<YtsMovie>, ProviderError> {
        let url = format!("{}/api/v2/list_movies.json", base);
        debug!(url = %url, term = term, "YTS search");

        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("query_term", term), ("limit", limit.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: YtsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse YTS response: {}", e)))?;

        if body.status != "ok" {
            return Err(ProviderError::Unavailable(format!(
                "YTS returned status '{}'",
                body.status
            )));
        }

        Ok(body.data.and_then(|d| d.movies).unwrap_or_default())
    }
}

#[async_trait]
impl Provider for YtsProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        let movies = self
            .mirrors
            .fetch(|base| self.list_movies(base, term, limit))
            .await?;

        Ok(movies
            .into_iter()
            .map(|m| m.into_record(&self.descriptor.name))
            .collect())
    }
}

// ============================================================================
// YTS API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct YtsResponse {
    status: String,
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    movies: Option<Vec<YtsMovie>>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    title: String,
    year: Option<u32>,
    rating: Option<f32>,
    #[serde(default)]
    genres: Vec<String>,
    summary: Option<String>,
    medium_cover_image: Option<String>,
    #[serde(default)]
    torrents: Vec<YtsTorrent>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    hash: String,
    quality: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    seeds: u32,
    size: Option<String>,
}

impl YtsMovie {
    fn into_record(self, source: &str) -> RawRecord {
        let display = match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        };
        let links = self
            .torrents
            .into_iter()
            .map(|t| {
                let quality = match t.kind {
                    Some(kind) => format!("{} {}", t.quality, kind),
                    None => t.quality,
                };
                Link::new(
                    quality,
                    t.size.unwrap_or_else(|| crate::model::UNKNOWN_SIZE.to_string()),
                    t.seeds,
                    magnet_uri(&t.hash, &display),
                    source,
                )
            })
            .collect();

        RawRecord {
            title: self.title,
            original_title: None,
            year: self.year,
            rating: clamp_rating(self.rating),
            poster: self.medium_cover_image,
            synopsis: self.summary.filter(|s| !s.is_empty()),
            genres: self.genres,
            links,
            source: source.to_string(),
            detail_ref: None,
        }
    }
}
