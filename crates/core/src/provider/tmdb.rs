//! TMDB (The Movie Database) metadata provider.
//!
//! TMDB requires an API key for access. It supplies ratings, posters and
//! synopses but no links, and is the source of master (English) titles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    check_status, MasterTitle, MasterTitleResolver, Provider, ProviderError, ProviderSettings,
};
use crate::model::{clamp_rating, Capability, ProviderDescriptor, RawRecord};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const DEFAULT_PRIORITY: u32 = 0;
const POSTER_SIZE: &str = "w500";

/// TMDB provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Language for localized titles and synopses (default: en-US).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

/// TMDB provider.
pub struct TmdbProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    base_url: String,
    image_base_url: String,
    api_key: String,
    language: String,
}

impl TmdbProvider {
    /// Create a new TMDB provider.
    pub fn new(config: TmdbConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            descriptor: config.settings.descriptor(
                "tmdb",
                DEFAULT_PRIORITY,
                Capability::Metadata,
                false,
            ),
            base_url,
            image_base_url,
            api_key: config.api_key,
            language: config.language.unwrap_or_else(|| "en-US".to_string()),
        })
    }

    /// Search for movies by query.
    async fn search_movies(
        &self,
        query: &str,
        language: &str,
    ) -> Result<Vec<TmdbMovieResult>, ProviderError> {
        let url = format!("{}/search/movie", self.base_url);

        debug!("TMDB movie search: query='{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("language", language),
            ])
            .send()
            .await?;

        let response = check_tmdb_status(response).await?;

        let search_result: TmdbSearchResponse<TmdbMovieResult> =
            response.json().await.map_err(|e| {
                ProviderError::Parse(format!("Failed to parse movie search response: {}", e))
            })?;

        Ok(search_result.results)
    }

    /// Search for TV series by query.
    async fn search_tv(&self, query: &str) -> Result<Vec<TmdbTvResult>, ProviderError> {
        let url = format!("{}/search/tv", self.base_url);

        debug!("TMDB TV search: query='{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        let response = check_tmdb_status(response).await?;

        let search_result: TmdbSearchResponse<TmdbTvResult> =
            response.json().await.map_err(|e| {
                ProviderError::Parse(format!("Failed to parse TV search response: {}", e))
            })?;

        Ok(search_result.results)
    }

    fn poster_url(&self, path: Option<String>) -> Option<String> {
        path.map(|p| format!("{}/{}{}", self.image_base_url, POSTER_SIZE, p))
    }

    fn movie_record(&self, m: TmdbMovieResult) -> RawRecord {
        RawRecord {
            title: m.title,
            original_title: m.original_title,
            year: year_from_date(m.release_date.as_deref()),
            rating: clamp_rating(m.vote_average),
            poster: self.poster_url(m.poster_path),
            synopsis: m.overview.filter(|o| !o.is_empty()),
            genres: Vec::new(),
            links: Vec::new(),
            source: self.descriptor.name.clone(),
            detail_ref: Some(format!("movie/{}", m.id)),
        }
    }

    fn tv_record(&self, t: TmdbTvResult) -> RawRecord {
        RawRecord {
            title: t.name,
            original_title: t.original_name,
            year: year_from_date(t.first_air_date.as_deref()),
            rating: clamp_rating(t.vote_average),
            poster: self.poster_url(t.poster_path),
            synopsis: t.overview.filter(|o| !o.is_empty()),
            genres: Vec::new(),
            links: Vec::new(),
            source: self.descriptor.name.clone(),
            detail_ref: Some(format!("tv/{}", t.id)),
        }
    }
}

#[async_trait]
impl Provider for TmdbProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        let movies = self.search_movies(term, &self.language).await?;
        // A failing TV search still leaves the movie results usable.
        let shows = match self.search_tv(term).await {
            Ok(shows) => shows,
            Err(e) => {
                debug!(error = %e, "TMDB TV search failed, keeping movie results");
                Vec::new()
            }
        };

        Ok(movies
            .into_iter()
            .map(|m| self.movie_record(m))
            .chain(shows.into_iter().map(|t| self.tv_record(t)))
            .take(limit)
            .collect())
    }

    /// TMDB never has links.
    async fn resolve(&self, _record: &RawRecord) -> Result<Vec<crate::model::Link>, ProviderError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl MasterTitleResolver for TmdbProvider {
    async fn master_title(&self, text: &str) -> Result<Option<MasterTitle>, ProviderError> {
        let movies = self.search_movies(text, "en-US").await?;
        Ok(movies.into_iter().next().map(|m| MasterTitle {
            year: year_from_date(m.release_date.as_deref()),
            title: m.title,
        }))
    }
}

async fn check_tmdb_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if response.status() == 429 {
        return Err(ProviderError::Unavailable(
            "TMDB rate limit exceeded".to_string(),
        ));
    }
    check_status(response).await
}

/// Year from a `YYYY-MM-DD` date (TMDB sends empty strings for unknown dates).
fn year_from_date(date: Option<&str>) -> Option<u32> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.parse().ok())
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    id: u32,
    name: String,
    original_name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f32>,
}
