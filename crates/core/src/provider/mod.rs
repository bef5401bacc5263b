//! Upstream sources behind a uniform search/resolve contract.
//!
//! Each adapter normalizes its upstream shape into [`RawRecord`]s and
//! [`Link`]s at its own boundary. Adapters report failures as
//! [`ProviderError`]; the [`GuardedProvider`] wrapper is the boundary that
//! turns errors and timeouts into empty results, so nothing past this module
//! ever has to handle a provider failure.

mod apibay;
mod archive;
mod guard;
mod jackett;
mod mirror;
mod registry;
pub mod release;
mod search_links;
mod telegram;
mod tmdb;
mod yts;

pub use apibay::{ApibayConfig, ApibayProvider};
pub use archive::{ArchiveConfig, ArchiveProvider};
pub use guard::{GuardedProvider, ProviderCall};
pub use jackett::{JackettConfig, JackettProvider};
pub use mirror::MirrorList;
pub use registry::ProviderRegistry;
pub use search_links::{SearchLinksConfig, SearchLinksProvider, SearchSite};
pub use telegram::{TelegramConfig, TelegramProvider};
pub use tmdb::{TmdbConfig, TmdbProvider};
pub use yts::{YtsConfig, YtsProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    identity_key, normalize_title, Capability, Link, ProviderDescriptor, RawRecord,
};

/// Number of records fetched when `resolve` falls back to a title search.
const RESOLVE_SEARCH_LIMIT: usize = 20;

/// Errors an adapter can hit while talking to its upstream.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The call exceeded its time budget.
    #[error("request timed out")]
    Timeout,

    /// Network/transport failure or a non-success HTTP status.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The upstream answered with something we could not parse.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Missing API key, empty mirror list, etc.
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Stable label for a provider failure, used in logs, metrics and reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Timeout,
    Unavailable,
    Parse,
    NotConfigured,
}

impl ProviderErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Parse => "parse",
            ProviderErrorKind::NotConfigured => "not_configured",
        }
    }
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Timeout => ProviderErrorKind::Timeout,
            ProviderError::Unavailable(_) => ProviderErrorKind::Unavailable,
            ProviderError::Parse(_) => ProviderErrorKind::Parse,
            ProviderError::NotConfigured(_) => ProviderErrorKind::NotConfigured,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Unavailable(e.to_string())
        }
    }
}

/// Settings every adapter accepts next to its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Overrides the adapter's default fallback priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    /// Overrides whether the adapter is searched with the master title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefers_master_title: Option<bool>,
}

impl ProviderSettings {
    /// Build a descriptor, applying overrides on top of adapter defaults.
    pub fn descriptor(
        &self,
        name: &str,
        default_priority: u32,
        capability: Capability,
        default_master_title: bool,
    ) -> ProviderDescriptor {
        ProviderDescriptor::new(name, self.priority.unwrap_or(default_priority), capability)
            .with_master_title(self.prefers_master_title.unwrap_or(default_master_title))
    }
}

/// Contract every upstream source satisfies.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Static metadata: name, fallback priority, capability.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Provider name, also the source tag of every record it returns.
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Search the upstream for `term`, returning at most `limit` records.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError>;

    /// Fetch links for a record.
    ///
    /// The default re-runs a title search and keeps the links of the records
    /// describing the same title. Sources whose search results carry no
    /// links override this with a detail-page fetch.
    async fn resolve(&self, record: &RawRecord) -> Result<Vec<Link>, ProviderError> {
        let records = self.search(&record.title, RESOLVE_SEARCH_LIMIT).await?;
        Ok(links_matching(record, records))
    }
}

/// A canonical title and year reported by a metadata source.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterTitle {
    pub title: String,
    pub year: Option<u32>,
}

/// Looks up the canonical (English) name for a free-text query.
#[async_trait]
pub trait MasterTitleResolver: Send + Sync {
    async fn master_title(&self, text: &str) -> Result<Option<MasterTitle>, ProviderError>;
}

/// Whether `candidate` describes the same title as `target`.
///
/// Records with a year on both sides must agree on the full identity key;
/// when either side lacks a year the normalized titles are compared.
pub fn same_title(target: &RawRecord, candidate: &RawRecord) -> bool {
    match (target.year, candidate.year) {
        (Some(_), Some(_)) => identity_key(&target.title, target.year) == candidate.key(),
        _ => normalize_title(&target.title) == normalize_title(&candidate.title),
    }
}

/// Collect the links of every candidate describing the same title as `target`.
pub fn links_matching(target: &RawRecord, candidates: Vec<RawRecord>) -> Vec<Link> {
    candidates
        .into_iter()
        .filter(|c| same_title(target, c))
        .flat_map(|c| c.links)
        .collect()
}

/// Fill in the source tag of links an adapter left blank.
pub(crate) fn tag_links(links: &mut [Link], source: &str) {
    for link in links.iter_mut().filter(|l| l.source.is_empty()) {
        link.source = source.to_string();
    }
}

/// Shared HTTP status handling for adapters.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status == 401 || status == 403 {
        return Err(ProviderError::NotConfigured(format!(
            "upstream rejected credentials (HTTP {})",
            status.as_u16()
        )));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Unavailable(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body.chars().take(200).collect::<String>()
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, year: Option<u32>, address: &str) -> RawRecord {
        RawRecord::new(title, "test")
            .with_year(year)
            .with_links(vec![Link::new("1080p", "1 GB", 1, address, "test")])
    }

    #[test]
    fn test_same_title_with_years() {
        let target = RawRecord::new("Heat", "x").with_year(Some(1995));
        assert!(same_title(&target, &record("HEAT", Some(1995), "a")));
        assert!(!same_title(&target, &record("Heat", Some(2013), "a")));
    }

    #[test]
    fn test_same_title_without_year() {
        let target = RawRecord::new("Heat", "x");
        assert!(same_title(&target, &record("heat", Some(1995), "a")));
        assert!(!same_title(&target, &record("Heatwave", None, "a")));
    }

    #[test]
    fn test_links_matching() {
        let target = RawRecord::new("Heat", "x").with_year(Some(1995));
        let links = links_matching(
            &target,
            vec![
                record("Heat", Some(1995), "magnet:a"),
                record("Heat", Some(2013), "magnet:b"),
                record("Heat", None, "magnet:c"),
            ],
        );
        let addresses: Vec<_> = links.iter().map(|l| l.address.as_str()).collect();
        assert_eq!(addresses, vec!["magnet:a", "magnet:c"]);
    }

    #[test]
    fn test_settings_override_defaults() {
        let settings = ProviderSettings {
            priority: Some(5),
            prefers_master_title: None,
        };
        let descriptor = settings.descriptor("yts", 10, Capability::Both, true);
        assert_eq!(descriptor.priority, 5);
        assert!(descriptor.prefers_master_title);
        assert_eq!(descriptor.capability, Capability::Both);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(ProviderError::Timeout.kind(), ProviderErrorKind::Timeout);
        assert_eq!(
            ProviderError::Parse("bad json".into()).kind().as_str(),
            "parse"
        );
        assert_eq!(
            ProviderError::Unavailable("HTTP 503".into()).to_string(),
            "provider unavailable: HTTP 503"
        );
    }
}
