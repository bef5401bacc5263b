//! Types for the aggregation engine.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Query, RawRecord, Title};
use crate::provider::ProviderErrorKind;

/// Identifies one aggregation run.
///
/// A session commits only its latest run and accepts write-backs only for
/// the run whose titles it shows, so a slow, abandoned run cannot overwrite
/// a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunToken(Uuid);

impl RunToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a single provider contributed to a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderOutcome {
    /// Called the upstream.
    Fresh { records: usize },
    /// Served from the cache without calling the upstream.
    Cached { records: usize },
    /// The call failed or timed out and contributed nothing.
    Failed { error: ProviderErrorKind },
}

/// Per-provider line of a fan-out report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderReport {
    pub provider: String,
    /// Term the provider was searched with.
    pub term: String,
    #[serde(flatten)]
    pub outcome: ProviderOutcome,
    pub elapsed_ms: u64,
}

impl ProviderReport {
    pub(crate) fn new(
        provider: &str,
        term: &str,
        outcome: ProviderOutcome,
        elapsed: Duration,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            term: term.to_string(),
            outcome,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Everything a fan-out collected.
#[derive(Debug, Clone, Default)]
pub struct FanOutReport {
    /// All records, grouped by provider in configuration order.
    pub records: Vec<RawRecord>,
    pub providers: Vec<ProviderReport>,
}

/// Top-level result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "titles", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found(Vec<Title>),
    /// Every provider came back empty. Not an error.
    NoResultsFound,
}

impl SearchOutcome {
    pub fn titles(&self) -> &[Title] {
        match self {
            SearchOutcome::Found(titles) => titles,
            SearchOutcome::NoResultsFound => &[],
        }
    }

    pub fn into_titles(self) -> Vec<Title> {
        match self {
            SearchOutcome::Found(titles) => titles,
            SearchOutcome::NoResultsFound => Vec::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }
}

/// One completed aggregation run.
#[derive(Debug, Clone)]
pub struct AggregateRun {
    pub run: RunToken,
    /// The query as executed, including any master title looked up.
    pub query: Query,
    pub outcome: SearchOutcome,
    pub providers: Vec<ProviderReport>,
}

/// States of the fallback cascade for one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Idle,
    /// Waiting on the fallback provider at this index.
    Probing(usize),
    Resolved,
    Exhausted,
}

/// How a link resolution ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// The title already had usable links; nothing was probed.
    AlreadyResolved,
    /// A fallback provider supplied links.
    Resolved { provider: String },
    /// Every fallback provider came back empty. The title is unchanged.
    Exhausted,
}

impl ResolveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveOutcome::AlreadyResolved => "already_resolved",
            ResolveOutcome::Resolved { .. } => "resolved",
            ResolveOutcome::Exhausted => "exhausted",
        }
    }
}

/// A title after the cascade ran on it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub title: Title,
    pub outcome: ResolveOutcome,
    /// Fallback providers consulted, in probe order.
    pub probed: Vec<String>,
}
