//! Search queries.

use serde::{Deserialize, Serialize};

use super::descriptor::ProviderDescriptor;
use super::title::normalize_title;

/// A search request, optionally carrying the canonical (master) title.
///
/// Non-English providers index titles under their English name, so when the
/// metadata provider knows it, providers that prefer it are searched with the
/// master title instead of the user's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    master_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    master_year: Option<u32>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            master_title: None,
            master_year: None,
        }
    }

    /// Attach a resolved master title and year. Blank titles are ignored.
    pub fn with_master(mut self, title: Option<String>, year: Option<u32>) -> Self {
        self.master_title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.master_year = self.master_title.as_ref().and(year);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn master_title(&self) -> Option<&str> {
        self.master_title.as_deref()
    }

    pub fn master_year(&self) -> Option<u32> {
        self.master_year
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Search term to send to a given provider.
    pub fn term_for(&self, descriptor: &ProviderDescriptor) -> String {
        match (&self.master_title, descriptor.prefers_master_title) {
            (Some(master), true) => match self.master_year {
                Some(year) => format!("{} {}", master, year),
                None => master.clone(),
            },
            _ => self.text.clone(),
        }
    }

    /// Normalized form of a term, used in cache keys.
    pub fn normalized(term: &str) -> String {
        normalize_title(term)
    }
}
