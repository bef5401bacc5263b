//! Internet Archive (archive.org) public-domain films.
//!
//! The advanced search endpoint yields item metadata only. Links come from
//! the per-item metadata endpoint, whose video files are plain HTTP downloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{check_status, Provider, ProviderError, ProviderSettings};
use crate::model::{format_size, Capability, Link, ProviderDescriptor, RawRecord};

const DEFAULT_PRIORITY: u32 = 50;
const DEFAULT_BASE_URL: &str = "https://archive.org";
/// File formats served as playable video.
const VIDEO_FORMATS: &[&str] = &["mpeg4", "h.264", "matroska", "ogg video", "512kb mpeg4"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

pub struct ArchiveProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    base_url: String,
}

impl ArchiveProvider {
    pub fn new(config: ArchiveConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            descriptor: config
                .settings
                .descriptor("archive", DEFAULT_PRIORITY, Capability::Both, false),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    async fn item_files(&self, identifier: &str) -> Result<Vec<ArchiveFile>, ProviderError> {
        let url = format!(
            "{}/metadata/{}",
            self.base_url,
            urlencoding::encode(identifier)
        );
        debug!(url = %url, "Archive item metadata");

        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        let item: ArchiveItem = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse item metadata: {}", e)))?;

        Ok(item.files)
    }

    fn file_link(&self, identifier: &str, file: ArchiveFile) -> Option<Link> {
        let format = file.format?;
        if !VIDEO_FORMATS.contains(&format.to_lowercase().as_str()) {
            return None;
        }
        let size = file
            .size
            .as_ref()
            .and_then(value_as_u64)
            .map(format_size)
            .unwrap_or_else(|| crate::model::UNKNOWN_SIZE.to_string());
        let address = format!(
            "{}/download/{}/{}",
            self.base_url,
            urlencoding::encode(identifier),
            urlencoding::encode(&file.name)
        );
        Some(Link::new(format, size, 0, address, self.descriptor.name.clone()).direct())
    }
}

#[async_trait]
impl Provider for ArchiveProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        let url = format!("{}/advancedsearch.php", self.base_url);
        let q = format!("title:({}) AND mediatype:(movies)", escape_query(term));
        let rows = limit.to_string();

        debug!(term = term, "Archive search");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", q.as_str()),
                ("fl[]", "identifier"),
                ("fl[]", "title"),
                ("fl[]", "year"),
                ("fl[]", "description"),
                ("fl[]", "subject"),
                ("rows", rows.as_str()),
                ("output", "json"),
            ])
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: ArchiveSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse archive search: {}", e)))?;

        Ok(body
            .response
            .docs
            .into_iter()
            .map(|doc| doc.into_record(&self.descriptor.name))
            .collect())
    }

    /// Search results carry no links, so resolution reads the item's files.
    async fn resolve(&self, record: &RawRecord) -> Result<Vec<Link>, ProviderError> {
        let identifier = match &record.detail_ref {
            Some(id) => id.clone(),
            None => {
                // Records from other sources: find the matching item first.
                let found = self.search(&record.title, 5).await?;
                match found.into_iter().find(|c| super::same_title(record, c)) {
                    Some(item) => match item.detail_ref {
                        Some(id) => id,
                        None => return Ok(Vec::new()),
                    },
                    None => return Ok(Vec::new()),
                }
            }
        };

        let files = self.item_files(&identifier).await?;
        Ok(files
            .into_iter()
            .filter_map(|f| self.file_link(&identifier, f))
            .collect())
    }
}

// ============================================================================
// Archive API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArchiveSearchResponse {
    response: ArchiveDocs,
}

#[derive(Debug, Deserialize)]
struct ArchiveDocs {
    #[serde(default)]
    docs: Vec<ArchiveDoc>,
}

/// Archive fields are loosely typed: years may be numbers or strings and
/// descriptions/subjects may be a string or a list.
#[derive(Debug, Deserialize)]
struct ArchiveDoc {
    identifier: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    subject: Option<Value>,
}

impl ArchiveDoc {
    fn into_record(self, source: &str) -> RawRecord {
        let title = self.title.unwrap_or_else(|| self.identifier.clone());
        let year = self
            .year
            .as_ref()
            .and_then(value_as_u64)
            .and_then(|y| u32::try_from(y).ok());

        RawRecord {
            title,
            year,
            synopsis: self
                .description
                .map(|d| value_strings(&d).join("\n"))
                .filter(|d| !d.is_empty()),
            genres: self.subject.map(|s| value_strings(&s)).unwrap_or_default(),
            source: source.to_string(),
            detail_ref: Some(self.identifier),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveItem {
    #[serde(default)]
    files: Vec<ArchiveFile>,
}

#[derive(Debug, Deserialize)]
struct ArchiveFile {
    name: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    size: Option<Value>,
}

/// Characters with meaning in the advanced search (Lucene) syntax.
const QUERY_SPECIAL: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
    '/',
];

/// Escape a free-text term so it is matched literally inside `title:(...)`.
fn escape_query(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if QUERY_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
