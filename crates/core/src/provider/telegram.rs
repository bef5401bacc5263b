//! Public Telegram channels, read through the t.me web preview.
//!
//! Channels that distribute films post a release name followed by a deep
//! link into a delivery bot (`https://t.me/SomeBot?start=...`). Each post
//! becomes one record; bot deep links are marked as bot links, and posts
//! without one fall back to the post's own link.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::release::parse_release_name;
use super::{check_status, Provider, ProviderError, ProviderSettings};
use crate::model::{Capability, Link, ProviderDescriptor, RawRecord, UNKNOWN_SIZE};

const DEFAULT_PRIORITY: u32 = 40;
const DEFAULT_BASE_URL: &str = "https://t.me";

static MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)data-post="([^"]+)".*?<div class="tgme_widget_message_text[^"]*"[^>]*>(.*?)</div>"#)
        .expect("Invalid regex pattern defined in code")
});

static BOT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="(https://t\.me/[A-Za-z0-9_]+[Bb][Oo][Tt]\?start=[^"]+)""#)
        .expect("Invalid regex pattern defined in code")
});

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>").expect("Invalid regex pattern defined in code")
});

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex pattern defined in code"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Public channel usernames, without the leading '@'.
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(flatten)]
    pub settings: ProviderSettings,
}

pub struct TelegramProvider {
    client: Client,
    descriptor: ProviderDescriptor,
    base_url: String,
    channels: Vec<String>,
}

impl TelegramProvider {
    pub fn new(config: TelegramConfig) -> Result<Self, ProviderError> {
        let channels: Vec<String> = config
            .channels
            .into_iter()
            .map(|c| c.trim().trim_start_matches('@').to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if channels.is_empty() {
            return Err(ProviderError::NotConfigured(
                "telegram needs at least one channel".to_string(),
            ));
        }

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            descriptor: config
                .settings
                .descriptor("telegram", DEFAULT_PRIORITY, Capability::Links, false),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            channels,
        })
    }

    async fn search_channel(&self, channel: &str, term: &str) -> Result<String, ProviderError> {
        let url = format!("{}/s/{}", self.base_url, urlencoding::encode(channel));
        debug!(channel = channel, term = term, "Telegram channel search");

        let response = self.client.get(&url).query(&[("q", term)]).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Provider for TelegramProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<RawRecord>, ProviderError> {
        let pages = futures::future::join_all(
            self.channels
                .iter()
                .map(|channel| self.search_channel(channel, term)),
        )
        .await;

        let mut records = Vec::new();
        let mut last_error = None;
        for page in pages {
            match page {
                Ok(html) => records.extend(parse_channel_page(
                    &html,
                    &self.base_url,
                    &self.descriptor.name,
                )),
                Err(e) => last_error = Some(e),
            }
        }

        if records.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        records.truncate(limit);
        Ok(records)
    }
}

/// Extract one record per channel post from a web-preview page.
fn parse_channel_page(html: &str, base_url: &str, source: &str) -> Vec<RawRecord> {
    MESSAGE
        .captures_iter(html)
        .filter_map(|caps| {
            let post = caps.get(1)?.as_str();
            let body = caps.get(2)?.as_str();

            let text = message_text(body);
            let first_line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
            let parsed = parse_release_name(first_line);
            if parsed.title.is_empty() {
                return None;
            }

            let mut links: Vec<Link> = BOT_LINK
                .captures_iter(body)
                .filter_map(|c| c.get(1))
                .map(|m| {
                    let address = html_escape::decode_html_entities(m.as_str()).to_string();
                    Link::new(parsed.quality.clone(), UNKNOWN_SIZE, 0, address, source).bot()
                })
                .collect();
            if links.is_empty() {
                links.push(Link::new(
                    parsed.quality.clone(),
                    UNKNOWN_SIZE,
                    0,
                    format!("{}/{}", base_url, post),
                    source,
                ));
            }

            Some(
                RawRecord::new(parsed.title, source)
                    .with_year(parsed.year)
                    .with_links(links),
            )
        })
        .collect()
}

fn message_text(body: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(body, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    html_escape::decode_html_entities(&stripped).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="tgme_widget_message_wrap js-widget_message_wrap">
  <div class="tgme_widget_message text_not_supported_wrap js-widget_message" data-post="kino_hub/101" data-view="x">
    <div class="tgme_widget_message_text js-message_text" dir="auto"><b>Inception (2010) 1080p</b><br/>Director&#39;s cut<br/><a href="https://t.me/KinoDeliveryBot?start=inc_1080&amp;src=ch">Get file</a></div>
  </div>
</div>
<div class="tgme_widget_message_wrap js-widget_message_wrap">
  <div class="tgme_widget_message js-widget_message" data-post="kino_hub/102">
    <div class="tgme_widget_message_text js-message_text" dir="auto">Heat 1995 720p WEBRip</div>
  </div>
</div>
"#;

    #[test]
    fn test_parse_channel_page() {
        let records = parse_channel_page(PAGE, "https://t.me", "telegram");
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Inception");
        assert_eq!(records[0].year, Some(2010));
        let bot_link = &records[0].links[0];
        assert!(bot_link.is_bot_link);
        assert_eq!(bot_link.quality, "1080p");
        assert_eq!(
            bot_link.address,
            "https://t.me/KinoDeliveryBot?start=inc_1080&src=ch"
        );

        assert_eq!(records[1].title, "Heat");
        assert!(!records[1].links[0].is_bot_link);
        assert_eq!(records[1].links[0].address, "https://t.me/kino_hub/102");
    }

    #[test]
    fn test_message_text_decodes_entities() {
        let text = message_text("Amelie<br>Le fabuleux destin d&#39;Am&eacute;lie");
        assert_eq!(text, "Amelie\nLe fabuleux destin d'Amélie");
    }

    #[test]
    fn test_requires_channels() {
        let result = TelegramProvider::new(TelegramConfig {
            channels: vec!["  ".to_string()],
            base_url: None,
            settings: ProviderSettings::default(),
        });
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
