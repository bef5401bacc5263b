//! Title, year and quality extraction from scene-style release names.
//!
//! Torrent indexes and channel posts only carry a release name such as
//! `Blade.Runner.2049.2017.1080p.BluRay.x264-GROUP`; adapters run it through
//! [`parse_release_name`] so their records key the same way metadata records do.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Quality label used when a release name carries no recognizable tag.
pub const UNKNOWN_QUALITY: &str = "unknown";

static LEADING_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]*\]\s*").expect("Invalid regex pattern defined in code"));

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("Invalid regex pattern defined in code"));

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|720p|480p|4k|uhd|bluray|blu-ray|brrip|bdrip|webrip|web-dl|webdl|hdtv|hdrip|dvdrip|dvdscr|hdcam|cam|telesync|x264|x265|h264|h265|hevc|xvid|s\d{1,2}e\d{1,3}|s\d{1,2})\b",
    )
    .expect("Invalid regex pattern defined in code")
});

static RESOLUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(2160p|1080p|720p|480p|4k|uhd)\b")
        .expect("Invalid regex pattern defined in code")
});

static SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(hdcam|cam|telesync|ts|dvdscr|dvdrip|hdrip|webrip|web-dl|bdrip|brrip)\b")
        .expect("Invalid regex pattern defined in code")
});

/// Fields recovered from a release name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRelease {
    pub title: String,
    pub year: Option<u32>,
    pub quality: String,
}

/// Split a release name into title, year and quality.
///
/// The year is the last four-digit year found before the first release tag,
/// which keeps titles like "Blade Runner 2049" or "1917" intact.
pub fn parse_release_name(name: &str) -> ParsedRelease {
    let without_group = LEADING_GROUP.replace(name, "");
    let cleaned: String = without_group
        .chars()
        .map(|c| if c == '.' || c == '_' { ' ' } else { c })
        .collect();

    let first_tag = TAG
        .find_iter(&cleaned)
        .find(|m| m.start() > 0)
        .map(|m| m.start());
    let tag_bound = first_tag.unwrap_or(cleaned.len());

    let year_match = YEAR
        .find_iter(&cleaned)
        .filter(|m| m.start() > 0 && m.start() < tag_bound)
        .last();

    let (title_end, year) = match year_match {
        Some(m) => (m.start(), m.as_str().parse().ok()),
        None => (tag_bound, None),
    };

    ParsedRelease {
        title: clean_title(&cleaned[..title_end]),
        year,
        quality: quality_label(name),
    }
}

/// Best-effort quality label for a release name.
pub fn quality_label(name: &str) -> String {
    // '_' is a word character, so tags like "_720p_" need spacing out first.
    let spaced: String = name
        .chars()
        .map(|c| if c == '.' || c == '_' { ' ' } else { c })
        .collect();
    if let Some(m) = RESOLUTION.find(&spaced) {
        let label = m.as_str().to_lowercase();
        return match label.as_str() {
            "4k" | "uhd" => "2160p".to_string(),
            _ => label,
        };
    }
    SOURCE
        .find(&spaced)
        .map(|m| m.as_str().to_uppercase())
        .unwrap_or_else(|| UNKNOWN_QUALITY.to_string())
}

fn clean_title(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '(' | '[' | '-' | '|'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
