//! Merging of provider records into canonical titles.

use std::collections::{HashMap, HashSet};

use crate::model::{clamp_rating, Link, RawRecord, Title};

/// Merge records into titles, one per identity key.
///
/// Records are folded in arrival order: the first record seen for a key
/// creates the title, later ones add their links (deduplicated by
/// signature, first occurrence wins) and fill fields the title is still
/// missing. Output order is first-appearance order. Records whose title is
/// blank are dropped.
pub fn merge(records: Vec<RawRecord>) -> Vec<Title> {
    let mut titles: Vec<Title> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for mut record in records {
        if record.title.trim().is_empty() {
            continue;
        }

        let key = record.key();
        let links = std::mem::take(&mut record.links);
        let source = record.source.clone();

        let idx = match by_key.get(&key) {
            Some(&idx) => {
                fill_missing(&mut titles[idx], record);
                idx
            }
            None => {
                titles.push(Title::from(record));
                by_key.insert(key, titles.len() - 1);
                titles.len() - 1
            }
        };

        let title = &mut titles[idx];
        append_links(&mut title.links, links);
        title.add_provider(&source);
    }

    titles
}

/// Append `new` to `links`, skipping any whose signature is already present.
pub fn append_links(links: &mut Vec<Link>, new: Vec<Link>) {
    let mut seen: HashSet<_> = links.iter().map(Link::signature).collect();
    for link in new {
        if seen.insert(link.signature()) {
            links.push(link);
        }
    }
}

/// Deduplicate a link list by signature, keeping first occurrences.
pub fn dedup_links(links: Vec<Link>) -> Vec<Link> {
    let mut out = Vec::with_capacity(links.len());
    append_links(&mut out, links);
    out
}

fn fill_missing(title: &mut Title, record: RawRecord) {
    if is_blank(&title.original_title) {
        title.original_title = record.original_title.filter(|s| !s.trim().is_empty());
    }
    if title.rating.is_none() {
        title.rating = clamp_rating(record.rating);
    }
    if is_blank(&title.poster) {
        title.poster = record.poster.filter(|s| !s.trim().is_empty());
    }
    if is_blank(&title.synopsis) {
        title.synopsis = record.synopsis.filter(|s| !s.trim().is_empty());
    }
    if title.genres.is_empty() {
        title.genres = record.genres;
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}
