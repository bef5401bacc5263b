//! Deterministic ordering of titles and links.
//!
//! Both sorts are stable: equal keys keep their incoming order.

use std::cmp::Ordering;

use crate::model::{Link, Title};

/// Sort titles by rating, highest first (unrated counts as 0), then rank
/// each title's links.
pub fn rank_titles(titles: &mut [Title]) {
    titles.sort_by(|a, b| {
        b.sort_rating()
            .partial_cmp(&a.sort_rating())
            .unwrap_or(Ordering::Equal)
    });
    for title in titles.iter_mut() {
        rank_links(&mut title.links);
    }
}

/// Sort links with bot links first, then by seeds, highest first.
pub fn rank_links(links: &mut [Link]) {
    links.sort_by(|a, b| {
        b.is_bot_link
            .cmp(&a.is_bot_link)
            .then_with(|| b.seeds.cmp(&a.seeds))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawRecord;
    use crate::testing::fixtures;

    fn title(name: &str, rating: Option<f32>) -> Title {
        Title::from(RawRecord::new(name, "p").with_rating(rating))
    }

    fn names(titles: &[Title]) -> Vec<&str> {
        titles.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_titles_by_rating_descending() {
        let mut titles = vec![
            title("Low", Some(5.0)),
            title("High", Some(9.0)),
            title("Mid", Some(7.5)),
        ];
        rank_titles(&mut titles);
        assert_eq!(names(&titles), vec!["High", "Mid", "Low"]);
    }

    #[test]
    fn test_unrated_titles_sort_last() {
        let mut titles = vec![
            title("Unrated", None),
            title("Rated", Some(0.5)),
            title("AlsoUnrated", None),
        ];
        rank_titles(&mut titles);
        assert_eq!(names(&titles), vec!["Rated", "Unrated", "AlsoUnrated"]);
    }

    #[test]
    fn test_title_sort_is_stable() {
        let mut titles = vec![
            title("A", Some(7.0)),
            title("B", Some(8.0)),
            title("C", Some(7.0)),
            title("D", Some(7.0)),
        ];
        rank_titles(&mut titles);
        assert_eq!(names(&titles), vec!["B", "A", "C", "D"]);

        let once = titles.clone();
        rank_titles(&mut titles);
        assert_eq!(titles, once);
    }

    #[test]
    fn test_bot_links_first_then_seeds() {
        let mut links = vec![
            fixtures::torrent_link("720p", 50, "a"),
            fixtures::bot_link("1080p", "telegram"),
            fixtures::torrent_link("1080p", 200, "a"),
            fixtures::torrent_link("480p", 0, "a"),
        ];
        rank_links(&mut links);

        assert!(links[0].is_bot_link);
        let seeds: Vec<_> = links[1..].iter().map(|l| l.seeds).collect();
        assert_eq!(seeds, vec![200, 50, 0]);
    }

    #[test]
    fn test_link_sort_is_stable() {
        let mut links = vec![
            fixtures::torrent_link("720p", 10, "first"),
            fixtures::torrent_link("1080p", 10, "second"),
        ];
        rank_links(&mut links);
        assert_eq!(links[0].source, "first");
        assert_eq!(links[1].source, "second");
    }
}
