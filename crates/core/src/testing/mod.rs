//! Testing utilities and mock implementations.
//!
//! Mocks stand in for upstream providers and the master title lookup so the
//! engine can be exercised end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelhound_core::testing::{fixtures, MockProvider};
//!
//! let yts = Arc::new(MockProvider::new("yts").with_priority(10));
//! yts.set_records(fixtures::inception_records()).await;
//! yts.set_delay(Duration::from_secs(30)).await;
//!
//! // Register with a ProviderRegistry or pass straight to Engine::new...
//! ```

mod mock_master;
mod mock_provider;

pub use mock_master::MockMasterResolver;
pub use mock_provider::MockProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::model::{Link, RawRecord};

    /// A torrent link whose address is derived from its quality.
    ///
    /// Two links with the same quality share a signature, so they collapse
    /// into one when a title is deduplicated.
    pub fn torrent_link(quality: &str, seeds: u32, source: &str) -> Link {
        Link::new(
            quality,
            "1 GB",
            seeds,
            format!("magnet:?xt=urn:btih:{}", quality),
            source,
        )
    }

    /// A chat bot deep link.
    pub fn bot_link(quality: &str, source: &str) -> Link {
        Link::new(
            quality,
            "N/A",
            0,
            format!("https://t.me/movie_bot?start={}", quality),
            source,
        )
        .bot()
    }

    /// A search-page placeholder from `site`.
    pub fn search_link(site: &str) -> Link {
        Link::search_placeholder(format!("https://{}.example/search?q=heat", site), site)
    }

    /// Two records describing Inception (2010), as two providers report it.
    ///
    /// The first carries a rating and one 720p link; the second has no
    /// rating, a lowercased title, the same 720p link and a 1080p one.
    pub fn inception_records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("Inception", "x")
                .with_year(Some(2010))
                .with_rating(Some(8.8))
                .with_links(vec![torrent_link("720p", 50, "x")]),
            RawRecord::new("inception", "y")
                .with_year(Some(2010))
                .with_links(vec![
                    torrent_link("720p", 50, "y"),
                    torrent_link("1080p", 200, "y"),
                ]),
        ]
    }
}
