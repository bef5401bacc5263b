//! Canonical data model shared by providers and the engine.

mod descriptor;
mod link;
mod query;
mod title;

pub use descriptor::{Capability, ProviderDescriptor};
pub use link::{
    format_size, has_usable_links, magnet_uri, Link, LinkSignature, SEARCH_ONLY_QUALITY,
    UNKNOWN_SIZE,
};
pub use query::Query;
pub use title::{clamp_rating, identity_key, normalize_title, RawRecord, Title};
