//! Feeds derived from the sorted post registry.

pub mod rss;
pub mod sitemap;

pub use rss::build_rss;
pub use sitemap::build_sitemap;
