//! `[base]` section configuration.
//!
//! Contains basic site information used by every page and both feeds.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in site.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "Swift on Server"
/// description = "Tutorials about server-side Swift"
/// url = "https://swiftonserver.com/"
/// language = "en"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title, used for the home page and the rss channel.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,

    /// Site description for the home page and the rss channel.
    #[serde(default)]
    pub description: String,

    /// Base URL every permalink is built from. Expected to end with `/`.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: String,

    /// BCP 47 language code (e.g., "en", "en-US").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,
}

impl BaseConfig {
    /// Whether `url` is an absolute http(s) URL rather than a path prefix.
    pub fn has_absolute_url(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}
