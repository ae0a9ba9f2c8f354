//! `[build]` section configuration.
//!
//! Contains build settings: paths, minification, the external renderer and
//! the feed outputs.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in site.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "Sources/Site/Documentation.docc"
/// output = "docs"
/// minify = true
///
/// [build.render]
/// timeout = 120
///
/// [build.rss]
/// path = "rss.xml"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content root that is searched for article folders.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory. Wiped at the start of every build.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Directory holding `post.html`, `index.html` and `home.html`.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Static files copied verbatim into the output root.
    #[serde(default = "defaults::build::public")]
    #[educe(Default = defaults::build::public())]
    pub public: PathBuf,

    /// Minify HTML and XML output.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Number of articles rendered concurrently. `1` renders in discovery order
    /// on the calling thread.
    #[serde(default = "defaults::build::jobs")]
    #[educe(Default = defaults::build::jobs())]
    pub jobs: usize,

    /// Let a later article silently replace an earlier one with the same slug
    /// instead of failing the build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub allow_slug_overwrite: bool,

    /// Element ids or class names whose subtree is removed from article pages.
    #[serde(default = "defaults::build::strip")]
    #[educe(Default = defaults::build::strip())]
    pub strip: Vec<String>,

    /// External renderer settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// RSS feed generation settings.
    #[serde(default)]
    pub rss: RssConfig,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.render]` section - the external tool that turns an article folder
/// into `<name>.html`.
///
/// `command` is an argv list. The placeholders `{name}`, `{folder}`,
/// `{output}`, `{account}` and `{api_key}` are substituted per article; the
/// command runs with the article folder as its working directory.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default = "defaults::build::render::command")]
    #[educe(Default = defaults::build::render::command())]
    pub command: Vec<String>,

    /// Seconds to wait for one render before killing it.
    #[serde(default = "defaults::build::render::timeout")]
    #[educe(Default = defaults::build::render::timeout())]
    pub timeout: u64,

    #[serde(default = "defaults::build::render::account_id")]
    #[educe(Default = defaults::build::render::account_id())]
    pub account_id: String,

    /// Only required when at least one article has no cached render.
    #[serde(default = "defaults::build::render::api_key")]
    #[educe(Default = defaults::build::render::api_key())]
    pub api_key: Option<String>,
}

impl RenderConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// `[build.rss]` section - RSS feed generation configuration.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path, relative to the output directory.
    #[serde(default = "defaults::build::rss::path")]
    #[educe(Default = defaults::build::rss::path())]
    pub path: PathBuf,
}

/// `[build.sitemap]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path, relative to the output directory.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,
}
