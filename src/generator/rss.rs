//! RSS feed generation.
//!
//! Turns the sorted post registry into an RSS 2.0 channel.

use crate::{
    config::SiteConfig,
    log,
    registry::{FeedItem, SortedRegistry},
    utils::{
        date::to_rfc2822,
        fs::write_atomic,
        minify::{Output, compact},
    },
};
use anyhow::{Context, Result, anyhow};
use rss::{Channel, ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};

// ============================================================================
// Public API
// ============================================================================

/// Build the RSS feed if enabled in config.
pub fn build_rss(config: &SiteConfig, registry: &SortedRegistry) -> Result<()> {
    if config.build.rss.enable {
        RssFeed::new(config, registry).write()?;
    }
    Ok(())
}

// ============================================================================
// RssFeed Implementation
// ============================================================================

struct RssFeed<'a> {
    config: &'a SiteConfig,
    posts: &'a [FeedItem],
}

impl<'a> RssFeed<'a> {
    fn new(config: &'a SiteConfig, registry: &'a SortedRegistry) -> Self {
        Self {
            config,
            posts: registry.posts(),
        }
    }

    fn channel(&self) -> Channel {
        let base = &self.config.base;
        let items: Vec<_> = self.posts.iter().map(post_to_rss_item).collect();

        ChannelBuilder::default()
            .title(&base.title)
            .link(&base.url)
            .description(&base.description)
            .language(base.language.clone())
            .generator(concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_owned())
            .items(items)
            .build()
    }

    /// Generate the feed document.
    ///
    /// Validation needs absolute links, so a site served from a relative base
    /// URL skips it.
    fn into_xml(self) -> Result<String> {
        let channel = self.channel();
        if self.config.base.has_absolute_url() {
            channel
                .validate()
                .map_err(|e| anyhow!("rss validation failed: {e}"))?;
        }
        Ok(channel.to_string())
    }

    fn write(self) -> Result<()> {
        let config = self.config;
        let count = self.posts.len();
        let xml = self.into_xml()?;
        let xml = compact(Output::Feed(xml.as_bytes()), config);
        let rss_path = config.output_dir().join(&config.build.rss.path);

        write_atomic(&rss_path, &*xml)
            .with_context(|| format!("Failed to write rss feed to {}", rss_path.display()))?;

        log!("rss"; "{} ({} posts)", rss_path.display(), count);
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn post_to_rss_item(post: &FeedItem) -> rss::Item {
    ItemBuilder::default()
        .title(post.title.clone())
        .link(post.permalink.clone())
        .description(post.description.clone())
        .guid(
            GuidBuilder::default()
                .permalink(true)
                .value(post.permalink.clone())
                .build(),
        )
        .pub_date(to_rfc2822(post.date))
        .build()
}
