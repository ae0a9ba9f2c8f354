//! Compact serialization of generated pages and feeds.
//!
//! Every article page, the home page, `rss.xml` and `sitemap.xml` pass
//! through [`compact`] right before they are written. With `[build].minify`
//! off the bytes are returned untouched.

use crate::config::SiteConfig;
use std::borrow::Cow;

/// A generated document about to be written to the output directory.
pub enum Output<'a> {
    /// Article or home page
    Page(&'a [u8]),
    /// RSS channel or sitemap
    Feed(&'a [u8]),
}

/// Strip insignificant whitespace from `output` when `[build].minify` is on.
pub fn compact<'a>(output: Output<'a>, config: &SiteConfig) -> Cow<'a, [u8]> {
    match (output, config.build.minify) {
        (Output::Page(bytes) | Output::Feed(bytes), false) => Cow::Borrowed(bytes),
        (Output::Page(page), true) => Cow::Owned(compact_page(page)),
        (Output::Feed(feed), true) => Cow::Owned(compact_feed(feed)),
    }
}

/// Closing tags and the `<html>`/`<head>` openers survive, so the stripped
/// page is still well-formed for anything that re-reads it.
fn compact_page(page: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    minify_html::minify(page, &cfg)
}

/// Joins the trimmed lines of a feed, dropping its indentation.
fn compact_feed(feed: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(feed)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<String>()
        .into_bytes()
}
