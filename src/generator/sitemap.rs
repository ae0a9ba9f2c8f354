//! Sitemap generation.
//!
//! Lists every dated article page for search engine indexing, in the order
//! the articles were discovered.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://swiftonserver.com/getting-started/</loc>
//!     <lastmod>2024-03-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    config::SiteConfig,
    log,
    registry::{SitemapItem, SortedRegistry},
    utils::{
        date::to_ymd,
        fs::write_atomic,
        minify::{Output, compact},
    },
};
use anyhow::{Context, Result};
use std::fmt::Write;

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// ============================================================================
// Public API
// ============================================================================

/// Build the sitemap if enabled in config.
pub fn build_sitemap(config: &SiteConfig, registry: &SortedRegistry) -> Result<()> {
    if config.build.sitemap.enable {
        let sitemap = Sitemap::from_pages(registry.pages());
        sitemap.write(config)?;
    }
    Ok(())
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    /// `YYYY-MM-DD`
    lastmod: String,
}

impl Sitemap {
    fn from_pages(pages: &[SitemapItem]) -> Self {
        let urls = pages
            .iter()
            .map(|page| UrlEntry {
                loc: page.permalink.clone(),
                lastmod: to_ymd(page.lastmod),
            })
            .collect();

        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(128 + self.urls.len() * 96);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let _ = writeln!(xml, r#"<urlset xmlns="{SITEMAP_NS}">"#);

        for entry in self.urls {
            xml.push_str("  <url>\n");
            let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.loc));
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", entry.lastmod);
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn write(self, config: &SiteConfig) -> Result<()> {
        let sitemap_path = config.output_dir().join(&config.build.sitemap.path);
        let count = self.urls.len();
        let xml = self.into_xml();
        let xml = compact(Output::Feed(xml.as_bytes()), config);

        write_atomic(&sitemap_path, &*xml)
            .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

        log!("sitemap"; "{} ({} urls)", sitemap_path.display(), count);
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        fs,
        time::{Duration, UNIX_EPOCH},
    };
    use tempfile::TempDir;

    fn make_page(permalink: &str, days: u64) -> SitemapItem {
        SitemapItem {
            permalink: permalink.to_string(),
            lastmod: UNIX_EPOCH + Duration::from_secs(days * 86400),
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("hello"), "hello");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(
            escape_xml("<a href=\"x\">'y'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&apos;y&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_sitemap_empty() {
        let xml = Sitemap::from_pages(&[]).into_xml();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_sitemap_entry() {
        let xml = Sitemap::from_pages(&[make_page("https://example.com/a?x=1&y=2", 20089)])
            .into_xml();

        assert!(xml.contains("<loc>https://example.com/a?x=1&amp;y=2</loc>"));
        assert!(xml.contains("<lastmod>2025-01-01</lastmod>"));
    }

    #[test]
    fn test_sitemap_keeps_insertion_order() {
        // lastmod deliberately out of order
        let pages = [
            make_page("https://example.com/b/", 20090),
            make_page("https://example.com/a/", 19000),
            make_page("https://example.com/c/", 20100),
        ];
        let xml = Sitemap::from_pages(&pages).into_xml();

        let b = xml.find("/b/").unwrap();
        let a = xml.find("/a/").unwrap();
        let c = xml.find("/c/").unwrap();
        assert!(b < a && a < c);
    }

    #[test]
    fn test_write_minified() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.set_root(dir.path());
        config.build.minify = true;

        Sitemap::from_pages(&[make_page("https://example.com/", 20089)])
            .write(&config)
            .unwrap();

        let written = fs::read_to_string(config.output_dir().join("sitemap.xml")).unwrap();
        assert!(written.contains("<url><loc>https://example.com/</loc><lastmod>2025-01-01</lastmod></url>"));
    }
}
