//! Post registry.
//!
//! Collects one [`FeedItem`] and one [`SitemapItem`] per dated article while
//! the build runs. The assembler owns the registry, appends outcomes in
//! discovery order, and converts it into a [`SortedRegistry`] exactly once
//! after every article has finished. Feeds and the home page only accept the
//! sorted form, so none of them can observe a partially built registry.

use crate::{article::ArticleOutcome, log};
use chrono::NaiveDate;
use serde::Serialize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
    time::SystemTime,
};
use thiserror::Error;

// ============================================================================
// Items
// ============================================================================

/// One post as it appears on the home page and in the RSS feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub permalink: String,
    #[serde(skip)]
    pub date: NaiveDate,
    /// Front-matter date, verbatim.
    pub date_string: String,
}

/// One page entry in the sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapItem {
    pub permalink: String,
    /// Modification time of the article's Markdown source.
    pub lastmod: SystemTime,
}

// ============================================================================
// Registry
// ============================================================================

/// Registry being filled during a build.
#[derive(Debug, Default)]
pub struct PostRegistry {
    posts: Vec<FeedItem>,
    pages: Vec<SitemapItem>,
}

impl PostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the entries of one successfully written article.
    ///
    /// Undated articles carry no entries and leave the registry unchanged.
    pub fn push(&mut self, outcome: &ArticleOutcome) {
        if let Some(item) = &outcome.feed {
            self.posts.push(item.clone());
        }
        if let Some(page) = &outcome.sitemap {
            self.pages.push(page.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Sort posts newest first. Posts sharing a date keep discovery order;
    /// sitemap pages keep discovery order regardless of date.
    pub fn into_sorted(mut self) -> SortedRegistry {
        self.posts.sort_by(|a, b| b.date.cmp(&a.date));
        SortedRegistry {
            posts: self.posts,
            pages: self.pages,
        }
    }
}

/// Registry after the final sort. Read-only.
#[derive(Debug, Default)]
pub struct SortedRegistry {
    posts: Vec<FeedItem>,
    pages: Vec<SitemapItem>,
}

impl SortedRegistry {
    /// Posts, newest first.
    pub fn posts(&self) -> &[FeedItem] {
        &self.posts
    }

    /// Sitemap pages, in discovery order.
    pub fn pages(&self) -> &[SitemapItem] {
        &self.pages
    }
}

// ============================================================================
// Slug claims
// ============================================================================

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("slug `{slug}` is used by both {} and {}", .first.display(), .second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Records which article folder owns each output slug.
///
/// Shared by every article of one build; claiming happens before an article
/// writes anything under `<output>/<slug>/`.
#[derive(Debug)]
pub struct SlugClaims {
    owners: Mutex<HashMap<String, PathBuf>>,
    allow_overwrite: bool,
}

impl SlugClaims {
    pub fn new(allow_overwrite: bool) -> Self {
        Self {
            owners: Mutex::new(HashMap::new()),
            allow_overwrite,
        }
    }

    /// Claim `slug` for `folder`.
    ///
    /// A second claim fails with [`RegistryError::DuplicateSlug`] unless
    /// overwriting is allowed, in which case the later folder takes over the
    /// slug and a warning is logged.
    pub fn claim(&self, slug: &str, folder: &Path) -> Result<(), RegistryError> {
        // Poisoning leaves the map consistent.
        let mut owners = self
            .owners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(first) = owners.get(slug) {
            if !self.allow_overwrite {
                return Err(RegistryError::DuplicateSlug {
                    slug: slug.to_owned(),
                    first: first.clone(),
                    second: folder.to_path_buf(),
                });
            }
            log!(
                "warn";
                "{} overwrites {} at slug `{}`",
                folder.display(),
                first.display(),
                slug
            );
        }
        owners.insert(slug.to_owned(), folder.to_path_buf());
        Ok(())
    }
}
