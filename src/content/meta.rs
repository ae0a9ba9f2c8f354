//! Article front-matter.
//!
//! [`ArticleMetadata`] is what `metadata.yml` deserializes into. The derived
//! fields (tag list, rendered contents, permalink) live on [`Article`], which
//! can only be assembled once the rendered HTML has been read, so nothing can
//! observe them before the article renderer fills them in.
//!
//! # `metadata.yml`
//!
//! ```yaml
//! slug: getting-started
//! title: Getting Started
//! description: Set up a server project
//! date: 2024/03/01
//! tags: swift, server
//! author: Jane Doe
//! authorLink: https://example.com/jane
//! ```

use crate::utils::date::parse_article_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

/// Name of the front-matter file inside every article folder.
pub const METADATA_FILE: &str = "metadata.yml";

/// Errors produced while reading or validating `metadata.yml`.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read metadata")]
    Io(#[from] std::io::Error),

    #[error("malformed metadata")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid slug `{0}`: must be a single non-empty path segment")]
    InvalidSlug(String),
}

/// One article's front-matter, as written in `metadata.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    /// URL path segment; unique within a build.
    pub slug: String,
    pub title: String,
    pub description: String,
    /// `yyyy/MM/dd`, kept verbatim for display.
    pub date: String,
    /// Raw comma-separated tags, see [`tag_list`].
    pub tags: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_link: String,
    #[serde(default)]
    pub author_github: String,
    #[serde(default)]
    pub author_about: String,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub cta_link: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub company_link: String,
    #[serde(default)]
    pub duration: String,
}

impl ArticleMetadata {
    /// Parse and validate front-matter from YAML text.
    pub fn from_yaml(input: &str) -> Result<Self, MetadataError> {
        let meta: Self = serde_yaml::from_str(input)?;
        meta.validate()?;
        Ok(meta)
    }

    /// Read `metadata.yml` from an article folder.
    pub fn from_folder(folder: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(folder.join(METADATA_FILE))?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<(), MetadataError> {
        let slug = self.slug.as_str();
        let invalid = slug.trim().is_empty()
            || slug.contains(['/', '\\'])
            || slug == "."
            || slug == "..";
        if invalid {
            return Err(MetadataError::InvalidSlug(self.slug.clone()));
        }
        Ok(())
    }

    /// The front-matter date, if it matches `yyyy/MM/dd`.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_article_date(&self.date)
    }
}

/// Split raw tags on commas and trim each piece.
///
/// Empty pieces are kept, so `""` yields `[""]` and `"a,,b"` yields
/// `["a", "", "b"]`.
pub fn tag_list(tags: &str) -> Vec<String> {
    tags.split(',').map(|tag| tag.trim().to_owned()).collect()
}

/// `base_url + slug + "/"`.
pub fn permalink(base_url: &str, slug: &str) -> String {
    format!("{base_url}{slug}/")
}

/// An article after rendering: front-matter plus the derived fields.
///
/// Serializes flat (metadata keys next to `tagList`, `contents` and
/// `permalink`) so templates see a single record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(flatten)]
    pub meta: ArticleMetadata,
    pub tag_list: Vec<String>,
    pub contents: String,
    pub permalink: String,
}

impl Article {
    pub fn new(meta: ArticleMetadata, contents: String, base_url: &str) -> Self {
        Self {
            tag_list: tag_list(&meta.tags),
            permalink: permalink(base_url, &meta.slug),
            contents,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
slug: getting-started
title: Getting Started
description: Set up a server project
date: 2024/03/01
tags: swift, server ,nio
author: Jane Doe
authorLink: https://example.com/jane
authorGithub: jane
authorAbout: Writes code
cta: Hire us
ctaLink: https://example.com/hire
company: Example
companyLink: https://example.com
duration: 15 min
"#;

    #[test]
    fn test_parse_full_metadata() {
        let meta = ArticleMetadata::from_yaml(FULL).unwrap();

        assert_eq!(meta.slug, "getting-started");
        assert_eq!(meta.date, "2024/03/01");
        assert_eq!(meta.author_link, "https://example.com/jane");
        assert_eq!(meta.author_github, "jane");
        assert_eq!(meta.cta_link, "https://example.com/hire");
        assert_eq!(meta.company_link, "https://example.com");
        assert_eq!(meta.duration, "15 min");
        assert_eq!(meta.parsed_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let meta = ArticleMetadata::from_yaml(
            "slug: a\ntitle: A\ndescription: d\ndate: 2024/01/01\ntags: x\n",
        )
        .unwrap();

        assert_eq!(meta.author, "");
        assert_eq!(meta.cta, "");
        assert_eq!(meta.duration, "");
    }

    #[test]
    fn test_missing_required_field() {
        let err = ArticleMetadata::from_yaml("slug: a\ntitle: A\ndate: 2024/01/01\ntags: x\n")
            .unwrap_err();
        assert!(matches!(err, MetadataError::Yaml(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = ArticleMetadata::from_yaml("slug: [unterminated").unwrap_err();
        assert!(matches!(err, MetadataError::Yaml(_)));
    }

    #[test]
    fn test_invalid_slugs() {
        for slug in ["\"\"", "a/b", "..", "'a\\b'", "\" \""] {
            let yaml = format!("slug: {slug}\ntitle: A\ndescription: d\ndate: x\ntags: x\n");
            let err = ArticleMetadata::from_yaml(&yaml).unwrap_err();
            assert!(matches!(err, MetadataError::InvalidSlug(_)), "slug {slug}");
        }
    }

    #[test]
    fn test_unparsable_date_is_none() {
        let meta = ArticleMetadata::from_yaml(
            "slug: a\ntitle: A\ndescription: d\ndate: not-a-date\ntags: x\n",
        )
        .unwrap();
        assert_eq!(meta.parsed_date(), None);
    }

    #[test]
    fn test_tag_list_trims_each_piece() {
        assert_eq!(tag_list("a, b ,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tag_list_empty_string_yields_one_empty_tag() {
        // Splitting an empty string on commas produces a single empty piece,
        // which is kept rather than filtered out.
        assert_eq!(tag_list(""), vec![""]);
    }

    #[test]
    fn test_tag_list_keeps_empty_pieces() {
        assert_eq!(tag_list("a,,b"), vec!["a", "", "b"]);
        assert_eq!(tag_list(" , "), vec!["", ""]);
    }

    #[test]
    fn test_permalink() {
        assert_eq!(
            permalink("https://swiftonserver.com/", "getting-started"),
            "https://swiftonserver.com/getting-started/"
        );
        assert_eq!(permalink("/", "a"), "/a/");
    }

    #[test]
    fn test_article_serializes_flat() {
        let meta = ArticleMetadata::from_yaml(FULL).unwrap();
        let article = Article::new(meta, "<p>x</p>".into(), "https://example.com/");
        let value = serde_yaml::to_value(&article).unwrap();

        assert_eq!(value["slug"].as_str(), Some("getting-started"));
        assert_eq!(value["authorLink"].as_str(), Some("https://example.com/jane"));
        assert_eq!(value["contents"].as_str(), Some("<p>x</p>"));
        assert_eq!(
            value["permalink"].as_str(),
            Some("https://example.com/getting-started/")
        );
        assert_eq!(value["tagList"][1].as_str(), Some("server"));
    }
}
