//! Article renderer.
//!
//! Builds one article folder into `<output>/<slug>/index.html`:
//!
//! 1. ensure `<name>.html` exists (external render, skipped when cached)
//! 2. read `metadata.yml`
//! 3. claim the slug and create `<output>/<slug>/`
//! 4. copy `images/` and `cover.jpg` into `<output>/images/assets/<slug>/`
//! 5. derive the tag list and read the rendered contents
//! 6. derive the permalink
//! 7. render `post.html` inside `index.html`
//! 8. strip marked elements and minify
//! 9. write the page
//! 10. produce feed and sitemap entries when the date parses
//!
//! Nothing is appended to the registry here. The caller receives an
//! [`ArticleOutcome`] and decides the order entries are added in.

use crate::{
    config::SiteConfig,
    content::{Article, ArticleFolder, ArticleMetadata, MetadataError},
    log,
    registry::{FeedItem, RegistryError, SitemapItem, SlugClaims},
    render::{RenderError, Rendered, Renderer, ensure_rendered},
    template::{INDEX_TEMPLATE, POST_TEMPLATE, Templates, html},
    utils::{
        fs::{copy_dir, copy_file, modified, write_file},
        html::strip_elements,
        minify::{Output, compact},
    },
};
use anyhow::Context;
use minijinja::{Value, context};
use serde::Serialize;
use std::{fs, path::PathBuf};
use thiserror::Error;

/// Asset directory for `slug`, relative to the output root.
pub fn assets_dir(slug: &str) -> PathBuf {
    PathBuf::from("images").join("assets").join(slug)
}

/// Shared, read-only inputs of every article in one build.
pub struct ArticleContext<'a> {
    pub config: &'a SiteConfig,
    pub templates: &'a Templates,
    pub renderer: &'a dyn Renderer,
    pub claims: &'a SlugClaims,
    /// Output root, already wiped and recreated.
    pub output: PathBuf,
}

/// Result of one article written to disk.
#[derive(Debug, Clone)]
pub struct ArticleOutcome {
    pub rendered: Rendered,
    /// `None` when the front-matter date does not parse.
    pub feed: Option<FeedItem>,
    pub sitemap: Option<SitemapItem>,
}

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("invalid metadata")]
    Metadata(#[from] MetadataError),

    #[error("external render failed")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Slug(#[from] RegistryError),

    #[error("failed to render template `{name}`")]
    Template {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },

    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

impl ArticleError {
    /// Whether this error must abort the whole build.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Slug(_))
    }

    /// Whether the article is skipped rather than counted as failed.
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Metadata(_))
    }
}

/// Build one article folder.
pub fn render_article(
    folder: &ArticleFolder,
    ctx: &ArticleContext<'_>,
) -> Result<ArticleOutcome, ArticleError> {
    let config = ctx.config;
    let base_url = config.base.url.as_str();

    // 1. Rendered HTML
    let rendered = ensure_rendered(folder, ctx.renderer, config.build.render.timeout())?;
    if rendered.is_cached() {
        log!(
            "skip";
            "{} is already rendered, remove {}.html to render again",
            folder.name,
            folder.name
        );
    } else {
        log!("render"; "{}", folder.name);
    }

    // 2. Metadata
    let meta = ArticleMetadata::from_folder(&folder.path)?;
    let slug = meta.slug.clone();

    // 3. Page directory
    ctx.claims.claim(&slug, &folder.path)?;
    let page_dir = ctx.output.join(&slug);
    fs::create_dir_all(&page_dir)
        .with_context(|| format!("Failed to create {}", page_dir.display()))?;

    // 4. Assets
    let has_cover = copy_assets(folder, &ctx.output.join(assets_dir(&slug)))?;

    // 5-6. Derived fields
    let contents = fs::read_to_string(rendered.path())
        .with_context(|| format!("Failed to read {}", rendered.path().display()))?;
    let article = Article::new(meta, contents, base_url);

    // 7. Templates
    let cover = if has_cover {
        format!("{base_url}{}/cover.jpg", assets_url(&slug))
    } else {
        String::new()
    };
    let page = render_page(ctx.templates, &article, base_url, &cover)?;

    // 8. Post-processing
    let page = match strip_elements(page.as_bytes(), &config.build.strip) {
        Ok(stripped) => stripped,
        Err(e) => {
            log!("warn"; "{}: kept page unstripped: {:#}", folder.path.display(), e);
            page.into_bytes()
        }
    };
    let page = compact(Output::Page(&page), config);

    // 9. Write
    write_file(&page_dir.join("index.html"), &page)?;

    // 10. Registry entries
    let (feed, sitemap) = match article.meta.parsed_date() {
        Some(date) => {
            let lastmod = modified(&folder.markdown())?;
            let feed = FeedItem {
                title: article.meta.title.clone(),
                description: article.meta.description.clone(),
                permalink: article.permalink.clone(),
                date,
                date_string: article.meta.date.clone(),
            };
            let sitemap = SitemapItem {
                permalink: article.permalink.clone(),
                lastmod,
            };
            (Some(feed), Some(sitemap))
        }
        None => {
            log!(
                "warn";
                "{}: date `{}` is not yyyy/MM/dd, left out of feeds",
                folder.metadata().display(),
                article.meta.date
            );
            (None, None)
        }
    };

    Ok(ArticleOutcome {
        rendered,
        feed,
        sitemap,
    })
}

/// `images/assets/<slug>` as a URL path.
fn assets_url(slug: &str) -> String {
    format!("images/assets/{slug}")
}

/// Copy the optional `images/` folder and `cover.jpg`. Returns whether a
/// cover was copied.
fn copy_assets(folder: &ArticleFolder, dest: &std::path::Path) -> anyhow::Result<bool> {
    let images = folder.images();
    if images.is_dir() {
        copy_dir(&images, &dest.join("images"))?;
    }

    let cover = folder.cover();
    let has_cover = cover.is_file();
    if has_cover {
        copy_file(&cover, &dest.join("cover.jpg"))?;
    }
    Ok(has_cover)
}

/// Data seen by `post.html`: the front-matter keys plus the derived fields.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostContext<'a> {
    base_url: &'a str,
    #[serde(flatten)]
    meta: &'a ArticleMetadata,
    tag_list: &'a [String],
    permalink: &'a str,
    contents: Value,
}

/// Render the article body and wrap it in the page template.
fn render_page(
    templates: &Templates,
    article: &Article,
    base_url: &str,
    cover: &str,
) -> Result<String, ArticleError> {
    let post = templates
        .render(
            POST_TEMPLATE,
            PostContext {
                base_url,
                meta: &article.meta,
                tag_list: &article.tag_list,
                permalink: &article.permalink,
                contents: html(article.contents.as_str()),
            },
        )
        .map_err(|source| ArticleError::Template {
            name: POST_TEMPLATE,
            source,
        })?;

    templates
        .render(
            INDEX_TEMPLATE,
            context! {
                baseUrl => base_url,
                title => &article.meta.title,
                description => &article.meta.description,
                permalink => &article.permalink,
                cover => cover,
                contents => html(post),
            },
        )
        .map_err(|source| ArticleError::Template {
            name: INDEX_TEMPLATE,
            source,
        })
}
