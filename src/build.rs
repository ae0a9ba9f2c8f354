//! Site building orchestration.
//!
//! # Pipeline
//!
//! ```text
//! build_site()
//!     │
//!     ├── Templates::load()        fatal on failure
//!     ├── recreate_dir(output)     fatal on failure
//!     ├── copy public/             fatal on failure
//!     │
//!     ├── discover(content)        unreadable subtrees are logged and skipped
//!     ├── render_article() × N     sequential, or on a rayon pool
//!     │       └── outcomes appended to PostRegistry in discovery order
//!     │
//!     ├── PostRegistry::into_sorted()
//!     ├── write_home()             fatal on failure
//!     └── build_rss() / build_sitemap()
//! ```

use crate::{
    article::{ArticleContext, ArticleError, ArticleOutcome, render_article},
    config::SiteConfig,
    content::{ArticleFolder, discover},
    generator::{build_rss, build_sitemap},
    log,
    registry::{PostRegistry, SlugClaims, SortedRegistry},
    render::Renderer,
    template::{HOME_TEMPLATE, INDEX_TEMPLATE, Templates, html},
    utils::{
        fs::{copy_dir, recreate_dir, write_file},
        minify::{Output, compact},
    },
};
use anyhow::{Context, Result};
use minijinja::context;
use rayon::prelude::*;
use std::{fmt, path::Path};

/// Per-article tallies of one build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    /// Pages written after a fresh external render.
    pub rendered: usize,
    /// Pages written from a render left by an earlier run.
    pub cached: usize,
    /// Articles left out because of unreadable metadata.
    pub skipped: usize,
    /// Articles whose render, templates or writes failed.
    pub failed: usize,
    /// Posts in the feeds.
    pub posts: usize,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rendered, {} cached, {} skipped, {} failed, {} in feeds",
            self.rendered, self.cached, self.skipped, self.failed, self.posts
        )
    }
}

/// Build the whole site into the configured output directory.
pub fn build_site(config: &SiteConfig, renderer: &dyn Renderer) -> Result<BuildReport> {
    let templates = Templates::load(&config.templates_dir())?;

    let output = config.output_dir();
    recreate_dir(&output)?;
    copy_public(&config.public_dir(), &output)?;

    let folders = collect_folders(&config.content_dir());
    log!("build"; "found {} articles", folders.len());

    let claims = SlugClaims::new(config.build.allow_slug_overwrite);
    let ctx = ArticleContext {
        config,
        templates: &templates,
        renderer,
        claims: &claims,
        output: output.clone(),
    };
    let results = render_articles(&folders, &ctx, config.build.jobs)?;

    let mut report = BuildReport::default();
    let mut registry = PostRegistry::new();
    for (folder, result) in folders.iter().zip(results) {
        match result {
            Ok(outcome) => {
                if outcome.rendered.is_cached() {
                    report.cached += 1;
                } else {
                    report.rendered += 1;
                }
                registry.push(&outcome);
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                let path = if e.is_skip() {
                    report.skipped += 1;
                    folder.metadata()
                } else {
                    report.failed += 1;
                    folder.path.clone()
                };
                log!("error"; "{}: {:#}", path.display(), anyhow::Error::new(e));
            }
        }
    }
    report.posts = registry.len();

    let registry = registry.into_sorted();
    write_home(config, &templates, &registry, &output)?;
    build_rss(config, &registry)?;
    build_sitemap(config, &registry)?;

    if report.failed > 0 {
        log!("warn"; "{}", report);
    } else {
        log!("build"; "{}", report);
    }
    Ok(report)
}

/// Copy the static public folder into the output root, if there is one.
fn copy_public(public: &Path, output: &Path) -> Result<()> {
    if !public.is_dir() {
        return Ok(());
    }
    let copied = copy_dir(public, output)
        .with_context(|| format!("Failed to copy public folder {}", public.display()))?;
    log!("public"; "copied {} files", copied);
    Ok(())
}

/// Walk the content root, logging subtrees that could not be read.
fn collect_folders(content: &Path) -> Vec<ArticleFolder> {
    discover(content)
        .filter_map(|result| {
            result
                .map_err(|e| {
                    let path = e.path().unwrap_or(content).to_path_buf();
                    log!("error"; "failed to discover {}: {}", path.display(), e);
                })
                .ok()
        })
        .collect()
}

/// Render every folder, returning results in the same order as `folders`.
///
/// With one job the articles are built one after another on this thread and
/// the first fatal error stops the walk. With more, they are built on a
/// dedicated pool and every result is collected before returning.
fn render_articles(
    folders: &[ArticleFolder],
    ctx: &ArticleContext<'_>,
    jobs: usize,
) -> Result<Vec<Result<ArticleOutcome, ArticleError>>> {
    if jobs <= 1 {
        let mut results = Vec::with_capacity(folders.len());
        for folder in folders {
            let result = render_article(folder, ctx);
            let fatal = matches!(&result, Err(e) if e.is_fatal());
            results.push(result);
            if fatal {
                break;
            }
        }
        return Ok(results);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to start render pool")?;
    Ok(pool.install(|| {
        folders
            .par_iter()
            .map(|folder| render_article(folder, ctx))
            .collect()
    }))
}

/// Render `home.html` with the sorted posts, wrapped in `index.html`.
fn write_home(
    config: &SiteConfig,
    templates: &Templates,
    registry: &SortedRegistry,
    output: &Path,
) -> Result<()> {
    let base = &config.base;

    let list = templates
        .render(
            HOME_TEMPLATE,
            context! {
                baseUrl => &base.url,
                title => &base.title,
                description => &base.description,
                posts => registry.posts(),
            },
        )
        .with_context(|| format!("Failed to render {HOME_TEMPLATE}"))?;

    let page = templates
        .render(
            INDEX_TEMPLATE,
            context! {
                baseUrl => &base.url,
                title => &base.title,
                description => &base.description,
                permalink => &base.url,
                cover => "",
                contents => html(list),
            },
        )
        .with_context(|| format!("Failed to render home page with {INDEX_TEMPLATE}"))?;

    let page = compact(Output::Page(page.as_bytes()), config);
    write_file(&output.join("index.html"), &page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        article::tests::{write_article, write_templates},
        render::{RenderError, tests::FakeRenderer},
    };
    use std::{fs, path::PathBuf, time::Duration};
    use tempfile::TempDir;

    struct Site {
        _dir: TempDir,
        config: SiteConfig,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = SiteConfig::default();
            config.set_root(dir.path());
            config.base.title = "Site".into();
            config.base.url = "https://example.com/".into();
            config.build.minify = false;
            write_templates(&config.templates_dir());
            fs::create_dir_all(config.content_dir()).unwrap();
            Self { _dir: dir, config }
        }

        fn article(&self, rel: &str, slug: &str, date: &str) -> ArticleFolder {
            write_article(&self.config.content_dir(), rel, slug, date)
        }

        fn output(&self, rel: &str) -> PathBuf {
            self.config.output_dir().join(rel)
        }

        fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.output(rel)).unwrap()
        }
    }

    /// Fails for folders with the given name, renders everything else.
    struct FailingFor(&'static str, FakeRenderer);

    impl Renderer for FailingFor {
        fn render(&self, folder: &ArticleFolder, timeout: Duration) -> Result<PathBuf, RenderError> {
            if folder.name == self.0 {
                return Err(RenderError::MissingCredentials);
            }
            self.1.render(folder, timeout)
        }
    }

    #[test]
    fn test_full_build() {
        let site = Site::new();
        site.article("a-jan", "jan", "2024/01/01");
        site.article("nested/b-mar", "mar", "2024/03/01");
        site.article("nested/c-feb", "feb", "2024/02/01");
        site.article("d-undated", "undated", "not-a-date");
        let broken = site.article("e-broken", "broken", "2024/01/01");
        fs::write(broken.metadata(), "title: no slug").unwrap();
        let public = site.config.public_dir();
        fs::create_dir_all(public.join("css")).unwrap();
        fs::write(public.join("css/site.css"), "body{}").unwrap();
        let renderer = FakeRenderer::new("<p>body</p>");

        let report = build_site(&site.config, &renderer).unwrap();

        assert_eq!(
            report,
            BuildReport {
                rendered: 4,
                cached: 0,
                skipped: 1,
                failed: 0,
                posts: 3,
            }
        );
        // Broken metadata is only detected after rendering.
        assert_eq!(renderer.calls(), 5);

        for slug in ["jan", "mar", "feb", "undated"] {
            assert!(site.output(&format!("{slug}/index.html")).is_file(), "{slug}");
        }
        assert!(!site.output("broken").exists());
        assert_eq!(site.read("css/site.css"), "body{}");

        let home = site.read("index.html");
        assert!(home.contains("<li>Title mar</li><li>Title feb</li><li>Title jan</li>"));
        assert!(!home.contains("undated"));

        let rss = site.read("rss.xml");
        assert_eq!(rss.matches("<item>").count(), 3);
        assert!(!rss.contains("undated"));

        let sitemap = site.read("sitemap.xml");
        let jan = sitemap.find("/jan/").unwrap();
        let mar = sitemap.find("/mar/").unwrap();
        let feb = sitemap.find("/feb/").unwrap();
        assert!(jan < mar && mar < feb);
        assert!(!sitemap.contains("/undated/"));
    }

    #[test]
    fn test_output_is_wiped_and_renders_are_reused() {
        let site = Site::new();
        let folder = site.article("post", "post", "2024/01/01");
        fs::write(folder.rendered(), "<p>cached</p>").unwrap();
        fs::create_dir_all(site.config.output_dir()).unwrap();
        fs::write(site.output("stale.txt"), "old").unwrap();
        let renderer = FakeRenderer::new("<p>fresh</p>");

        let report = build_site(&site.config, &renderer).unwrap();

        assert_eq!(report.cached, 1);
        assert_eq!(renderer.calls(), 0);
        assert!(!site.output("stale.txt").exists());
        assert!(site.read("post/index.html").contains("<p>cached</p>"));
    }

    #[test]
    fn test_empty_content_still_writes_home_and_feeds() {
        let site = Site::new();

        let report = build_site(&site.config, &FakeRenderer::new("")).unwrap();

        assert_eq!(report, BuildReport::default());
        assert!(site.output("index.html").is_file());
        assert!(!site.read("rss.xml").contains("<item>"));
        assert!(!site.read("sitemap.xml").contains("<url>"));
    }

    #[test]
    fn test_disabled_feeds_are_not_written() {
        let mut site = Site::new();
        site.config.build.rss.enable = false;
        site.config.build.sitemap.enable = false;
        site.article("post", "post", "2024/01/01");

        build_site(&site.config, &FakeRenderer::new("<p>x</p>")).unwrap();

        assert!(!site.output("rss.xml").exists());
        assert!(!site.output("sitemap.xml").exists());
    }

    #[test]
    fn test_render_failure_is_isolated() {
        let site = Site::new();
        site.article("a-good", "good", "2024/01/01");
        site.article("b-bad", "bad", "2024/01/02");
        site.article("c-fine", "fine", "2024/01/03");
        let renderer = FailingFor("b-bad", FakeRenderer::new("<p>x</p>"));

        let report = build_site(&site.config, &renderer).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.rendered, 2);
        assert!(site.output("good/index.html").is_file());
        assert!(site.output("fine/index.html").is_file());
        assert!(!site.output("bad").exists());
    }

    #[test]
    fn test_duplicate_slug_fails_build() {
        let site = Site::new();
        site.article("a-first", "same", "2024/01/01");
        site.article("b-second", "same", "2024/01/02");

        let err = build_site(&site.config, &FakeRenderer::new("<p>x</p>")).unwrap_err();
        assert!(format!("{err:#}").contains("same"));
        assert!(!site.output("index.html").exists());
    }

    #[test]
    fn test_duplicate_slug_overwrites_when_allowed() {
        let mut site = Site::new();
        site.config.build.allow_slug_overwrite = true;
        let first = site.article("a-first", "same", "2024/01/01");
        let second = site.article("b-second", "same", "2024/01/02");
        fs::write(first.rendered(), "<p>first</p>").unwrap();
        fs::write(second.rendered(), "<p>second</p>").unwrap();

        let report = build_site(&site.config, &FakeRenderer::new("")).unwrap();

        assert_eq!(report.cached, 2);
        let page = site.read("same/index.html");
        assert!(page.contains("<p>second</p>"));
        assert!(!page.contains("<p>first</p>"));
    }

    #[test]
    fn test_parallel_build_keeps_discovery_order() {
        let mut site = Site::new();
        site.config.build.jobs = 4;
        let dates = ["2024/01/05", "2024/01/01", "2024/01/03", "2024/01/02", "2024/01/04"];
        for (i, date) in dates.iter().enumerate() {
            site.article(&format!("post-{i}"), &format!("p{i}"), date);
        }

        let report = build_site(&site.config, &FakeRenderer::new("<p>x</p>")).unwrap();
        assert_eq!(report.rendered, 5);

        let home = site.read("index.html");
        let order: Vec<_> = ["p0", "p4", "p2", "p3", "p1"]
            .iter()
            .map(|slug| home.find(&format!("Title {slug}<")).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        let sitemap = site.read("sitemap.xml");
        let order: Vec<_> = (0..5)
            .map(|i| sitemap.find(&format!("/p{i}/")).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_templates_abort_before_wiping_output() {
        let site = Site::new();
        fs::remove_file(site.config.templates_dir().join(HOME_TEMPLATE)).unwrap();
        fs::create_dir_all(site.config.output_dir()).unwrap();
        fs::write(site.output("keep.txt"), "keep").unwrap();

        assert!(build_site(&site.config, &FakeRenderer::new("")).is_err());
        assert!(site.output("keep.txt").exists());
    }
}
