//! Template collection.
//!
//! Three templates are looked up in the templates directory:
//!
//! - `post.html`: one article body, rendered with the article record
//! - `home.html`: the post list, rendered with the sorted registry
//! - `index.html`: the page wrapper every page is embedded in
//!
//! All three are loaded when the collection is built, so a missing or
//! malformed template aborts the build before anything is written.

use anyhow::{Context, Result};
use minijinja::{Environment, Value, path_loader};
use serde::Serialize;
use std::path::Path;

pub const POST_TEMPLATE: &str = "post.html";
pub const HOME_TEMPLATE: &str = "home.html";
pub const INDEX_TEMPLATE: &str = "index.html";

const REQUIRED: [&str; 3] = [POST_TEMPLATE, HOME_TEMPLATE, INDEX_TEMPLATE];

/// Loaded page templates. Shared read-only by every article of a build.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Load and compile every required template from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));

        for name in REQUIRED {
            env.get_template(name).with_context(|| {
                format!("failed to load template {}", dir.join(name).display())
            })?;
        }

        Ok(Self { env })
    }

    /// Render template `name` with `ctx`.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

/// Mark already-rendered HTML so templates embed it without escaping.
pub fn html(body: impl Into<String>) -> Value {
    Value::from_safe_string(body.into())
}
