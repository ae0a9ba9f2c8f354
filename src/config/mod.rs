//! Site configuration management for `site.toml`.
//!
//! # Sections
//!
//! | Section           | Purpose                                        |
//! |-------------------|------------------------------------------------|
//! | `[base]`          | Site metadata (title, description, url)        |
//! | `[build]`         | Paths, minify, concurrency, stripped elements  |
//! | `[build.render]`  | External renderer command, timeout, credentials|
//! | `[build.rss]`     | RSS feed output                                |
//! | `[build.sitemap]` | Sitemap output                                 |
//!
//! # Layering
//!
//! Built-in defaults, then `site.toml` (optional), then the environment
//! (`SITE_TITLE`, `SITE_DESCRIPTION`, `BASE_URL`, `ACCOUNT_ID`, `API_KEY`),
//! then CLI flags. The result is read-only for the rest of the build.
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Swift on Server"
//! url = "https://swiftonserver.com/"
//!
//! [build]
//! content = "Sources/Site/Documentation.docc"
//! output = "docs"
//!
//! [build.render]
//! timeout = 120
//! ```

mod base;
mod build;
pub mod defaults;
mod error;

pub use base::BaseConfig;
pub use build::{BuildConfig, RenderConfig};
pub use error::ConfigError;

use crate::cli::{BuildArgs, Cli, Commands};
use anyhow::Result;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Environment Variables
// ============================================================================

pub const ENV_TITLE: &str = "SITE_TITLE";
pub const ENV_DESCRIPTION: &str = "SITE_DESCRIPTION";
pub const ENV_BASE_URL: &str = "BASE_URL";
pub const ENV_ACCOUNT_ID: &str = "ACCOUNT_ID";
pub const ENV_API_KEY: &str = "API_KEY";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing site.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Path to the config file it was loaded from (empty when none existed)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Build the final configuration for one run: file, environment, CLI.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli
            .root
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| PathBuf::from("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.set_root(&root);
        config.update_with_env(|key| std::env::var(key).ok())?;
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Content root, resolved against the project root.
    pub fn content_dir(&self) -> PathBuf {
        self.get_root().join(&self.build.content)
    }

    /// Output root, resolved against the project root.
    pub fn output_dir(&self) -> PathBuf {
        self.get_root().join(&self.build.output)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.get_root().join(&self.build.templates)
    }

    pub fn public_dir(&self) -> PathBuf {
        self.get_root().join(&self.build.public)
    }

    /// Apply environment overrides. `lookup` abstracts `std::env::var` so the
    /// layering can be tested without touching the process environment.
    pub fn update_with_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(title) = lookup(ENV_TITLE) {
            self.base.title = title;
        }
        if let Some(description) = lookup(ENV_DESCRIPTION) {
            self.base.description = description;
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            if url.trim().is_empty() {
                return Err(ConfigError::Env(ENV_BASE_URL, "must not be empty".into()));
            }
            self.base.url = url;
        }
        if let Some(account) = lookup(ENV_ACCOUNT_ID) {
            self.build.render.account_id = account;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|key| !key.is_empty()) {
            self.build.render.api_key = Some(key);
        }
        Ok(())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { build_args } => self.update_with_build_args(build_args),
        }
    }

    fn update_with_build_args(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.build.content, args.content.as_ref());
        Self::update_option(&mut self.build.output, args.output.as_ref());
        Self::update_option(&mut self.build.templates, args.templates.as_ref());
        Self::update_option(&mut self.base.url, args.base_url.as_ref());
        Self::update_option(&mut self.build.jobs, args.jobs.as_ref());
        Self::update_option(&mut self.build.render.timeout, args.render_timeout.as_ref());
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        if args.allow_slug_overwrite {
            self.build.allow_slug_overwrite = true;
        }
    }

    /// Helper to update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.jobs == 0 {
            return Err(ConfigError::Validation("[build].jobs must be at least 1".into()));
        }
        if self.build.render.command.is_empty() {
            return Err(ConfigError::Validation(
                "[build.render].command must not be empty".into(),
            ));
        }
        if self.build.render.timeout == 0 {
            return Err(ConfigError::Validation(
                "[build.render].timeout must be greater than 0".into(),
            ));
        }
        if self.base.url.is_empty() {
            return Err(ConfigError::Validation("[base].url must not be empty".into()));
        }
        Ok(())
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}
