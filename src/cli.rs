//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Static site builder for markdown-and-metadata article folders
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the root (default: site.toml)
    #[arg(short = 'C', long, default_value = "site.toml")]
    pub config: PathBuf,

    /// Only print warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments of the `build` command. Each one overrides site.toml and the
/// environment.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Template directory path (relative to project root)
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// Override base URL for the site.
    ///
    /// Every permalink, the rss channel link and the sitemap locations are
    /// built from it, e.g. `--base-url https://swiftonserver.com/`.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Number of articles rendered concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Seconds to wait for one external render before giving up
    #[arg(long = "render-timeout")]
    pub render_timeout: Option<u64>,

    /// Let later articles overwrite earlier ones that share a slug
    #[arg(long)]
    pub allow_slug_overwrite: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Deletes the output directory if there is one and rebuilds the site
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}
