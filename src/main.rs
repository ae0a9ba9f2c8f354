//! sitebuilder - builds a static site from Markdown-and-metadata article folders.

mod article;
mod build;
mod cli;
mod config;
mod content;
mod generator;
mod logger;
mod registry;
mod render;
mod template;
mod utils;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use render::CommandRenderer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::set_quiet(cli.quiet);
    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => {
            let renderer = CommandRenderer::from_config(&config.build.render);
            build_site(&config, &renderer)?;
            Ok(())
        }
    }
}
