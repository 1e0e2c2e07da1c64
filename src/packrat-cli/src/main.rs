//! Packrat CLI - Main entry point.
//!
//! Runs an interactive session by default; `render` produces a one-shot
//! artifact. The session shell owns the staleness poll timer and drives
//! the history engine from a single task.

mod args;
mod config;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands};
use config::PackratConfig;
use packrat_common::detect_project_root;
use packrat_render::{render_markdown, render_tree, RenderOptions};

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| format!("packrat={level}"));
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

fn cmd_render(files: Vec<std::path::PathBuf>, tree: bool, config: &PackratConfig) -> Result<()> {
    let files: Vec<_> = files
        .iter()
        .map(|f| std::path::absolute(f).unwrap_or_else(|_| f.clone()))
        .collect();
    let root = detect_project_root(&files);

    if tree || config.tree_enabled {
        if let Some(base) = &root {
            let block = render_tree(
                base,
                config.tree_ignore(),
                config.tree_max_depth,
                root.as_deref(),
            )?;
            println!("{block}");
        }
    }

    let options = RenderOptions {
        project_root: root,
        selected_items: Vec::new(),
        symbol_extractor: None,
    };
    println!("{}", render_markdown(&files, &options));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = PackratConfig::load();

    match cli.command.take() {
        Some(Commands::Render { files, tree }) => cmd_render(files, tree, &config),
        None => session::run(cli, config).await,
    }
}
