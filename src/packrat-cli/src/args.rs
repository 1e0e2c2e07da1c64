//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "packrat",
    version,
    about = "Assemble source files into a single Markdown artifact, with navigable session history"
)]
pub struct Cli {
    /// Files to start the session with.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Base directory for history snapshot storage.
    #[arg(long, value_name = "DIR", env = "PACKRAT_HISTORY_DIR")]
    pub history_dir: Option<PathBuf>,

    /// Disable session history for this run.
    #[arg(long)]
    pub no_history: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the artifact for the given files to stdout and exit.
    Render {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Prepend a folder tree block rooted at the project root.
        #[arg(long)]
        tree: bool,
    },
}
