//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "session-view",
    about = "Rebuild and inspect the process tree of a recorded terminal session",
    after_help = "\
EXAMPLES:
    session-view session.json                         Print the process tree
    session-view session.json --search curl           Highlight matching processes
    session-view session.json --verbose               Include shell startup noise
    session-view session.json --export tree.json      Write a JSON snapshot"
)]
pub struct Args {
    /// Session data file (JSON)
    #[arg(value_name = "SESSION")]
    pub session: PathBuf,

    /// Highlight processes whose command line contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Show verbose (shell noise) processes
    #[arg(short, long)]
    pub verbose: bool,

    /// Expand the tree down to this process entity id
    #[arg(long, value_name = "ENTITY_ID")]
    pub jump_to: Option<String>,

    /// Export a JSON snapshot of the tree to file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
