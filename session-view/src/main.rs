//! # session-view - Main Entry Point
//!
//! Loads a recorded session, rebuilds its process tree and prints it:
//! - **Print** (`session-view session.json`): indented tree on stdout
//! - **Export** (`--export tree.json`): additionally write a JSON snapshot
//!
//! Set `RUST_LOG=debug` to trace batch application.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::BufWriter;

use session_view::cli::Args;
use session_view::domain::{LoadError, ProcessId};
use session_view::export::export_snapshot;
use session_view::render::render_tree;
use session_view::session::ViewOptions;
use session_view::session_data::SessionData;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LoadError>() {
        Some(LoadError::InvalidSessionData(_) | LoadError::Json(_)) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    let data = SessionData::from_file(&args.session)?;
    info!(
        "Loaded session {} ({} pages, {} events, {} alerts)",
        data.session_entity_id,
        data.pages.len(),
        data.event_count(),
        data.alerts.len()
    );

    let options = ViewOptions {
        verbose_mode: args.verbose,
        search_query: args.search.clone(),
        jump_to_entity_id: args.jump_to.as_deref().map(ProcessId::from),
    };
    let tree = data.build_tree(options).context("Failed to build process tree")?;

    if !quiet {
        println!("session: {}", data.session_entity_id);
        println!("processes: {}", tree.process_map().len());
        if args.search.is_some() {
            println!("matches: {}", tree.search_results().len());
        }
        println!();
    }

    print!("{}", render_tree(tree.process_map(), args.verbose));

    if let Some(ref export_path) = args.export {
        let file = File::create(export_path)
            .with_context(|| format!("Failed to create snapshot file {}", export_path.display()))?;
        export_snapshot(&tree, BufWriter::new(file)).context("Failed to export snapshot")?;

        if !quiet {
            println!("saved: {}", export_path.display());
        }
    }

    Ok(())
}
