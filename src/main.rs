//! quickcast launcher core
//!
//! Matches free-text queries against installed programs, browser bookmarks
//! and web-search suggestions, ranks them with a fuzzy subsequence matcher,
//! and aggregates results from all sources without ever letting a superseded
//! keystroke corrupt the displayed list.

mod cli;
mod config;
mod error;
mod pipeline;
mod provider;
mod search;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::LauncherConfig;
use pipeline::{Launcher, ResultsUpdate};
use provider::{BookmarksProvider, ProgramsProvider, Provider, SearchSource, WebSearchProvider};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let config = config::load_config()?;
    let launcher = build_launcher(&config)?;

    match cli.command {
        Some(Commands::Query(args)) => run_query(&launcher, &args.raw()).await,
        Some(Commands::Providers) => {
            list_providers(&launcher);
            Ok(())
        }
        Some(Commands::Interactive) | None => run_interactive(launcher).await,
    }
}

/// Assemble the stock provider set in display-priority order.
fn build_launcher(config: &LauncherConfig) -> Result<Launcher> {
    let wildcard = &config.wildcard_marker;
    let mut providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(ProgramsProvider::new(wildcard)),
        Arc::new(BookmarksProvider::new(wildcard)),
    ];
    for source in SearchSource::defaults(wildcard) {
        providers.push(Arc::new(WebSearchProvider::new(source, wildcard)?));
    }
    Ok(Launcher::new(config.clone(), providers))
}

/// One-shot mode: dispatch, wait for the terminal update, print it.
async fn run_query(launcher: &Launcher, raw: &str) -> Result<()> {
    let update = launcher.query_to_completion(raw).await;
    render(&update);
    Ok(())
}

fn list_providers(launcher: &Launcher) {
    for metadata in launcher.provider_metadata() {
        println!(
            "{:<24} keyword: {:<6} {}",
            metadata.id,
            metadata.action_keyword,
            if metadata.enabled { "enabled" } else { "disabled" }
        );
    }
}

/// Interactive mode: every line is a keystroke-complete query; a bare number
/// invokes that entry of the current list; `quit` leaves.
async fn run_interactive(launcher: Launcher) -> Result<()> {
    let printer_updates = launcher.updates();
    let printer = tokio::spawn(async move {
        let mut updates = printer_updates;
        while updates.changed().await.is_ok() {
            let update = updates.borrow_and_update().clone();
            render(&update);
        }
    });

    eprintln!("quickcast - type a query, a result number to launch, or 'quit'");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input == "quit" || input == "exit" {
            break;
        }
        if let Ok(index) = input.parse::<usize>() {
            let current = launcher.updates().borrow().clone();
            match current.results.get(index.wrapping_sub(1)) {
                Some(item) => {
                    debug!(title = %item.title, "invoking result");
                    if item.invoke() {
                        break;
                    }
                }
                None => eprintln!("no result #{}", index),
            }
            continue;
        }
        launcher.dispatch(input).await;
    }

    printer.abort();
    Ok(())
}

/// Print one result list to stdout.
fn render(update: &ResultsUpdate) {
    if update.query.raw.is_empty() && update.results.is_empty() {
        return;
    }
    let state = if update.complete { "done" } else { "searching" };
    println!("-- \"{}\" [{}]", update.query.raw, state);
    for (index, item) in update.results.iter().enumerate() {
        println!(
            "{:>3}. {:<40} {:<40} {:>7}",
            index + 1,
            item.title,
            item.subtitle,
            item.score
        );
    }
    if update.results.is_empty() && update.complete {
        println!("  (no results)");
    }
}
