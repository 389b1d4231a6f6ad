//! Search command - enumerate combinations and build mosaics.
//!
//! The run is controlled from stdin, one command per line:
//! `p` pauses, `r` resumes, `s` (or `q`) stops. Ctrl+C also stops the run.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use lowcloud::control::Signal;
use lowcloud::preview::DirectoryPreviewSource;
use lowcloud::search::{
    SearchConfig, SearchError, SearchEvent, SearchHandle, SearchOrchestrator, SearchSummary,
};
use lowcloud::toolchain::GdalToolchain;

use super::common::{resolve_search_config, EnumerationArgs, QueryArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the search command.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    #[command(flatten)]
    pub enumeration: EnumerationArgs,

    /// Directory of pre-downloaded previews (overrides config)
    #[arg(long)]
    pub previews: Option<PathBuf>,

    /// Skip combinations that do not cover the whole region
    #[arg(long)]
    pub require_full_coverage: bool,

    /// Print events as JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the search command.
pub fn run(args: SearchArgs, debug: bool) -> Result<(), CliError> {
    // Stdout carries one JSON document per line in json mode.
    let runner = CliRunner::new(debug, !args.json)?;
    runner.log_startup("search");

    let mut config = resolve_search_config(&runner, &args.query, &args.enumeration)?;
    if args.require_full_coverage {
        config.require_full_coverage = true;
    }

    let layout = config
        .paths
        .validate()
        .map_err(SearchError::Configuration)?;
    let toolchain = GdalToolchain::new(layout.toolchain_dir());
    toolchain.verify()?;

    let previews = DirectoryPreviewSource::new(runner.preview_dir(args.previews)?);
    let catalog = runner.open_catalog(&args.query.catalog)?;

    if !args.json {
        print_banner(&config, &previews);
    }

    let orchestrator = SearchOrchestrator::new(
        config,
        Arc::new(catalog),
        Arc::new(previews),
        Arc::new(toolchain),
    );

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let result = runtime.block_on(async {
        let handle = orchestrator.start()?;
        drive(handle, args.json).await
    });
    // The stdin reader may still be blocked in a read.
    runtime.shutdown_background();
    let summary = result?;

    if !args.json {
        print_summary(&summary);
    }
    Ok(())
}

fn print_banner(config: &SearchConfig, previews: &DirectoryPreviewSource) {
    println!("lowcloud search v{}", lowcloud::VERSION);
    println!("====================");
    println!();
    println!("Region:     {}", config.roi.name);
    println!("Window:     {} .. {}", config.start_date, config.end_date);
    println!("Clouds:     < {}%", config.cloud_threshold);
    println!("Order:      {}", config.policy.order);
    match config.policy.limit {
        Some(limit) => println!("Limit:      {} combinations", limit),
        None => println!("Limit:      none"),
    }
    println!("Previews:   {}", previews.dir().display());
    println!();
    println!("Commands: p = pause, r = resume, s = stop");
    println!();
}

/// Maps a control line from stdin to a signal.
fn parse_signal(line: &str) -> Option<Signal> {
    match line.trim().to_lowercase().as_str() {
        "p" | "pause" => Some(Signal::Pause),
        "r" | "resume" => Some(Signal::Resume),
        "s" | "stop" | "q" | "quit" => Some(Signal::Stop),
        _ => None,
    }
}

/// Forwards events to stdout and control lines to the run until the worker
/// is done.
async fn drive(mut handle: SearchHandle, json: bool) -> Result<SearchSummary, CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_event(&event, json),
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_signal(&line) {
                    Some(signal) => {
                        let changed = handle.control().apply(signal);
                        info!(signal = %signal, changed, "control signal");
                        feedback(json, format_args!("[{}] {}", signal, handle.state()));
                    }
                    None if line.trim().is_empty() => {}
                    None => feedback(
                        json,
                        format_args!("Unknown command '{}'. Use p, r or s.", line.trim()),
                    ),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                feedback(
                    json,
                    format_args!("\nInterrupted, stopping after the current combination..."),
                );
                handle.stop();
            }
        }
    }

    Ok(handle.wait().await?)
}

/// Prints an interactive message; stderr in json mode.
fn feedback(json: bool, message: std::fmt::Arguments<'_>) {
    if json {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

fn print_event(event: &SearchEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "could not serialize event"),
        }
        return;
    }

    match event {
        SearchEvent::ItemPrepared {
            tile_id,
            image_id,
            fetched,
        } => {
            let how = if *fetched { "fetched" } else { "cached" };
            println!("  preview {} / {} ({})", tile_id, image_id, how);
        }
        SearchEvent::ItemFailed {
            tile_id,
            image_id,
            reason,
        } => println!("  preview {} / {} FAILED: {}", tile_id, image_id, reason),
        SearchEvent::EnumerationStarted {
            tiles,
            items,
            progress,
        } => {
            println!();
            println!(
                "Enumerating {} tile(s), {} image(s), {} combination(s)",
                tiles, items, progress.max
            );
        }
        SearchEvent::MosaicBuilt { result, progress } => {
            let cached = if result.reused { " (cached)" } else { "" };
            println!(
                "[{} {:5.1}%] {}{}",
                progress,
                progress.percent(),
                result.preview_path.display(),
                cached
            );
            println!("    {}", result.item_ids.join(" + "));
        }
        SearchEvent::CombinationSkipped { mosaic_id, reason } => {
            println!("  skipped {}: {}", short_id(mosaic_id), reason);
        }
        SearchEvent::BuildFailed {
            mosaic_id,
            item_ids,
            error,
        } => {
            println!(
                "  FAILED {} ({}): {}",
                short_id(mosaic_id),
                item_ids.join(" + "),
                error
            );
        }
        SearchEvent::Finished(_) => {}
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn print_summary(summary: &SearchSummary) {
    println!();
    println!("Search {}", summary.outcome);
    println!("  Previews ready:   {}", summary.items_prepared);
    if summary.items_failed > 0 {
        println!("  Previews failed:  {}", summary.items_failed);
    }
    println!("  Combinations:     {}", summary.combinations_considered);
    println!("  Mosaics:          {}", summary.mosaics_built);
    println!("  Duplicates:       {}", summary.duplicates);
    println!("  Skipped:          {}", summary.skipped);
    println!("  Failed:           {}", summary.failed);
}
