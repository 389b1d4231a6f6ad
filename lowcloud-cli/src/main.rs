//! lowcloud CLI - Command-line interface
//!
//! This binary provides a command-line interface to the lowcloud library:
//! searching low-cloud tile combinations and building their mosaics.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::count::CountArgs;
use commands::search::SearchArgs;
use commands::tiles::TilesArgs;

#[derive(Parser)]
#[command(name = "lowcloud")]
#[command(version = lowcloud::VERSION)]
#[command(about = "Find low-cloud Sentinel-2 tile combinations and build their mosaics", long_about = None)]
struct Cli {
    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search combinations and build mosaics (interactive: p/r/s on stdin)
    Search(SearchArgs),

    /// Show tile grouping and enumeration order for a catalog
    Tiles(TilesArgs),

    /// Count combinations for given tile sizes
    Count(CountArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search(args) => commands::search::run(args, cli.debug),
        Commands::Tiles(args) => commands::tiles::run(args, cli.debug),
        Commands::Count(args) => commands::count::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
