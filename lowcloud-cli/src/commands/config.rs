//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use clap::Subcommand;
use lowcloud::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a commented configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(force),
    }
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn or_not_set(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(not set)".to_string())
}

/// Show the effective configuration.
fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load()?;

    println!("Configuration Settings");
    println!("======================");
    if path.exists() {
        println!("File: {}", path.display());
    } else {
        println!("File: {} (missing, showing defaults)", path.display());
    }
    println!();

    println!("[paths]");
    println!(
        "  base_dir = {}",
        or_not_set(config.paths.base_dir.map(|p| p.display().to_string()))
    );
    println!("  roi_name = {}", or_not_set(config.paths.roi_name));
    println!();

    println!("[toolchain]");
    println!(
        "  bin_dir = {}",
        or_not_set(config.toolchain.bin_dir.map(|p| p.display().to_string()))
    );
    println!();

    let search = &config.search;
    println!("[search]");
    println!("  collection = {}", search.collection);
    println!("  cloud_threshold = {}", search.cloud_threshold);
    println!("  resolution = {}", search.resolution);
    println!("  bands = {}", search.bands.join(","));
    println!("  order = {}", search.order);
    println!("  limit = {}", or_not_set(search.limit.map(|l| l.to_string())));
    println!("  progress_scale = {}", search.progress_scale);
    println!("  require_full_coverage = {}", search.require_full_coverage);
    println!("  coverage_samples = {}", search.coverage_samples);
    println!();

    println!("[preview]");
    println!(
        "  source_dir = {}",
        or_not_set(
            config
                .preview
                .source_dir
                .as_ref()
                .map(|p| p.display().to_string())
        )
    );
    println!("  mosaic_preview_size = {}", config.preview.mosaic_preview_size);
    println!();

    println!("[logging]");
    println!("  file = {}", config.logging.file.display());

    Ok(())
}

/// Write the default configuration file.
fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() && !force {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    let written = if force {
        ConfigFile::default().save_to(&path)?;
        path
    } else {
        ConfigFile::ensure_exists()?
    };

    println!("Created {}", written.display());
    println!();
    println!("Next steps:");
    println!("  1. Set [paths] base_dir to the directory for previews and mosaics");
    println!("  2. Set [toolchain] bin_dir to the directory containing gdalbuildvrt");
    Ok(())
}
