//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use lowcloud::catalog::CatalogError;
use lowcloud::config::{config_file_path, ConfigFileError};
use lowcloud::search::SearchError;
use lowcloud::toolchain::ToolError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// An input file given on the command line is unusable
    Input { path: PathBuf, reason: String },
    /// Catalog could not be loaded
    Catalog(CatalogError),
    /// External toolchain is unusable
    Toolchain(ToolError),
    /// Search could not be started or ended abnormally
    Search(SearchError),
    /// Async runtime could not be created
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Toolchain(ToolError::NotFound { .. }) => {
                eprintln!();
                eprintln!("The GDAL command-line tools are required. Make sure:");
                eprintln!("  1. GDAL is installed (e.g. sudo apt install gdal-bin)");
                eprintln!(
                    "  2. [toolchain] bin_dir in {} points at the directory",
                    config_file_path().display()
                );
                eprintln!("     containing gdalbuildvrt and gdal_translate");
            }
            CliError::Search(SearchError::Configuration(_)) => {
                eprintln!();
                eprintln!("Create a configuration file with 'lowcloud config init' and set");
                eprintln!("[paths] base_dir and [toolchain] bin_dir.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Input { path, reason } => {
                write!(f, "Invalid input '{}': {}", path.display(), reason)
            }
            CliError::Catalog(e) => write!(f, "Failed to load catalog: {}", e),
            CliError::Toolchain(e) => write!(f, "Toolchain unavailable: {}", e),
            CliError::Search(e) => write!(f, "Search failed: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::Toolchain(e) => Some(e),
            CliError::Search(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<ToolError> for CliError {
    fn from(e: ToolError) -> Self {
        CliError::Toolchain(e)
    }
}

impl From<SearchError> for CliError {
    fn from(e: SearchError) -> Self {
        CliError::Search(e)
    }
}
