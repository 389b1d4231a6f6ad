//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::combination::TileOrder;
use crate::search::ProgressScale;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Work directory settings
    pub paths: PathsSettings,
    /// External raster toolchain
    pub toolchain: ToolchainSettings,
    /// Search behaviour
    pub search: SearchSettings,
    /// Preview settings
    pub preview: PreviewSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Work directory configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PathsSettings {
    /// Root of all work directories
    pub base_dir: Option<PathBuf>,
    /// Default region name, used when the ROI file does not name one
    pub roi_name: Option<String>,
}

/// External toolchain configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolchainSettings {
    /// Directory holding gdalbuildvrt and gdal_translate
    pub bin_dir: Option<PathBuf>,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Catalog collection id
    pub collection: String,
    /// Images at or above this cloud percentage are ignored
    pub cloud_threshold: f64,
    /// Preview size in pixels
    pub resolution: u32,
    /// Preview bands
    pub bands: Vec<String>,
    /// Tile order
    pub order: TileOrder,
    /// Maximum combinations per run, `None` for all
    pub limit: Option<usize>,
    /// Progress denominator
    pub progress_scale: ProgressScale,
    /// Skip combinations that do not cover the whole region
    pub require_full_coverage: bool,
    /// Coverage grid samples per axis
    pub coverage_samples: usize,
}

/// Preview configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    /// Directory of pre-downloaded previews (`{id}.png` + `{id}.json`)
    pub source_dir: Option<PathBuf>,
    /// Longest side of mosaic previews in pixels
    pub mosaic_preview_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
