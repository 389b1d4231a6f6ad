//! Configuration file handling for ~/.lowcloud/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in `settings`, constants in `defaults`,
//! parsing in `parser`, and serialization in `writer`.

use chrono::NaiveDate;
use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;
use crate::combination::EnumerationPolicy;
use crate::geo::Roi;
use crate::paths::DataPaths;
use crate::preview::PreviewOptions;
use crate::search::SearchConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.lowcloud/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.lowcloud/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }

    /// Work paths for a run. `roi_name` overrides the configured name.
    ///
    /// Nothing is validated here; missing values surface when the search
    /// starts.
    pub fn data_paths(&self, roi_name: Option<&str>) -> DataPaths {
        DataPaths {
            base_dir: self.paths.base_dir.clone(),
            roi_name: roi_name
                .map(str::to_string)
                .or_else(|| self.paths.roi_name.clone()),
            toolchain_dir: self.toolchain.bin_dir.clone(),
        }
    }

    /// A search configuration for `roi` over `[start_date, end_date)` with
    /// every other setting taken from this file.
    pub fn search_config(&self, roi: Roi, start_date: NaiveDate, end_date: NaiveDate) -> SearchConfig {
        let paths = self.data_paths(Some(&roi.name));
        let mut config = SearchConfig::new(paths, roi, start_date, end_date);
        config.cloud_threshold = self.search.cloud_threshold;
        config.collection_id = self.search.collection.clone();
        config.preview = PreviewOptions {
            bands: self.search.bands.clone(),
            resolution: self.search.resolution,
        };
        config.policy = EnumerationPolicy {
            order: self.search.order,
            limit: self.search.limit,
        };
        config.progress_scale = self.search.progress_scale;
        config.require_full_coverage = self.search.require_full_coverage;
        config.coverage_samples = self.search.coverage_samples;
        config.mosaic_preview_size = self.preview.mosaic_preview_size;
        config
    }
}

/// Get the path to the config directory (~/.lowcloud).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lowcloud")
}

/// Get the path to the config file (~/.lowcloud/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
