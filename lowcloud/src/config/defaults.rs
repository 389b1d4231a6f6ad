//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::settings::*;
use crate::catalog::DEFAULT_COLLECTION;
use crate::combination::TileOrder;
use crate::coverage::DEFAULT_SAMPLES;
use crate::mosaic::DEFAULT_PREVIEW_SIZE;
use crate::preview::{DEFAULT_BANDS, DEFAULT_RESOLUTION};
use crate::search::{ProgressScale, DEFAULT_CLOUD_THRESHOLD};

/// Default log file name inside the config directory's `logs/`.
pub const DEFAULT_LOG_FILE_NAME: &str = "lowcloud.log";

/// Upper bound for coverage samples per axis.
pub const MAX_COVERAGE_SAMPLES: usize = 4096;

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            paths: PathsSettings {
                base_dir: None,
                roi_name: None,
            },
            toolchain: ToolchainSettings { bin_dir: None },
            search: SearchSettings {
                collection: DEFAULT_COLLECTION.to_string(),
                cloud_threshold: DEFAULT_CLOUD_THRESHOLD,
                resolution: DEFAULT_RESOLUTION,
                bands: DEFAULT_BANDS.iter().map(|b| b.to_string()).collect(),
                order: TileOrder::Priority,
                limit: None,
                progress_scale: ProgressScale::Combinations,
                require_full_coverage: false,
                coverage_samples: DEFAULT_SAMPLES,
            },
            preview: PreviewSettings {
                source_dir: None,
                mosaic_preview_size: DEFAULT_PREVIEW_SIZE,
            },
            logging: LoggingSettings {
                file: config_dir.join("logs").join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
