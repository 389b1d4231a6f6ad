//! Runtime configuration of a search run.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::catalog::{CatalogQuery, DEFAULT_COLLECTION};
use crate::combination::EnumerationPolicy;
use crate::coverage::DEFAULT_SAMPLES;
use crate::geo::Roi;
use crate::mosaic::DEFAULT_PREVIEW_SIZE;
use crate::paths::DataPaths;
use crate::preview::PreviewOptions;

/// Default cloud percentage threshold.
pub const DEFAULT_CLOUD_THRESHOLD: f64 = 20.0;

/// What the progress denominator counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressScale {
    /// Number of combinations the enumeration will yield.
    #[default]
    Combinations,
    /// Number of tiles in the run.
    Tiles,
}

impl fmt::Display for ProgressScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressScale::Combinations => write!(f, "combinations"),
            ProgressScale::Tiles => write!(f, "tiles"),
        }
    }
}

impl FromStr for ProgressScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combinations" => Ok(ProgressScale::Combinations),
            "tiles" => Ok(ProgressScale::Tiles),
            other => Err(format!(
                "unknown progress scale '{}', expected 'combinations' or 'tiles'",
                other
            )),
        }
    }
}

/// Everything a search run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub paths: DataPaths,
    pub roi: Roi,
    /// Inclusive start of the acquisition window.
    pub start_date: NaiveDate,
    /// Exclusive end of the acquisition window.
    pub end_date: NaiveDate,
    pub cloud_threshold: f64,
    pub collection_id: String,
    pub preview: PreviewOptions,
    pub policy: EnumerationPolicy,
    pub progress_scale: ProgressScale,
    /// Skip combinations whose footprints do not fully cover the ROI.
    pub require_full_coverage: bool,
    /// Grid samples per axis for coverage estimation.
    pub coverage_samples: usize,
    /// Longest side of mosaic previews.
    pub mosaic_preview_size: u32,
}

impl SearchConfig {
    /// A configuration with defaults for everything but the ROI and dates.
    pub fn new(paths: DataPaths, roi: Roi, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            paths,
            roi,
            start_date,
            end_date,
            cloud_threshold: DEFAULT_CLOUD_THRESHOLD,
            collection_id: DEFAULT_COLLECTION.to_string(),
            preview: PreviewOptions::default(),
            policy: EnumerationPolicy::prioritized(),
            progress_scale: ProgressScale::default(),
            require_full_coverage: false,
            coverage_samples: DEFAULT_SAMPLES,
            mosaic_preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }

    /// The catalog query seeding the run.
    pub fn catalog_query(&self) -> CatalogQuery {
        CatalogQuery {
            start_date: self.start_date,
            end_date: self.end_date,
            roi: self.roi.clone(),
            cloud_threshold: self.cloud_threshold,
            collection_id: self.collection_id.clone(),
        }
    }
}
