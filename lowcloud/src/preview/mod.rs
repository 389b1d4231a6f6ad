//! Per-tile previews.
//!
//! Each image of a search run needs a small preview raster and its
//! geographic footprint. A [`PreviewSource`] fetches the PNG preview and
//! reports the footprint; [`prepare_item`] then georeferences the preview
//! into a GeoTIFF whose pixel grid spans the footprint's bounding box.
//!
//! Preparation is idempotent: a run over a work directory left behind by an
//! earlier run reuses what is already on disk and only fetches what is
//! missing.

mod directory;
mod prepare;

pub use directory::DirectoryPreviewSource;
pub use prepare::{prepare_item, PreparedItem};

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

use crate::geo::{Footprint, GeoError, Roi};
use crate::toolchain::ToolError;

/// Coordinate reference system previews are requested in.
pub const PREVIEW_CRS: &str = "EPSG:4326";

/// Default preview bands (true colour).
pub const DEFAULT_BANDS: [&str; 3] = ["B4", "B3", "B2"];

/// Default preview size in pixels.
pub const DEFAULT_RESOLUTION: u32 = 1024;

/// Errors preparing the preview of one image.
///
/// All of these are per-item: the item is dropped from the run, the run
/// continues.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The source has no preview for this image.
    #[error("no preview available for {image_id}: {reason}")]
    Unavailable { image_id: String, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A footprint document could not be read or written.
    #[error("bad footprint document {}: {source}", .path.display())]
    FootprintFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid footprint: {0}")]
    InvalidFootprint(#[from] GeoError),

    /// Converting the preview into a georeferenced raster failed.
    #[error("georeferencing failed: {0}")]
    Georeference(#[from] ToolError),
}

impl PreviewError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PreviewError::Io {
            path: path.into(),
            source,
        }
    }
}

/// What to fetch for one image.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub image_id: String,
    pub roi: Roi,
    pub bands: Vec<String>,
    /// Pixel size of the longest side.
    pub dimensions: u32,
    /// Output file format; always `png`.
    pub format: &'static str,
    pub crs: &'static str,
    /// Where the preview must be written.
    pub output: PathBuf,
}

/// Preview parameters shared by every image of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    pub bands: Vec<String>,
    pub resolution: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS.iter().map(|b| b.to_string()).collect(),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl PreviewOptions {
    pub fn request(&self, image_id: &str, roi: &Roi, output: PathBuf) -> PreviewRequest {
        PreviewRequest {
            image_id: image_id.to_string(),
            roi: roi.clone(),
            bands: self.bands.clone(),
            dimensions: self.resolution,
            format: "png",
            crs: PREVIEW_CRS,
            output,
        }
    }
}

/// Source of per-image preview rasters.
pub trait PreviewSource: Send + Sync {
    /// Writes the preview to `request.output` and returns its footprint
    /// as a closed ring.
    fn fetch(
        &self,
        request: &PreviewRequest,
    ) -> impl Future<Output = Result<Footprint, PreviewError>> + Send;

    /// Name for logging.
    fn name(&self) -> &str;
}
