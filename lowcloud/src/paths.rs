//! On-disk layout of a search run.
//!
//! ```text
//! {base_dir}/thumbnails/{roi_name}/               work directory of one ROI
//!     {tile_id}/{image_id}_{resolution}.png       fetched preview
//!     {tile_id}/{image_id}_{resolution}.tif       georeferenced preview
//!     {tile_id}/{image_id}_{resolution}.footprint.json
//!     mosaic/{mosaic_id}.tif                      materialized mosaic
//!     mosaic/{mosaic_id}.png                      lightweight preview
//! ```
//!
//! Work directories are shared between runs over the same ROI and act as a
//! cache: existing files are reused, never blindly overwritten.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the thumbnail directory under the base directory.
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Name of the mosaic directory under an ROI work directory.
pub const MOSAIC_DIR: &str = "mosaic";

/// A required path is unset or unusable; a run cannot start.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("base directory is not set")]
    MissingBaseDir,

    #[error("region of interest name is not set")]
    MissingRoiName,

    #[error("toolchain directory is not set")]
    MissingToolchainDir,

    #[error("toolchain directory {} does not exist", .0.display())]
    ToolchainDirNotFound(PathBuf),

    #[error("{0}")]
    Invalid(String),
}

/// Path settings as configured, possibly incomplete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPaths {
    pub base_dir: Option<PathBuf>,
    pub roi_name: Option<String>,
    pub toolchain_dir: Option<PathBuf>,
}

impl DataPaths {
    /// Checks that every required path is set and returns the layout.
    pub fn validate(&self) -> Result<WorkLayout, ConfigurationError> {
        let base_dir = self
            .base_dir
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigurationError::MissingBaseDir)?;
        let roi_name = self
            .roi_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(ConfigurationError::MissingRoiName)?;
        let toolchain_dir = self
            .toolchain_dir
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigurationError::MissingToolchainDir)?;

        if !toolchain_dir.is_dir() {
            return Err(ConfigurationError::ToolchainDirNotFound(
                toolchain_dir.clone(),
            ));
        }

        Ok(WorkLayout {
            roi_dir: base_dir.join(THUMBNAIL_DIR).join(sanitize(roi_name)),
            toolchain_dir: toolchain_dir.clone(),
        })
    }
}

/// Validated layout of one ROI's work directory.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkLayout {
    roi_dir: PathBuf,
    toolchain_dir: PathBuf,
}

impl WorkLayout {
    /// Builds a layout rooted directly at `roi_dir`.
    pub fn new(roi_dir: impl Into<PathBuf>, toolchain_dir: impl Into<PathBuf>) -> Self {
        Self {
            roi_dir: roi_dir.into(),
            toolchain_dir: toolchain_dir.into(),
        }
    }

    pub fn roi_dir(&self) -> &Path {
        &self.roi_dir
    }

    pub fn toolchain_dir(&self) -> &Path {
        &self.toolchain_dir
    }

    pub fn tile_dir(&self, tile_id: &str) -> PathBuf {
        self.roi_dir.join(sanitize(tile_id))
    }

    pub fn mosaic_dir(&self) -> PathBuf {
        self.roi_dir.join(MOSAIC_DIR)
    }

    fn tile_file(&self, tile_id: &str, image_id: &str, resolution: u32, suffix: &str) -> PathBuf {
        self.tile_dir(tile_id)
            .join(format!("{}_{}.{}", sanitize(image_id), resolution, suffix))
    }

    /// Fetched, not yet georeferenced, preview of one image.
    pub fn tile_png(&self, tile_id: &str, image_id: &str, resolution: u32) -> PathBuf {
        self.tile_file(tile_id, image_id, resolution, "png")
    }

    /// Georeferenced preview of one image.
    pub fn tile_tif(&self, tile_id: &str, image_id: &str, resolution: u32) -> PathBuf {
        self.tile_file(tile_id, image_id, resolution, "tif")
    }

    /// Footprint stored beside a fetched preview.
    pub fn tile_footprint(&self, tile_id: &str, image_id: &str, resolution: u32) -> PathBuf {
        self.tile_file(tile_id, image_id, resolution, "footprint.json")
    }

    pub fn mosaic_tif(&self, mosaic_id: &str) -> PathBuf {
        self.mosaic_dir().join(format!("{}.tif", mosaic_id))
    }

    pub fn mosaic_png(&self, mosaic_id: &str) -> PathBuf {
        self.mosaic_dir().join(format!("{}.png", mosaic_id))
    }
}

/// Makes an identifier safe to use as a single path component.
pub fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}
