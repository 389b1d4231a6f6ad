//! Mosaic building.
//!
//! A [`MosaicBuilder`] merges the georeferenced previews of one
//! [`Combination`] into a single GeoTIFF and exports a small PNG preview of
//! it. Output files are named by [`mosaic_id`], a digest of the sorted image
//! ids, so the same set of images always lands on the same files no matter
//! the order the tiles were combined in.
//!
//! The name covers the images actually merged: when some rasters of a
//! combination are missing, the mosaic of the remaining ones is built and
//! named after those, so it is never mistaken for the complete mosaic.

mod scratch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::combination::Combination;
use crate::paths::WorkLayout;
use crate::tile::TileItem;
use crate::toolchain::{RasterToolchain, ToolError};
use scratch::ScratchFiles;

/// Default longest side of mosaic previews, in pixels.
pub const DEFAULT_PREVIEW_SIZE: u32 = 512;

/// Errors building one mosaic. None of them end the run.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// None of the combination's rasters exist.
    #[error("no input files for combination")]
    NoInputFiles,

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The exported raster could not be turned into a preview.
    #[error("failed to write preview {}: {source}", .path.display())]
    Preview {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The preview task panicked or was cancelled.
    #[error("preview task failed: {0}")]
    Task(String),
}

impl MosaicError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        MosaicError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A successfully built mosaic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MosaicResult {
    pub id: String,
    pub preview_path: PathBuf,
    pub raster_path: PathBuf,
    /// Image ids in combination order.
    pub item_ids: Vec<String>,
    pub tile_names: Vec<String>,
    /// True if the mosaic was already on disk and no tool ran.
    pub reused: bool,
}

/// Deterministic mosaic name: hex SHA-256 of the sorted ids joined by `,`.
pub fn mosaic_id<S: AsRef<str>>(image_ids: &[S]) -> String {
    let mut ids: Vec<&str> = image_ids.iter().map(AsRef::as_ref).collect();
    ids.sort_unstable();
    let mut hasher = Sha256::new();
    hasher.update(ids.join(",").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Builds mosaics of combinations inside one work directory.
pub struct MosaicBuilder<T> {
    toolchain: Arc<T>,
    layout: WorkLayout,
    resolution: u32,
    preview_size: u32,
}

impl<T: RasterToolchain> MosaicBuilder<T> {
    /// `resolution` selects which per-tile previews are merged.
    pub fn new(toolchain: Arc<T>, layout: WorkLayout, resolution: u32) -> Self {
        Self {
            toolchain,
            layout,
            resolution,
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }

    pub fn with_preview_size(mut self, size: u32) -> Self {
        self.preview_size = size.max(1);
        self
    }

    pub fn layout(&self) -> &WorkLayout {
        &self.layout
    }

    /// Mosaic id a combination builds.
    pub fn id_for(&self, combination: &Combination) -> String {
        mosaic_id(&combination.image_ids())
    }

    /// Items of the combination whose georeferenced raster exists on disk,
    /// with their tile name and raster path.
    fn resolve<'c>(&self, combination: &'c Combination) -> Vec<(&'c TileItem, &'c str, PathBuf)> {
        combination
            .items
            .iter()
            .zip(&combination.tile_names)
            .filter_map(|(item, tile_name)| {
                let path = self
                    .layout
                    .tile_tif(&item.tile_id, &item.image_id, self.resolution);
                if path.is_file() {
                    Some((item, tile_name.as_str(), path))
                } else {
                    warn!(
                        image_id = %item.image_id,
                        path = %path.display(),
                        "raster missing, skipping item"
                    );
                    None
                }
            })
            .collect()
    }

    /// Builds the mosaic of `combination`.
    ///
    /// Items whose raster is missing are left out and the result names only
    /// the merged items. On failure every intermediate file written so far
    /// is removed and no mosaic file is left behind.
    pub async fn build(&self, combination: &Combination) -> Result<MosaicResult, MosaicError> {
        let resolved = self.resolve(combination);
        if resolved.is_empty() {
            return Err(MosaicError::NoInputFiles);
        }
        let item_ids: Vec<String> = resolved
            .iter()
            .map(|(item, _, _)| item.image_id.clone())
            .collect();
        let tile_names: Vec<String> = resolved
            .iter()
            .map(|(_, tile_name, _)| tile_name.to_string())
            .collect();
        let inputs: Vec<PathBuf> = resolved.into_iter().map(|(_, _, path)| path).collect();
        let id = mosaic_id(item_ids.as_slice());
        if inputs.len() < combination.tile_count {
            debug!(
                mosaic_id = %id,
                merged = inputs.len(),
                tiles = combination.tile_count,
                "building mosaic of the available rasters"
            );
        }

        let raster = self.layout.mosaic_tif(&id);
        let preview = self.layout.mosaic_png(&id);
        let result = MosaicResult {
            id: id.clone(),
            preview_path: preview.clone(),
            raster_path: raster.clone(),
            item_ids,
            tile_names,
            reused: false,
        };

        if raster.is_file() && preview.is_file() {
            debug!(mosaic_id = %id, "mosaic already built");
            return Ok(MosaicResult {
                reused: true,
                ..result
            });
        }

        let mosaic_dir = self.layout.mosaic_dir();
        tokio::fs::create_dir_all(&mosaic_dir)
            .await
            .map_err(|e| MosaicError::io(&mosaic_dir, e))?;

        let mut scratch = ScratchFiles::new();

        let list = scratch.track(mosaic_dir.join(format!("{}.list.txt", id)));
        let mut content = String::new();
        for input in &inputs {
            content.push_str(&input.to_string_lossy());
            content.push('\n');
        }
        tokio::fs::write(&list, content)
            .await
            .map_err(|e| MosaicError::io(&list, e))?;

        let vrt = scratch.track(mosaic_dir.join(format!("{}.vrt", id)));
        self.toolchain.build_virtual_mosaic(&list, &vrt).await?;

        let raster = scratch.track(raster);
        self.toolchain.materialize(&vrt, &raster).await?;

        let full_png = scratch.track(mosaic_dir.join(format!("{}.full.png", id)));
        scratch.track(mosaic_dir.join(format!("{}.full.png.aux.xml", id)));
        self.toolchain.export_png(&raster, &full_png).await?;

        let preview = scratch.track(preview);
        let (source, target, size) = (full_png.clone(), preview.clone(), self.preview_size);
        tokio::task::spawn_blocking(move || write_preview(&source, &target, size))
            .await
            .map_err(|e| MosaicError::Task(e.to_string()))??;

        scratch.keep(&raster);
        scratch.keep(&preview);
        info!(
            mosaic_id = %id,
            inputs = inputs.len(),
            tiles = combination.tile_count,
            "mosaic built"
        );
        Ok(result)
    }
}

/// Downscales `source` so its longest side is at most `size` pixels.
fn write_preview(source: &Path, target: &Path, size: u32) -> Result<(), MosaicError> {
    let image = image::open(source).map_err(|e| MosaicError::Preview {
        path: source.to_path_buf(),
        source: e,
    })?;
    let preview = if image.width() > size || image.height() > size {
        image.thumbnail(size, size)
    } else {
        image
    };
    preview
        .save_with_format(target, image::ImageFormat::Png)
        .map_err(|e| MosaicError::Preview {
            path: target.to_path_buf(),
            source: e,
        })
}
