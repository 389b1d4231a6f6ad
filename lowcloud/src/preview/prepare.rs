//! Turning one catalog image into a georeferenced preview on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{PreviewError, PreviewOptions, PreviewSource};
use crate::geo::{Footprint, Roi};
use crate::paths::WorkLayout;
use crate::tile::TileItem;
use crate::toolchain::RasterToolchain;

/// A tile item whose georeferenced preview exists.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedItem {
    pub image_id: String,
    /// Georeferenced preview raster.
    pub raster: PathBuf,
    /// Footprint, when known. Rasters left by runs that predate footprint
    /// files have none.
    pub footprint: Option<Footprint>,
    /// True if the preview was fetched during this call.
    pub fetched: bool,
}

/// Ensures the georeferenced preview of `item` exists.
///
/// In order of preference:
/// 1. the GeoTIFF already exists: reuse it;
/// 2. a PNG and its footprint exist: georeference them;
/// 3. otherwise fetch from `source`, store the footprint, georeference.
///
/// The PNG is removed once the GeoTIFF is written.
pub async fn prepare_item<P, T>(
    source: &P,
    toolchain: &T,
    layout: &WorkLayout,
    roi: &Roi,
    options: &PreviewOptions,
    item: &TileItem,
) -> Result<PreparedItem, PreviewError>
where
    P: PreviewSource,
    T: RasterToolchain,
{
    let res = options.resolution;
    let tif = layout.tile_tif(&item.tile_id, &item.image_id, res);
    let png = layout.tile_png(&item.tile_id, &item.image_id, res);
    let footprint_path = layout.tile_footprint(&item.tile_id, &item.image_id, res);

    if tif.is_file() {
        let footprint = if footprint_path.is_file() {
            Some(read_footprint(&footprint_path).await?)
        } else {
            None
        };
        debug!(image_id = %item.image_id, path = %tif.display(), "preview already on disk");
        return Ok(PreparedItem {
            image_id: item.image_id.clone(),
            raster: tif,
            footprint,
            fetched: false,
        });
    }

    let (footprint, fetched) = if png.is_file() && footprint_path.is_file() {
        (read_footprint(&footprint_path).await?, false)
    } else {
        let tile_dir = layout.tile_dir(&item.tile_id);
        tokio::fs::create_dir_all(&tile_dir)
            .await
            .map_err(|e| PreviewError::io(&tile_dir, e))?;

        let request = options.request(&item.image_id, roi, png.clone());
        let footprint = source.fetch(&request).await?;
        write_footprint(&footprint_path, &footprint).await?;
        info!(
            image_id = %item.image_id,
            tile_id = %item.tile_id,
            source = source.name(),
            "preview fetched"
        );
        (footprint, true)
    };

    let bbox = footprint.bbox()?;
    toolchain.georeference(&png, &bbox, &tif).await?;
    if let Err(e) = tokio::fs::remove_file(&png).await {
        debug!(path = %png.display(), error = %e, "could not remove fetched preview");
    }

    Ok(PreparedItem {
        image_id: item.image_id.clone(),
        raster: tif,
        footprint: Some(footprint),
        fetched,
    })
}

async fn read_footprint(path: &Path) -> Result<Footprint, PreviewError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PreviewError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| PreviewError::FootprintFormat {
        path: path.to_path_buf(),
        source: e,
    })
}

async fn write_footprint(path: &Path, footprint: &Footprint) -> Result<(), PreviewError> {
    let content =
        serde_json::to_string_pretty(footprint).map_err(|e| PreviewError::FootprintFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| PreviewError::io(path, e))
}
