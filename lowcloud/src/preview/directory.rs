//! Previews served from a local directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PreviewError, PreviewRequest, PreviewSource};
use crate::geo::{Footprint, PolygonDocument};
use crate::paths::sanitize;

/// Serves previews downloaded ahead of time.
///
/// For an image id `X` the directory holds `X.png` and `X.json`, the latter
/// being the footprint as a bare ring, a polygon geometry or a feature.
/// Path separators in ids are replaced by `_`.
#[derive(Debug, Clone)]
pub struct DirectoryPreviewSource {
    dir: PathBuf,
}

impl DirectoryPreviewSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, image_id: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", sanitize(image_id), ext))
    }
}

impl PreviewSource for DirectoryPreviewSource {
    async fn fetch(&self, request: &PreviewRequest) -> Result<Footprint, PreviewError> {
        let png = self.file(&request.image_id, "png");
        let ring = self.file(&request.image_id, "json");
        if !png.is_file() || !ring.is_file() {
            return Err(PreviewError::Unavailable {
                image_id: request.image_id.clone(),
                reason: format!("{} or {} missing", png.display(), ring.display()),
            });
        }

        let content = tokio::fs::read_to_string(&ring)
            .await
            .map_err(|e| PreviewError::io(&ring, e))?;
        let document: PolygonDocument =
            serde_json::from_str(&content).map_err(|e| PreviewError::FootprintFormat {
                path: ring.clone(),
                source: e,
            })?;
        let polygon = document.polygon()?;

        tokio::fs::copy(&png, &request.output)
            .await
            .map_err(|e| PreviewError::io(&request.output, e))?;

        debug!(
            image_id = %request.image_id,
            source = %png.display(),
            "preview copied from directory"
        );
        Ok(Footprint::new(polygon.to_closed_coordinates()))
    }

    fn name(&self) -> &str {
        "directory"
    }
}
