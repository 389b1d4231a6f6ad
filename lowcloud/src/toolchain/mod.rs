//! External raster toolchain.
//!
//! Mosaics are assembled by two command-line tools: one that builds a
//! virtual mosaic descriptor from a list of input rasters, and one that
//! materializes a descriptor (or any raster) into a single file. The
//! [`RasterToolchain`] trait is the seam; [`GdalToolchain`] spawns the GDAL
//! executables from a configured directory.

mod gdal;

pub use gdal::{GdalToolchain, BUILD_VRT, TRANSLATE};

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geo::BoundingBox;

/// Failure of one external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable does not exist at the expected path.
    #[error("{tool} not found at {}", .path.display())]
    NotFound { tool: String, path: PathBuf },

    /// The executable exists but could not be started.
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited unsuccessfully.
    #[error("{tool} failed ({}): {stderr}", exit_code_text(.code))]
    Failed {
        tool: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_code_text(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Operations the mosaic pipeline needs from a raster toolchain.
///
/// Every call blocks the caller until the tool has finished; the pipeline
/// never runs two invocations at once.
pub trait RasterToolchain: Send + Sync {
    /// Builds a virtual mosaic at `vrt` from the rasters listed one per line
    /// in `file_list`. Overwrites an existing descriptor.
    fn build_virtual_mosaic(
        &self,
        file_list: &Path,
        vrt: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;

    /// Writes `source` as a compressed, tiled, large-file capable GeoTIFF.
    fn materialize(
        &self,
        source: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;

    /// Writes a GeoTIFF of `image` whose pixel grid spans `bbox` in
    /// EPSG:4326.
    fn georeference(
        &self,
        image: &Path,
        bbox: &BoundingBox,
        output: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;

    /// Exports `raster` as a full-size PNG.
    fn export_png(
        &self,
        raster: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::Failed {
            tool: "gdal_translate".to_string(),
            code: Some(1),
            stderr: "ERROR 4: no such file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "gdal_translate failed (exit code 1): ERROR 4: no such file"
        );

        let err = ToolError::Failed {
            tool: "gdalbuildvrt".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));

        let err = ToolError::NotFound {
            tool: "gdalbuildvrt".to_string(),
            path: PathBuf::from("/opt/gdal/bin/gdalbuildvrt"),
        };
        assert_eq!(
            err.to_string(),
            "gdalbuildvrt not found at /opt/gdal/bin/gdalbuildvrt"
        );
    }
}
