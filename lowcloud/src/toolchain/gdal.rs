//! GDAL command-line toolchain.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use super::{RasterToolchain, ToolError};
use crate::geo::BoundingBox;

/// Virtual mosaic builder executable.
pub const BUILD_VRT: &str = "gdalbuildvrt";

/// Raster translation executable.
pub const TRANSLATE: &str = "gdal_translate";

/// Creation options for materialized mosaics.
const MOSAIC_CREATION_OPTIONS: [&str; 6] = [
    "-co",
    "COMPRESS=LZW",
    "-co",
    "TILED=YES",
    "-co",
    "BIGTIFF=YES",
];

/// Runs `gdalbuildvrt` and `gdal_translate` from one directory.
#[derive(Debug, Clone)]
pub struct GdalToolchain {
    bin_dir: PathBuf,
}

impl GdalToolchain {
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Full path of a tool inside the bin directory.
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        self.bin_dir
            .join(format!("{}{}", tool, std::env::consts::EXE_SUFFIX))
    }

    /// Checks that both executables exist.
    pub fn verify(&self) -> Result<(), ToolError> {
        for tool in [BUILD_VRT, TRANSLATE] {
            let path = self.tool_path(tool);
            if !path.is_file() {
                return Err(ToolError::NotFound {
                    tool: tool.to_string(),
                    path,
                });
            }
        }
        Ok(())
    }

    async fn run(&self, tool: &str, args: Vec<OsString>) -> Result<(), ToolError> {
        let path = self.tool_path(tool);
        if !path.is_file() {
            return Err(ToolError::NotFound {
                tool: tool.to_string(),
                path,
            });
        }

        debug!(tool, args = ?args, "running external tool");
        let output = Command::new(&path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::Spawn {
                tool: tool.to_string(),
                source: e,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(tool, code = ?output.status.code(), stderr = %stderr, "external tool failed");
        Err(ToolError::Failed {
            tool: tool.to_string(),
            code: output.status.code(),
            stderr,
        })
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<OsString> {
    parts.into_iter().map(OsString::from).collect()
}

impl RasterToolchain for GdalToolchain {
    async fn build_virtual_mosaic(&self, file_list: &Path, vrt: &Path) -> Result<(), ToolError> {
        let mut argv = args(["-overwrite", "-input_file_list"]);
        argv.push(file_list.into());
        argv.push(vrt.into());
        self.run(BUILD_VRT, argv).await
    }

    async fn materialize(&self, source: &Path, output: &Path) -> Result<(), ToolError> {
        let mut argv = args(MOSAIC_CREATION_OPTIONS);
        argv.push(source.into());
        argv.push(output.into());
        self.run(TRANSLATE, argv).await
    }

    async fn georeference(
        &self,
        image: &Path,
        bbox: &BoundingBox,
        output: &Path,
    ) -> Result<(), ToolError> {
        let mut argv = args(["-of", "GTiff", "-a_srs", "EPSG:4326", "-a_ullr"]);
        // Upper-left then lower-right corner.
        for value in [bbox.west, bbox.north, bbox.east, bbox.south] {
            argv.push(value.to_string().into());
        }
        argv.extend(args(["-co", "COMPRESS=LZW"]));
        argv.push(image.into());
        argv.push(output.into());
        self.run(TRANSLATE, argv).await
    }

    async fn export_png(&self, raster: &Path, output: &Path) -> Result<(), ToolError> {
        let mut argv = args(["-of", "PNG"]);
        argv.push(raster.into());
        argv.push(output.into());
        self.run(TRANSLATE, argv).await
    }
}
