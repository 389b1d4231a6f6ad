//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let base_dir = config
        .paths
        .base_dir
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();
    let roi_name = config.paths.roi_name.as_deref().unwrap_or("");
    let bin_dir = config
        .toolchain
        .bin_dir
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();
    let limit = config
        .search
        .limit
        .map(|l| l.to_string())
        .unwrap_or_default();
    let require_full_coverage = if config.search.require_full_coverage {
        "true"
    } else {
        "false"
    };
    let source_dir = config
        .preview
        .source_dir
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[paths]
; Root of all work directories. Tile previews and mosaics are written to
; <base_dir>/thumbnails/<roi_name>/
; Example: base_dir = ~/sentinel
base_dir = {}
; Region name used when the ROI file does not carry one
roi_name = {}

[toolchain]
; Directory containing gdalbuildvrt and gdal_translate
; Example: bin_dir = /usr/bin
bin_dir = {}

[search]
; Catalog collection id
collection = {}
; Images at or above this cloud percentage are ignored (0-100)
cloud_threshold = {}
; Preview size in pixels (width and height)
resolution = {}
; Comma separated preview bands
bands = {}
; Tile order during enumeration:
;   priority - tiles with the clearest best image first, clearest images first
;   catalog  - tiles and images in catalog order
order = {}
; Maximum number of combinations per run (empty = all)
limit = {}
; Progress denominator:
;   combinations - total number of combinations
;   tiles        - number of tiles
progress_scale = {}
; Skip combinations whose footprints do not cover the whole region
require_full_coverage = {}
; Coverage grid samples per axis (1-4096)
coverage_samples = {}

[preview]
; Directory of pre-downloaded previews: <image_id>.png with a <image_id>.json footprint
source_dir = {}
; Longest side of mosaic preview images in pixels
mosaic_preview_size = {}

[logging]
; Log file path
file = {}
"#,
        base_dir,
        roi_name,
        bin_dir,
        config.search.collection,
        config.search.cloud_threshold,
        config.search.resolution,
        config.search.bands.join(","),
        config.search.order,
        limit,
        config.search.progress_scale,
        require_full_coverage,
        config.search.coverage_samples,
        source_dir,
        config.preview.mosaic_preview_size,
        path_to_string(&config.logging.file),
    )
}

/// Convert a path to a string, using ~ for home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use crate::combination::TileOrder;
    use crate::search::ProgressScale;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.paths.base_dir = Some(PathBuf::from("/srv/sentinel"));
        config.paths.roi_name = Some("lake-geneva".to_string());
        config.toolchain.bin_dir = Some(PathBuf::from("/opt/gdal/bin"));
        config.search.cloud_threshold = 7.5;
        config.search.bands = vec!["B8".to_string(), "B4".to_string(), "B3".to_string()];
        config.search.order = TileOrder::Catalog;
        config.search.limit = Some(250);
        config.search.progress_scale = ProgressScale::Tiles;
        config.search.require_full_coverage = true;
        config.preview.source_dir = Some(PathBuf::from("/srv/previews"));
        config.preview.mosaic_preview_size = 800;
        config.logging.file = PathBuf::from("/var/log/lowcloud.log");

        config.save_to(&config_path).unwrap();

        let loaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let config = ConfigFile::default();
        config.save_to(&config_path).unwrap();

        let loaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(loaded.search, config.search);
        assert_eq!(loaded.paths, config.paths);
        assert!(loaded.search.limit.is_none());
    }

    #[test]
    fn test_written_file_is_commented() {
        let content = super::to_config_string(&ConfigFile::default());
        assert!(content.contains("[search]"));
        assert!(content.contains("; Tile order during enumeration:"));
        assert!(content.contains("order = priority"));
        assert!(content.contains("limit = \n"));
    }
}
