//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::defaults::MAX_COVERAGE_SAMPLES;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [paths] section
    if let Some(section) = ini.section(Some("paths")) {
        if let Some(v) = section.get("base_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.paths.base_dir = Some(expand_tilde(v));
            }
        }
        if let Some(v) = section.get("roi_name") {
            let v = v.trim();
            if !v.is_empty() {
                config.paths.roi_name = Some(v.to_string());
            }
        }
    }

    // [toolchain] section
    if let Some(section) = ini.section(Some("toolchain")) {
        if let Some(v) = section.get("bin_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.toolchain.bin_dir = Some(expand_tilde(v));
            }
        }
    }

    // [search] section
    if let Some(section) = ini.section(Some("search")) {
        if let Some(v) = section.get("collection") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("search", "collection", v, "must not be empty"));
            }
            config.search.collection = v.to_string();
        }
        if let Some(v) = section.get("cloud_threshold") {
            let threshold: f64 = v.trim().parse().map_err(|_| {
                invalid("search", "cloud_threshold", v, "must be a number between 0 and 100")
            })?;
            if !(0.0..=100.0).contains(&threshold) {
                return Err(invalid(
                    "search",
                    "cloud_threshold",
                    v,
                    "must be a number between 0 and 100",
                ));
            }
            config.search.cloud_threshold = threshold;
        }
        if let Some(v) = section.get("resolution") {
            config.search.resolution = v
                .trim()
                .parse()
                .ok()
                .filter(|r: &u32| *r > 0)
                .ok_or_else(|| {
                    invalid("search", "resolution", v, "must be a positive integer (pixels)")
                })?;
        }
        if let Some(v) = section.get("bands") {
            let bands: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(String::from)
                .collect();
            if bands.is_empty() {
                return Err(invalid(
                    "search",
                    "bands",
                    v,
                    "expected a comma separated list like 'B4,B3,B2'",
                ));
            }
            config.search.bands = bands;
        }
        if let Some(v) = section.get("order") {
            config.search.order = v
                .parse()
                .map_err(|_| invalid("search", "order", v, "must be 'catalog' or 'priority'"))?;
        }
        if let Some(v) = section.get("limit") {
            let v = v.trim();
            config.search.limit = if v.is_empty() {
                None
            } else {
                Some(v.parse().map_err(|_| {
                    invalid(
                        "search",
                        "limit",
                        v,
                        "must be a non-negative integer or empty for no limit",
                    )
                })?)
            };
        }
        if let Some(v) = section.get("progress_scale") {
            config.search.progress_scale = v.parse().map_err(|_| {
                invalid(
                    "search",
                    "progress_scale",
                    v,
                    "must be 'combinations' or 'tiles'",
                )
            })?;
        }
        if let Some(v) = section.get("require_full_coverage") {
            config.search.require_full_coverage = parse_bool(v);
        }
        if let Some(v) = section.get("coverage_samples") {
            config.search.coverage_samples = v
                .trim()
                .parse()
                .ok()
                .filter(|n: &usize| (1..=MAX_COVERAGE_SAMPLES).contains(n))
                .ok_or_else(|| {
                    invalid(
                        "search",
                        "coverage_samples",
                        v,
                        "must be an integer between 1 and 4096",
                    )
                })?;
        }
    }

    // [preview] section
    if let Some(section) = ini.section(Some("preview")) {
        if let Some(v) = section.get("source_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.preview.source_dir = Some(expand_tilde(v));
            }
        }
        if let Some(v) = section.get("mosaic_preview_size") {
            config.preview.mosaic_preview_size = v
                .trim()
                .parse()
                .ok()
                .filter(|s: &u32| *s > 0)
                .ok_or_else(|| {
                    invalid(
                        "preview",
                        "mosaic_preview_size",
                        v,
                        "must be a positive integer (pixels)",
                    )
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
