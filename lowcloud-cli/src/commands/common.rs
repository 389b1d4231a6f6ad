//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use lowcloud::combination::{EnumerationPolicy, TileOrder};
use lowcloud::config::ConfigFile;
use lowcloud::search::SearchConfig;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Tile order selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OrderArg {
    /// Tiles and images in catalog order
    Catalog,
    /// Clearest tiles first, clearest images first within a tile
    Priority,
}

impl From<OrderArg> for TileOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Catalog => TileOrder::Catalog,
            OrderArg::Priority => TileOrder::Priority,
        }
    }
}

/// Region, catalog and date window of a search.
#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// Region of interest: GeoJSON polygon, feature, or bare ring
    #[arg(long)]
    pub roi: PathBuf,

    /// Region name used for the work directory (default: config roi_name, then file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Catalog document (ImageCollection, Image, or record array)
    #[arg(long)]
    pub catalog: PathBuf,

    /// First acquisition date (inclusive), YYYY-MM-DD
    #[arg(long)]
    pub start: NaiveDate,

    /// End of the acquisition window (exclusive), YYYY-MM-DD
    #[arg(long)]
    pub end: NaiveDate,

    /// Ignore images at or above this cloud percentage (overrides config)
    #[arg(long)]
    pub cloud_threshold: Option<f64>,
}

/// Order and bound of the enumeration.
#[derive(Debug, Clone, Args)]
pub struct EnumerationArgs {
    /// Tile order (overrides config)
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Maximum number of combinations (overrides config)
    #[arg(long)]
    pub limit: Option<usize>,
}

impl EnumerationArgs {
    /// Resolve the enumeration policy: CLI takes precedence, then config.
    pub fn policy(&self, config: &ConfigFile) -> EnumerationPolicy {
        EnumerationPolicy {
            order: self
                .order
                .map(TileOrder::from)
                .unwrap_or(config.search.order),
            limit: self.limit.or(config.search.limit),
        }
    }
}

/// Build the run configuration from CLI args and config.
pub fn resolve_search_config(
    runner: &CliRunner,
    query: &QueryArgs,
    enumeration: &EnumerationArgs,
) -> Result<SearchConfig, CliError> {
    if query.start >= query.end {
        return Err(CliError::Config(format!(
            "--start {} must be before --end {}",
            query.start, query.end
        )));
    }
    if let Some(threshold) = query.cloud_threshold {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(CliError::Config(format!(
                "--cloud-threshold {} must be between 0 and 100",
                threshold
            )));
        }
    }

    let config = runner.config();
    let roi = runner.load_roi(&query.roi, query.name.as_deref())?;
    let mut search = config.search_config(roi, query.start, query.end);
    if let Some(threshold) = query.cloud_threshold {
        search.cloud_threshold = threshold;
    }
    search.policy = enumeration.policy(config);
    Ok(search)
}
