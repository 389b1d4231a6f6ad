//! Events a search run delivers to its controller.

use std::fmt;

use serde::Serialize;

use super::Progress;
use crate::mosaic::MosaicResult;

/// Why a combination was not built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    /// None of its rasters exist.
    NoInputFiles,
    /// Its footprints leave part of the ROI uncovered.
    NotCovered { coverage_percent: f64 },
    /// Coverage could not be evaluated.
    CoverageUnknown(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoInputFiles => write!(f, "no input files"),
            SkipReason::NotCovered { coverage_percent } => {
                write!(f, "covers only {:.2}% of the region", coverage_percent)
            }
            SkipReason::CoverageUnknown(reason) => write!(f, "coverage unknown: {}", reason),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Every combination was considered.
    Completed,
    /// The controller stopped the run.
    Stopped,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::Stopped => write!(f, "stopped"),
        }
    }
}

/// Totals of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub outcome: RunOutcome,
    /// Images whose preview is ready.
    pub items_prepared: usize,
    /// Images dropped because their preview could not be prepared.
    pub items_failed: usize,
    /// Combinations taken from the enumeration.
    pub combinations_considered: u64,
    /// Mosaics built (or found on disk) and emitted.
    pub mosaics_built: u64,
    /// Combinations mapping to a mosaic already handled in this run. These
    /// are part of `progress.max` without advancing `progress.current`.
    pub duplicates: u64,
    /// Combinations skipped before any tool ran.
    pub skipped: u64,
    /// Combinations whose build failed.
    pub failed: u64,
    pub progress: Progress,
}

/// One message from the worker, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SearchEvent {
    /// The preview of one image is ready.
    ItemPrepared {
        tile_id: String,
        image_id: String,
        fetched: bool,
    },
    /// The preview of one image could not be prepared; the image is
    /// excluded from the run.
    ItemFailed {
        tile_id: String,
        image_id: String,
        reason: String,
    },
    /// Enumeration begins; `progress.max` is fixed from here on.
    EnumerationStarted {
        tiles: usize,
        items: usize,
        progress: Progress,
    },
    /// A mosaic was built.
    MosaicBuilt {
        result: MosaicResult,
        progress: Progress,
    },
    /// A combination was passed over.
    CombinationSkipped {
        mosaic_id: String,
        reason: SkipReason,
    },
    /// Building a combination failed; the run goes on.
    BuildFailed {
        mosaic_id: String,
        item_ids: Vec<String>,
        error: String,
    },
    /// The run is over. Always the last event.
    Finished(SearchSummary),
}
