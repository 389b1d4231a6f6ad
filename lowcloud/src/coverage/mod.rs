//! Coverage of the region of interest by a set of image footprints.
//!
//! The geometric measurement is delegated to a [`CoverageSource`]; the
//! [`CoverageEvaluator`] turns the measured area into a [`CoverageResult`]
//! using a fixed tolerance band, so resampling and edge artifacts do not
//! reject a mosaic that is covered for all practical purposes.

mod footprint;

pub use footprint::{FootprintCoverage, DEFAULT_MARGIN_DEG, DEFAULT_SAMPLES};

use std::sync::Arc;

use thiserror::Error;

use crate::geo::{Footprint, GeoError, Roi};

/// Minimum covered fraction of the ROI for a mosaic to count as fully
/// covered.
pub const FULL_COVERAGE_RATIO: f64 = 0.999;

/// Errors raised while measuring coverage.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// The ROI has no measurable area.
    #[error("region of interest '{0}' has no measurable area")]
    EmptyRoi(String),

    /// No footprint is known for an image of the combination.
    #[error("no footprint known for image {image_id}")]
    MissingFootprint { image_id: String },

    /// A footprint ring is not a valid polygon.
    #[error("invalid footprint: {0}")]
    InvalidFootprint(#[from] GeoError),

    /// The measurement task panicked or was cancelled.
    #[error("coverage task failed: {0}")]
    Task(String),
}

/// Raw areas reported by a coverage source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageMeasurement {
    /// Area of the ROI covered by valid pixels, km².
    pub covered_area_km2: f64,
    /// Total ROI area, km².
    pub roi_area_km2: f64,
}

impl CoverageMeasurement {
    /// Covered fraction in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        if self.roi_area_km2 <= 0.0 {
            return 0.0;
        }
        (self.covered_area_km2 / self.roi_area_km2).clamp(0.0, 1.0)
    }
}

/// Coverage of the ROI by one combination or mosaic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageResult {
    pub is_fully_covered: bool,
    /// Covered share of the ROI, 0–100.
    pub coverage_percent: f64,
    /// ROI area left uncovered, km², never negative.
    pub uncovered_area_km2: f64,
}

impl CoverageResult {
    /// Derives the result from a measurement and a full-coverage ratio.
    pub fn from_measurement(measurement: CoverageMeasurement, threshold: f64) -> Self {
        let ratio = measurement.ratio();
        let uncovered = (measurement.roi_area_km2 - measurement.covered_area_km2).max(0.0);
        Self {
            is_fully_covered: ratio >= threshold,
            coverage_percent: ratio * 100.0,
            uncovered_area_km2: uncovered,
        }
    }
}

impl std::fmt::Display for CoverageResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_fully_covered {
            write!(f, "fully covered ({:.2}%)", self.coverage_percent)
        } else {
            write!(
                f,
                "{:.2}% covered, {:.3} km² missing",
                self.coverage_percent, self.uncovered_area_km2
            )
        }
    }
}

/// Measures how much of an ROI a set of footprints covers.
pub trait CoverageSource: Send + Sync {
    fn measure(
        &self,
        roi: &Roi,
        footprints: &[Footprint],
    ) -> Result<CoverageMeasurement, CoverageError>;
}

/// Applies the full-coverage threshold to a [`CoverageSource`].
#[derive(Clone)]
pub struct CoverageEvaluator {
    source: Arc<dyn CoverageSource>,
    threshold: f64,
}

impl CoverageEvaluator {
    pub fn new(source: Arc<dyn CoverageSource>) -> Self {
        Self {
            source,
            threshold: FULL_COVERAGE_RATIO,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluates the coverage of `roi` by `footprints`.
    pub fn evaluate(
        &self,
        roi: &Roi,
        footprints: &[Footprint],
    ) -> Result<CoverageResult, CoverageError> {
        let measurement = self.source.measure(roi, footprints)?;
        Ok(CoverageResult::from_measurement(measurement, self.threshold))
    }

    /// [`evaluate`](Self::evaluate) on tokio's blocking pool, for callers
    /// running on the async worker.
    pub async fn evaluate_blocking(
        &self,
        roi: Roi,
        footprints: Vec<Footprint>,
    ) -> Result<CoverageResult, CoverageError> {
        let evaluator = self.clone();
        tokio::task::spawn_blocking(move || evaluator.evaluate(&roi, &footprints))
            .await
            .map_err(|e| CoverageError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for CoverageEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverageEvaluator")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
