//! Coverage measured from image footprints by grid sampling.

use tracing::trace;

use super::{CoverageError, CoverageMeasurement, CoverageSource};
use crate::geo::{Footprint, LonLat, Polygon, Roi};

/// Default number of samples per axis.
pub const DEFAULT_SAMPLES: usize = 256;

/// Tolerance added around footprints, in degrees (about one metre).
pub const DEFAULT_MARGIN_DEG: f64 = 1e-5;

/// Estimates coverage by sampling the ROI's bounding box on a regular grid
/// and counting samples that fall inside the ROI and inside a footprint.
///
/// A sample within `margin_deg` of a footprint counts as covered.
#[derive(Debug, Clone)]
pub struct FootprintCoverage {
    samples: usize,
    margin_deg: f64,
}

impl Default for FootprintCoverage {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES)
    }
}

impl FootprintCoverage {
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(1),
            margin_deg: DEFAULT_MARGIN_DEG,
        }
    }

    pub fn with_margin(mut self, margin_deg: f64) -> Self {
        self.margin_deg = margin_deg.max(0.0);
        self
    }

    fn covered(&self, polygons: &[Polygon], p: LonLat) -> bool {
        let m = self.margin_deg;
        let probes = [
            p,
            LonLat::new(p.lon - m, p.lat),
            LonLat::new(p.lon + m, p.lat),
            LonLat::new(p.lon, p.lat - m),
            LonLat::new(p.lon, p.lat + m),
        ];
        polygons
            .iter()
            .any(|poly| probes.iter().any(|&probe| poly.contains(probe)))
    }
}

impl CoverageSource for FootprintCoverage {
    fn measure(
        &self,
        roi: &Roi,
        footprints: &[Footprint],
    ) -> Result<CoverageMeasurement, CoverageError> {
        let roi_area = roi.polygon.area_km2();
        let bbox = roi.bbox();
        if roi_area <= 0.0 || bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return Err(CoverageError::EmptyRoi(roi.name.clone()));
        }

        let search_box = bbox.expanded(self.margin_deg);
        let mut polygons = Vec::with_capacity(footprints.len());
        for footprint in footprints {
            let polygon = footprint.polygon()?;
            if polygon.bbox().intersects(&search_box) {
                polygons.push(polygon);
            }
        }

        let n = self.samples;
        let step_lon = bbox.width() / n as f64;
        let step_lat = bbox.height() / n as f64;
        let mut inside = 0usize;
        let mut covered = 0usize;
        for row in 0..n {
            let lat = bbox.south + (row as f64 + 0.5) * step_lat;
            for col in 0..n {
                let p = LonLat::new(bbox.west + (col as f64 + 0.5) * step_lon, lat);
                if !roi.polygon.contains(p) {
                    continue;
                }
                inside += 1;
                if self.covered(&polygons, p) {
                    covered += 1;
                }
            }
        }

        if inside == 0 {
            return Err(CoverageError::EmptyRoi(roi.name.clone()));
        }

        let ratio = covered as f64 / inside as f64;
        trace!(
            roi = %roi.name,
            samples = inside,
            covered,
            footprints = polygons.len(),
            "coverage sampled"
        );
        Ok(CoverageMeasurement {
            covered_area_km2: roi_area * ratio,
            roi_area_km2: roi_area,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{CoverageEvaluator, CoverageResult};
    use crate::geo::BoundingBox;
    use std::sync::Arc;

    fn roi() -> Roi {
        Roi::new(
            "square",
            Polygon::from_bbox(&BoundingBox::new(10.0, 45.0, 11.0, 46.0)),
        )
    }

    fn evaluate(footprints: &[Footprint]) -> CoverageResult {
        CoverageEvaluator::new(Arc::new(FootprintCoverage::new(64)))
            .evaluate(&roi(), footprints)
            .unwrap()
    }

    #[test]
    fn test_exact_footprint_is_fully_covered() {
        let result = evaluate(&[Footprint::from_bbox(&BoundingBox::new(10.0, 45.0, 11.0, 46.0))]);
        assert!(result.is_fully_covered);
        assert_eq!(result.uncovered_area_km2, 0.0);
    }

    #[test]
    fn test_two_halves_cover_the_roi() {
        let result = evaluate(&[
            Footprint::from_bbox(&BoundingBox::new(9.5, 44.5, 10.5, 46.5)),
            Footprint::from_bbox(&BoundingBox::new(10.5, 44.5, 11.5, 46.5)),
        ]);
        assert!(result.is_fully_covered, "{}", result);
    }

    #[test]
    fn test_half_covered() {
        let result = evaluate(&[Footprint::from_bbox(&BoundingBox::new(9.0, 44.0, 10.5, 47.0))]);
        assert!(!result.is_fully_covered);
        assert!((result.coverage_percent - 50.0).abs() < 1.0);
        assert!(result.uncovered_area_km2 > 0.0);
    }

    #[test]
    fn test_no_footprints() {
        let result = evaluate(&[]);
        assert!(!result.is_fully_covered);
        assert_eq!(result.coverage_percent, 0.0);
    }

    #[test]
    fn test_distant_footprint_is_ignored() {
        let result = evaluate(&[Footprint::from_bbox(&BoundingBox::new(50.0, 0.0, 51.0, 1.0))]);
        assert_eq!(result.coverage_percent, 0.0);
    }

    #[test]
    fn test_invalid_footprint() {
        let err = FootprintCoverage::new(8)
            .measure(&roi(), &[Footprint::new(vec![[0.0, 0.0], [1.0, 1.0]])])
            .unwrap_err();
        assert!(matches!(err, CoverageError::InvalidFootprint(_)));
    }

    #[test]
    fn test_degenerate_roi() {
        let flat = Roi::new(
            "flat",
            Polygon::from_coordinates(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]).unwrap(),
        );
        let err = FootprintCoverage::new(8).measure(&flat, &[]).unwrap_err();
        assert!(matches!(err, CoverageError::EmptyRoi(name) if name == "flat"));
    }
}
