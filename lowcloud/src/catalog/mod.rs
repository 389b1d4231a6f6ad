//! Image catalog: metadata records that seed a search run.
//!
//! The remote catalog service is an external collaborator. This module
//! defines the query/record types it exchanges and the [`CatalogSource`]
//! seam, plus [`JsonCatalog`], which serves records from a catalog document
//! exported to disk.

mod json;

pub use json::JsonCatalog;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{Footprint, Roi};

/// Default image collection searched by the catalog.
pub const DEFAULT_COLLECTION: &str = "COPERNICUS/S2_SR_HARMONIZED";

/// Errors raised by catalog sources.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog document could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The catalog document is not valid JSON of a supported shape.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document's `type` is neither `Image` nor `ImageCollection`.
    #[error("unsupported catalog document type '{0}'")]
    UnsupportedType(String),

    /// The document belongs to another collection than the one queried.
    #[error("catalog holds collection '{found}', expected '{expected}'")]
    CollectionMismatch { expected: String, found: String },
}

/// One image's metadata as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Catalog image id.
    pub id: String,
    /// Grid cell the image is indexed by (MGRS tile).
    pub tile_id: String,
    /// Percentage of cloudy pixels, 0–100.
    pub cloud_percentage: f64,
    /// Acquisition start, epoch milliseconds.
    pub time_start: i64,
    /// Acquisition end, epoch milliseconds.
    pub time_end: i64,
    /// Image outline as reported by the catalog, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<Footprint>,
}

/// Parameters of a catalog query.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    /// Inclusive start date.
    pub start_date: NaiveDate,
    /// Exclusive end date.
    pub end_date: NaiveDate,
    pub roi: Roi,
    /// Only images with a cloud percentage strictly below this are returned.
    pub cloud_threshold: f64,
    pub collection_id: String,
}

impl CatalogQuery {
    /// Returns true if `record` satisfies the date, cloud and region
    /// filters.
    pub fn accepts(&self, record: &ImageRecord) -> bool {
        let start = millis_at_midnight(self.start_date);
        let end = millis_at_midnight(self.end_date);
        record.time_start >= start
            && record.time_start < end
            && record.cloud_percentage < self.cloud_threshold
            && self.overlaps_roi(record)
    }

    /// Bounding-box test of the record's footprint against the ROI.
    ///
    /// Records without a usable footprint are kept.
    fn overlaps_roi(&self, record: &ImageRecord) -> bool {
        match record.footprint.as_ref().map(Footprint::bbox) {
            Some(Ok(bbox)) => bbox.intersects(&self.roi.bbox()),
            Some(Err(_)) | None => true,
        }
    }
}

fn millis_at_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Converts epoch milliseconds to a UTC timestamp, clamping invalid values
/// to the epoch.
pub fn timestamp_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Source of image metadata records.
pub trait CatalogSource: Send + Sync {
    /// Returns the records matching `query`.
    fn query(&self, query: &CatalogQuery) -> Result<Vec<ImageRecord>, CatalogError>;
}
