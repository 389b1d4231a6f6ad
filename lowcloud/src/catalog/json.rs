//! Catalog backed by a JSON document on disk.
//!
//! Three document shapes are accepted:
//!
//! - an `ImageCollection` as exported by the catalog service, with
//!   `features[]` each carrying `id` and `properties`;
//! - a single `Image` in the same shape;
//! - a flat array of [`ImageRecord`]s.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{CatalogError, CatalogQuery, CatalogSource, ImageRecord};
use crate::geo::{Footprint, PolygonDocument};

#[derive(Debug, Deserialize)]
struct ImageFeature {
    id: String,
    #[serde(default)]
    properties: ImageProperties,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageProperties {
    #[serde(rename = "MGRS_TILE")]
    mgrs_tile: Option<String>,
    #[serde(rename = "CLOUDY_PIXEL_PERCENTAGE")]
    cloudy_pixel_percentage: Option<f64>,
    #[serde(rename = "system:time_start")]
    time_start: Option<i64>,
    #[serde(rename = "system:time_end")]
    time_end: Option<i64>,
}

impl ImageFeature {
    fn into_record(self) -> Option<ImageRecord> {
        let Some(tile_id) = self.properties.mgrs_tile.filter(|t| !t.is_empty()) else {
            warn!(image_id = %self.id, "catalog image has no tile id, skipping");
            return None;
        };
        let time_start = self.properties.time_start.unwrap_or_default();
        let footprint = self.geometry.and_then(|geometry| footprint_of(&self.id, geometry));
        Some(ImageRecord {
            id: self.id,
            tile_id,
            cloud_percentage: self.properties.cloudy_pixel_percentage.unwrap_or(100.0),
            time_start,
            time_end: self.properties.time_end.unwrap_or(time_start),
            footprint,
        })
    }
}

/// Exterior ring of a feature's polygon geometry. Other geometry types are
/// ignored and the record is then not filtered by region.
fn footprint_of(image_id: &str, geometry: Value) -> Option<Footprint> {
    match serde_json::from_value::<PolygonDocument>(geometry) {
        Ok(document) => document
            .exterior()
            .map(|ring| Footprint::new(ring.to_vec())),
        Err(e) => {
            debug!(image_id, error = %e, "unsupported image geometry, ignoring");
            None
        }
    }
}

/// Catalog serving records from an exported JSON document.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    collection_id: Option<String>,
    records: Vec<ImageRecord>,
}

impl JsonCatalog {
    /// Reads and parses a catalog document.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog = Self::parse(&content)?;
        debug!(
            path = %path.display(),
            records = catalog.records.len(),
            "catalog document loaded"
        );
        Ok(catalog)
    }

    /// Parses a catalog document from a string.
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(content)?;
        if value.is_array() {
            let records: Vec<ImageRecord> = serde_json::from_value(value)?;
            return Ok(Self {
                collection_id: None,
                records,
            });
        }

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match kind.as_str() {
            "ImageCollection" => {
                let collection_id = value.get("id").and_then(Value::as_str).map(String::from);
                let features: Vec<ImageFeature> = match value.get("features") {
                    Some(features) => serde_json::from_value(features.clone())?,
                    None => Vec::new(),
                };
                Ok(Self {
                    collection_id,
                    records: features
                        .into_iter()
                        .filter_map(ImageFeature::into_record)
                        .collect(),
                })
            }
            "Image" => {
                let feature: ImageFeature = serde_json::from_value(value)?;
                Ok(Self {
                    collection_id: None,
                    records: feature.into_record().into_iter().collect(),
                })
            }
            other => Err(CatalogError::UnsupportedType(other.to_string())),
        }
    }

    /// All records in the document, unfiltered.
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Collection id declared by the document, if any.
    pub fn collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }
}

impl CatalogSource for JsonCatalog {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<ImageRecord>, CatalogError> {
        if let Some(found) = &self.collection_id {
            if found != &query.collection_id {
                return Err(CatalogError::CollectionMismatch {
                    expected: query.collection_id.clone(),
                    found: found.clone(),
                });
            }
        }

        let matched: Vec<ImageRecord> = self
            .records
            .iter()
            .filter(|r| query.accepts(r))
            .cloned()
            .collect();
        debug!(
            total = self.records.len(),
            matched = matched.len(),
            "catalog query filtered"
        );
        Ok(matched)
    }
}
