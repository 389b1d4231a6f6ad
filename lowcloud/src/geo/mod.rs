//! Geographic primitives for regions of interest and image footprints.
//!
//! All coordinates are `[lon, lat]` pairs in decimal degrees (EPSG:4326),
//! matching the footprints returned by the imagery catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Errors raised when building geometry from external input.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    /// A ring needs at least three distinct vertices.
    #[error("polygon ring needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// A coordinate is not a finite lon/lat value.
    #[error("invalid coordinate [{lon}, {lat}]")]
    InvalidCoordinate { lon: f64, lat: f64 },

    /// The document is valid JSON but not a polygon.
    #[error("geometry is not a polygon")]
    NotAPolygon,
}

/// A point in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Returns true if the two boxes share any area or edge.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.west <= other.east
            && other.west <= self.east
            && self.south <= other.north
            && other.south <= self.north
    }

    /// Returns the box grown by `margin` degrees on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(
            self.west - margin,
            self.south - margin,
            self.east + margin,
            self.north + margin,
        )
    }

    pub fn contains(&self, p: LonLat) -> bool {
        p.lon >= self.west && p.lon <= self.east && p.lat >= self.south && p.lat <= self.north
    }
}

/// A simple polygon described by its exterior ring.
///
/// The ring is stored open (the closing vertex is dropped if present).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<LonLat>,
}

impl Polygon {
    /// Builds a polygon from `[lon, lat]` pairs, closed or open.
    pub fn from_coordinates(coords: &[[f64; 2]]) -> Result<Self, GeoError> {
        let mut ring: Vec<LonLat> = Vec::with_capacity(coords.len());
        for &[lon, lat] in coords {
            if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 || lon.abs() > 360.0 {
                return Err(GeoError::InvalidCoordinate { lon, lat });
            }
            ring.push(LonLat::new(lon, lat));
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(GeoError::TooFewVertices(ring.len()));
        }
        Ok(Self { ring })
    }

    /// Builds the rectangle covering `bbox`.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self {
            ring: vec![
                LonLat::new(bbox.west, bbox.south),
                LonLat::new(bbox.east, bbox.south),
                LonLat::new(bbox.east, bbox.north),
                LonLat::new(bbox.west, bbox.north),
            ],
        }
    }

    /// Open exterior ring.
    pub fn vertices(&self) -> &[LonLat] {
        &self.ring
    }

    /// Closed ring as `[lon, lat]` pairs, first vertex repeated at the end.
    pub fn to_closed_coordinates(&self) -> Vec<[f64; 2]> {
        let mut coords: Vec<[f64; 2]> = self.ring.iter().map(|p| [p.lon, p.lat]).collect();
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
        coords
    }

    pub fn bbox(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for p in &self.ring {
            bbox.west = bbox.west.min(p.lon);
            bbox.east = bbox.east.max(p.lon);
            bbox.south = bbox.south.min(p.lat);
            bbox.north = bbox.north.max(p.lat);
        }
        bbox
    }

    /// Even-odd point-in-polygon test. Points on an edge may land either side.
    pub fn contains(&self, p: LonLat) -> bool {
        let mut inside = false;
        let n = self.ring.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = self.ring[i];
            let b = self.ring[j];
            if (a.lat > p.lat) != (b.lat > p.lat) {
                let cross = (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon;
                if p.lon < cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Approximate area in km² on a spherical Earth.
    ///
    /// Uses the spherical excess formula for a ring of geodesic-ish edges,
    /// accurate to well under a percent for tile-sized regions.
    pub fn area_km2(&self) -> f64 {
        let n = self.ring.len();
        let mut sum = 0.0;
        for i in 0..n {
            let p1 = self.ring[i];
            let p2 = self.ring[(i + 1) % n];
            sum += (p2.lon - p1.lon).to_radians()
                * (2.0 + p1.lat.to_radians().sin() + p2.lat.to_radians().sin());
        }
        (sum * EARTH_RADIUS_KM * EARTH_RADIUS_KM / 2.0).abs()
    }
}

/// The geographic footprint of one image preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Closed ring of `[lon, lat]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

impl Footprint {
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self { coordinates }
    }

    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self::new(Polygon::from_bbox(bbox).to_closed_coordinates())
    }

    /// Bounding box of the footprint ring, used for georeferencing.
    pub fn bbox(&self) -> Result<BoundingBox, GeoError> {
        Ok(self.polygon()?.bbox())
    }

    pub fn polygon(&self) -> Result<Polygon, GeoError> {
        Polygon::from_coordinates(&self.coordinates)
    }
}

/// Region of interest the mosaic must cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    /// Short name, used as the work directory name.
    pub name: String,
    pub polygon: Polygon,
}

impl Roi {
    pub fn new(name: impl Into<String>, polygon: Polygon) -> Self {
        Self {
            name: name.into(),
            polygon,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        self.polygon.bbox()
    }
}

/// Accepted on-disk shapes for a polygon ring: a bare ring, a GeoJSON polygon
/// geometry, or a GeoJSON feature wrapping one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PolygonDocument {
    Ring(Vec<[f64; 2]>),
    Geometry {
        #[serde(rename = "type")]
        kind: String,
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    Feature {
        geometry: Box<PolygonDocument>,
    },
}

impl PolygonDocument {
    /// Extracts the exterior ring.
    pub fn exterior(&self) -> Option<&[[f64; 2]]> {
        match self {
            Self::Ring(ring) => Some(ring),
            Self::Geometry { kind, coordinates } if kind == "Polygon" => {
                coordinates.first().map(Vec::as_slice)
            }
            Self::Geometry { .. } => None,
            Self::Feature { geometry } => geometry.exterior(),
        }
    }

    /// Builds the polygon of the exterior ring.
    pub fn polygon(&self) -> Result<Polygon, GeoError> {
        let ring = self.exterior().ok_or(GeoError::NotAPolygon)?;
        Polygon::from_coordinates(ring)
    }
}
