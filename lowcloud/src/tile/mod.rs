//! Tile grouping of catalog records.
//!
//! [`group_records`] stable-sorts image records by tile id and partitions
//! them into contiguous runs, so every record of a tile ends up in the same
//! group and original relative order is kept inside each group.

use chrono::{DateTime, NaiveDate, Utc};

use crate::catalog::{timestamp_from_millis, ImageRecord};

/// One image of one tile, with normalized time bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TileItem {
    pub tile_id: String,
    pub image_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub cloud_percentage: f64,
}

impl TileItem {
    pub fn from_record(record: &ImageRecord) -> Self {
        Self {
            tile_id: record.tile_id.clone(),
            image_id: record.id.clone(),
            start_time: timestamp_from_millis(record.time_start),
            end_time: timestamp_from_millis(record.time_end),
            cloud_percentage: record.cloud_percentage,
        }
    }

    /// Acquisition start as a calendar date.
    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Acquisition end as a calendar date.
    pub fn end_date(&self) -> NaiveDate {
        self.end_time.date_naive()
    }
}

/// Mapping from tile id to the tile's items.
///
/// Tile ids are unique and keep insertion order; a tile never has zero items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileGroup {
    tiles: Vec<(String, Vec<TileItem>)>,
}

impl TileGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `items` under `tile_id`, extending the tile if it exists.
    ///
    /// An empty `items` list never creates a key.
    pub fn insert(&mut self, tile_id: impl Into<String>, items: Vec<TileItem>) {
        if items.is_empty() {
            return;
        }
        let tile_id = tile_id.into();
        match self.tiles.iter_mut().find(|(id, _)| *id == tile_id) {
            Some((_, existing)) => existing.extend(items),
            None => self.tiles.push((tile_id, items)),
        }
    }

    pub fn get(&self, tile_id: &str) -> Option<&[TileItem]> {
        self.tiles
            .iter()
            .find(|(id, _)| id == tile_id)
            .map(|(_, items)| items.as_slice())
    }

    pub fn tile_ids(&self) -> impl Iterator<Item = &str> {
        self.tiles.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TileItem])> {
        self.tiles
            .iter()
            .map(|(id, items)| (id.as_str(), items.as_slice()))
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of items across all tiles.
    pub fn total_items(&self) -> usize {
        self.tiles.iter().map(|(_, items)| items.len()).sum()
    }

    /// Keeps only items matching `keep`; tiles left empty are dropped.
    pub fn retain_items(&mut self, mut keep: impl FnMut(&TileItem) -> bool) {
        for (_, items) in &mut self.tiles {
            items.retain(|item| keep(item));
        }
        self.tiles.retain(|(_, items)| !items.is_empty());
    }

    /// Consumes the group into ordered `(tile_id, items)` pairs.
    pub fn into_tiles(self) -> Vec<(String, Vec<TileItem>)> {
        self.tiles
    }
}

/// Groups image records by tile id.
pub fn group_records(records: &[ImageRecord]) -> TileGroup {
    let mut sorted: Vec<&ImageRecord> = records.iter().collect();
    // `sort_by` is stable: records of one tile keep their input order.
    sorted.sort_by(|a, b| a.tile_id.cmp(&b.tile_id));

    let mut tiles: Vec<(String, Vec<TileItem>)> = Vec::new();
    for record in sorted {
        match tiles.last_mut() {
            Some((tile_id, items)) if *tile_id == record.tile_id => {
                items.push(TileItem::from_record(record));
            }
            _ => tiles.push((record.tile_id.clone(), vec![TileItem::from_record(record)])),
        }
    }
    TileGroup { tiles }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn records() -> impl Strategy<Value = Vec<ImageRecord>> {
        prop::collection::vec(("[A-D]", 0.0f64..100.0), 0..30).prop_map(|pairs| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (tile, cloud))| ImageRecord {
                    id: format!("img-{}", i),
                    tile_id: tile,
                    cloud_percentage: cloud,
                    time_start: 0,
                    time_end: 0,
                    footprint: None,
                })
                .collect()
        })
    }

    proptest! {
        /// No tile id is split across groups or invented, and every record
        /// lands in the group of its own tile.
        #[test]
        fn grouping_is_a_partition(records in records()) {
            let group = group_records(&records);

            let keys: Vec<&str> = group.tile_ids().collect();
            let unique: HashSet<&str> = keys.iter().copied().collect();
            prop_assert_eq!(keys.len(), unique.len());

            let input_tiles: HashSet<&str> = records.iter().map(|r| r.tile_id.as_str()).collect();
            prop_assert_eq!(&unique, &input_tiles);

            prop_assert_eq!(group.total_items(), records.len());
            for (tile_id, items) in group.iter() {
                prop_assert!(items.iter().all(|i| i.tile_id == tile_id));
                // Relative order within a tile follows the input.
                let expected: Vec<&str> = records
                    .iter()
                    .filter(|r| r.tile_id == tile_id)
                    .map(|r| r.id.as_str())
                    .collect();
                let actual: Vec<&str> = items.iter().map(|i| i.image_id.as_str()).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
