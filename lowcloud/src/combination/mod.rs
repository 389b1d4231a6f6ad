//! Lazy enumeration of tile combinations.
//!
//! For tile count `k` from 1 to the number of tiles, every ordered selection
//! of `k` distinct tiles is taken in lexicographic order, and for each
//! selection every choice of one item per tile is yielded (cartesian
//! product, rightmost tile varying fastest).
//!
//! Nothing is buffered: the iterator holds the current selection and one
//! index per selected tile, so arbitrarily large groups can be walked
//! without exhausting memory.
//!
//! ```ignore
//! let enumerator = CombinationEnumerator::new(group, EnumerationPolicy::prioritized());
//! for combination in enumerator.iter() {
//!     // build mosaic...
//! }
//! ```

mod count;
mod permutation;

pub use count::total_combinations;

use std::cmp::Ordering;

use crate::tile::{TileGroup, TileItem};
use permutation::KPermutations;

/// One candidate grouping: one item per participating tile.
///
/// `items`, `tile_names` have `tile_count` entries each and tile names are
/// pairwise distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub items: Vec<TileItem>,
    pub tile_names: Vec<String>,
    pub tile_count: usize,
}

impl Combination {
    /// Image ids in tile order.
    pub fn image_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.image_id.as_str()).collect()
    }

    /// Image ids sorted, the identity of the resulting mosaic.
    pub fn sorted_image_ids(&self) -> Vec<&str> {
        let mut ids = self.image_ids();
        ids.sort_unstable();
        ids
    }

    /// Lowest cloud percentage among the items.
    pub fn min_cloud(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.cloud_percentage)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Order in which tiles are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileOrder {
    /// Tiles in grouping order (sorted by tile id).
    Catalog,
    /// Tiles by descending score `100 - min cloud`, stable on ties;
    /// items inside each tile by ascending cloud percentage.
    #[default]
    Priority,
}

impl std::fmt::Display for TileOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileOrder::Catalog => write!(f, "catalog"),
            TileOrder::Priority => write!(f, "priority"),
        }
    }
}

impl std::str::FromStr for TileOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "catalog" => Ok(TileOrder::Catalog),
            "priority" => Ok(TileOrder::Priority),
            other => Err(format!(
                "unknown order '{}', expected 'catalog' or 'priority'",
                other
            )),
        }
    }
}

/// How combinations are ordered and capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnumerationPolicy {
    pub order: TileOrder,
    /// Maximum number of combinations to yield; `None` is unbounded.
    pub limit: Option<usize>,
}

impl EnumerationPolicy {
    /// Every combination, tiles in grouping order.
    pub fn exhaustive() -> Self {
        Self {
            order: TileOrder::Catalog,
            limit: None,
        }
    }

    /// Exhaustive order, stopping after `limit` combinations.
    pub fn bounded(limit: usize) -> Self {
        Self {
            order: TileOrder::Catalog,
            limit: Some(limit),
        }
    }

    /// Least-cloudy tiles first, unbounded.
    pub fn prioritized() -> Self {
        Self {
            order: TileOrder::Priority,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// Score of a tile: `100 - min cloud percentage` over its items.
pub fn tile_score(items: &[TileItem]) -> f64 {
    let min_cloud = items
        .iter()
        .map(|i| i.cloud_percentage)
        .fold(f64::INFINITY, f64::min);
    100.0 - min_cloud
}

/// Produces [`Combination`]s from a [`TileGroup`] under a policy.
#[derive(Debug, Clone)]
pub struct CombinationEnumerator {
    tiles: Vec<(String, Vec<TileItem>)>,
    policy: EnumerationPolicy,
}

impl CombinationEnumerator {
    pub fn new(group: TileGroup, policy: EnumerationPolicy) -> Self {
        let mut tiles = group.into_tiles();
        if policy.order == TileOrder::Priority {
            // Both sorts are stable: equal scores keep input order.
            tiles.sort_by(|(_, a), (_, b)| tile_score(b).total_cmp(&tile_score(a)));
            for (_, items) in &mut tiles {
                items.sort_by(|a, b| a.cloud_percentage.total_cmp(&b.cloud_percentage));
            }
        }
        Self { tiles, policy }
    }

    pub fn policy(&self) -> EnumerationPolicy {
        self.policy
    }

    /// Tiles in the order enumeration considers them.
    pub fn tiles(&self) -> &[(String, Vec<TileItem>)] {
        &self.tiles
    }

    /// Number of combinations [`iter`](Self::iter) yields.
    pub fn total(&self) -> u64 {
        let sizes: Vec<usize> = self.tiles.iter().map(|(_, items)| items.len()).collect();
        let total = total_combinations(&sizes);
        match self.policy.limit {
            Some(limit) => total.min(u64::try_from(limit).unwrap_or(u64::MAX)),
            None => total,
        }
    }

    /// A fresh iterator from the first combination.
    pub fn iter(&self) -> Combinations<'_> {
        Combinations::new(&self.tiles, self.policy.limit)
    }
}

impl<'a> IntoIterator for &'a CombinationEnumerator {
    type Item = Combination;
    type IntoIter = Combinations<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over combinations; see the module docs for the order.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    tiles: &'a [(String, Vec<TileItem>)],
    limit: Option<usize>,
    emitted: usize,
    k: usize,
    permutations: KPermutations,
    selection: Vec<usize>,
    choice: Vec<usize>,
    pending: bool,
    finished: bool,
}

impl<'a> Combinations<'a> {
    fn new(tiles: &'a [(String, Vec<TileItem>)], limit: Option<usize>) -> Self {
        Self {
            tiles,
            limit,
            emitted: 0,
            k: 1,
            permutations: KPermutations::new(tiles.len(), 1),
            selection: Vec::new(),
            choice: Vec::new(),
            pending: false,
            finished: tiles.is_empty(),
        }
    }

    /// Number of combinations yielded so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn build(&self) -> Combination {
        let mut items = Vec::with_capacity(self.k);
        let mut tile_names = Vec::with_capacity(self.k);
        for (&tile, &choice) in self.selection.iter().zip(&self.choice) {
            let (name, tile_items) = &self.tiles[tile];
            tile_names.push(name.clone());
            items.push(tile_items[choice].clone());
        }
        Combination {
            items,
            tile_names,
            tile_count: self.k,
        }
    }

    /// Steps the per-tile choices, rightmost first. Returns false on wrap.
    fn advance_choice(&mut self) -> bool {
        for pos in (0..self.choice.len()).rev() {
            self.choice[pos] += 1;
            if self.choice[pos] < self.tiles[self.selection[pos]].1.len() {
                return true;
            }
            self.choice[pos] = 0;
        }
        false
    }

    /// Moves to the next tile selection with items, growing `k` as needed.
    fn next_selection(&mut self) -> bool {
        loop {
            match self.permutations.next() {
                Some(selection) => {
                    if selection.iter().all(|&t| !self.tiles[t].1.is_empty()) {
                        self.choice = vec![0; selection.len()];
                        self.selection = selection;
                        return true;
                    }
                }
                None => {
                    if self.k >= self.tiles.len() {
                        return false;
                    }
                    self.k += 1;
                    self.permutations = KPermutations::new(self.tiles.len(), self.k);
                }
            }
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.finished {
            return None;
        }
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            self.finished = true;
            return None;
        }
        if !self.pending {
            if !self.next_selection() {
                self.finished = true;
                return None;
            }
            self.pending = true;
        }

        let combination = self.build();
        self.pending = self.advance_choice();
        self.emitted += 1;
        Some(combination)
    }
}

/// Orders combinations by their best cloud percentage, ascending.
pub fn by_min_cloud(a: &Combination, b: &Combination) -> Ordering {
    a.min_cloud().total_cmp(&b.min_cloud())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn group_from_sizes(sizes: &[usize]) -> TileGroup {
        let mut g = TileGroup::new();
        for (t, &n) in sizes.iter().enumerate() {
            let tile = format!("T{}", t);
            let items = (0..n)
                .map(|i| TileItem {
                    tile_id: tile.clone(),
                    image_id: format!("{}-{}", tile, i),
                    start_time: Utc::now(),
                    end_time: Utc::now(),
                    cloud_percentage: (i * 7 % 100) as f64,
                })
                .collect();
            g.insert(tile, items);
        }
        g
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// The lazy count agrees with the closed form.
        #[test]
        fn iterator_count_matches_total(sizes in prop::collection::vec(1usize..4, 0..5)) {
            let enumerator = CombinationEnumerator::new(
                group_from_sizes(&sizes),
                EnumerationPolicy::exhaustive(),
            );
            prop_assert_eq!(enumerator.iter().count() as u64, enumerator.total());
        }

        /// A bounded run yields exactly `min(limit, total)` combinations.
        #[test]
        fn bounded_count_is_exact(
            sizes in prop::collection::vec(1usize..4, 0..4),
            limit in 0usize..200,
        ) {
            let full = total_combinations(&sizes);
            let enumerator = CombinationEnumerator::new(
                group_from_sizes(&sizes),
                EnumerationPolicy::bounded(limit),
            );
            prop_assert_eq!(enumerator.iter().count() as u64, full.min(limit as u64));
        }
    }
}
