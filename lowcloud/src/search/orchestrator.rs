//! The search worker.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::progress::ProgressCounter;
use super::{
    ProgressScale, RunOutcome, SearchConfig, SearchError, SearchEvent, SearchHandle,
    SearchSummary, SkipReason,
};
use crate::catalog::{CatalogSource, ImageRecord};
use crate::combination::{Combination, CombinationEnumerator};
use crate::control::{Checkpoint, RunControl};
use crate::coverage::{CoverageError, CoverageEvaluator, CoverageSource, FootprintCoverage};
use crate::geo::Footprint;
use crate::mosaic::{MosaicBuilder, MosaicError};
use crate::paths::{ConfigurationError, WorkLayout};
use crate::preview::{prepare_item, PreviewSource};
use crate::tile::{group_records, TileGroup};
use crate::toolchain::RasterToolchain;

/// Runs searches: catalog query, preview preparation, enumeration and
/// mosaic building, under a shared [`RunControl`].
pub struct SearchOrchestrator<P, T> {
    config: SearchConfig,
    catalog: Arc<dyn CatalogSource>,
    previews: Arc<P>,
    toolchain: Arc<T>,
    coverage: CoverageEvaluator,
    control: RunControl,
    active: Arc<AtomicBool>,
}

/// Marks the orchestrator's worker as alive until dropped.
///
/// The worker owns it, so it is released when the worker finishes, panics
/// or is dropped with its runtime.
struct ActiveRun(Arc<AtomicBool>);

impl ActiveRun {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P, T> SearchOrchestrator<P, T>
where
    P: PreviewSource + 'static,
    T: RasterToolchain + 'static,
{
    pub fn new(
        config: SearchConfig,
        catalog: Arc<dyn CatalogSource>,
        previews: Arc<P>,
        toolchain: Arc<T>,
    ) -> Self {
        let coverage =
            CoverageEvaluator::new(Arc::new(FootprintCoverage::new(config.coverage_samples)));
        Self {
            config,
            catalog,
            previews,
            toolchain,
            coverage,
            control: RunControl::new(),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the footprint-sampling coverage source.
    pub fn with_coverage_source(mut self, source: Arc<dyn CoverageSource>) -> Self {
        self.coverage = CoverageEvaluator::new(source);
        self
    }

    /// Uses an existing control instead of a private one.
    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn validate(&self) -> Result<WorkLayout, ConfigurationError> {
        let layout = self.config.paths.validate()?;
        if self.config.start_date >= self.config.end_date {
            return Err(ConfigurationError::Invalid(format!(
                "start date {} is not before end date {}",
                self.config.start_date, self.config.end_date
            )));
        }
        if self.config.preview.resolution == 0 {
            return Err(ConfigurationError::Invalid(
                "preview resolution must be positive".to_string(),
            ));
        }
        Ok(layout)
    }

    /// Validates the configuration, queries the catalog and starts the
    /// worker on the current tokio runtime.
    ///
    /// Configuration and catalog errors are returned before any work is
    /// done; everything after that is reported through events.
    ///
    /// Only one run may be active at a time. A stopped run stays active
    /// until its worker has left its current build, so callers wait for the
    /// previous handle before starting again.
    pub fn start(&self) -> Result<SearchHandle, SearchError> {
        let layout = self.validate()?;
        if !self.control.state().is_inactive() {
            return Err(SearchError::AlreadyRunning);
        }
        let active = ActiveRun::acquire(&self.active).ok_or(SearchError::AlreadyRunning)?;
        let records = self.catalog.query(&self.config.catalog_query())?;
        info!(
            roi = %self.config.roi.name,
            records = records.len(),
            work_dir = %layout.roi_dir().display(),
            "starting search"
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let worker = Worker {
            _active: active,
            builder: MosaicBuilder::new(
                Arc::clone(&self.toolchain),
                layout.clone(),
                self.config.preview.resolution,
            )
            .with_preview_size(self.config.mosaic_preview_size),
            config: self.config.clone(),
            layout,
            records,
            previews: Arc::clone(&self.previews),
            toolchain: Arc::clone(&self.toolchain),
            coverage: self.coverage.clone(),
            control: self.control.clone(),
            events: events_tx,
        };

        self.control.start_new_task();
        let task = tokio::spawn(worker.run());
        Ok(SearchHandle::new(self.control.clone(), events_rx, task))
    }
}

/// Counters of one run, reset for every start.
#[derive(Debug, Default)]
struct RunCounters {
    items_prepared: usize,
    items_failed: usize,
    considered: u64,
    duplicates: u64,
    skipped: u64,
    failed: u64,
}

// `_active` is declared first so it is released before the event sender
// closes the channel.
struct Worker<P, T> {
    _active: ActiveRun,
    config: SearchConfig,
    layout: WorkLayout,
    records: Vec<ImageRecord>,
    previews: Arc<P>,
    toolchain: Arc<T>,
    builder: MosaicBuilder<T>,
    coverage: CoverageEvaluator,
    control: RunControl,
    events: mpsc::UnboundedSender<SearchEvent>,
}

impl<P, T> Worker<P, T>
where
    P: PreviewSource,
    T: RasterToolchain,
{
    fn emit(&self, event: SearchEvent) {
        if self.events.send(event).is_err() {
            debug!("search event receiver dropped");
        }
    }

    async fn run(self) -> SearchSummary {
        let mut counters = RunCounters::default();
        let group = group_records(&self.records);
        info!(
            tiles = group.len(),
            items = group.total_items(),
            "catalog records grouped"
        );

        let prepared = self.prepare(group, &mut counters).await;
        let (group, footprints) = match prepared {
            Some(prepared) => prepared,
            None => return self.finish(RunOutcome::Stopped, counters, None),
        };

        let tiles = group.len();
        let items = group.total_items();
        let enumerator = CombinationEnumerator::new(group, self.config.policy);
        let max = match self.config.progress_scale {
            ProgressScale::Combinations => enumerator.total(),
            ProgressScale::Tiles => tiles as u64,
        };
        let mut progress = ProgressCounter::new(max);
        info!(
            tiles,
            items,
            max,
            order = %self.config.policy.order,
            limit = ?self.config.policy.limit,
            "enumerating combinations"
        );
        self.emit(SearchEvent::EnumerationStarted {
            tiles,
            items,
            progress: progress.snapshot(),
        });

        let mut seen: HashSet<String> = HashSet::new();
        let mut outcome = RunOutcome::Completed;
        for combination in enumerator.iter() {
            if self.control.checkpoint().await == Checkpoint::Halt {
                outcome = RunOutcome::Stopped;
                break;
            }
            counters.considered += 1;

            let mosaic_id = self.builder.id_for(&combination);
            if !seen.insert(mosaic_id.clone()) {
                counters.duplicates += 1;
                continue;
            }

            if self.config.require_full_coverage {
                if let Some(reason) = self.coverage_gap(&combination, &footprints).await {
                    debug!(mosaic_id = %mosaic_id, reason = %reason, "combination skipped");
                    counters.skipped += 1;
                    self.emit(SearchEvent::CombinationSkipped { mosaic_id, reason });
                    continue;
                }
            }

            match self.builder.build(&combination).await {
                Ok(result) => {
                    let snapshot = progress.advance();
                    self.emit(SearchEvent::MosaicBuilt {
                        result,
                        progress: snapshot,
                    });
                }
                Err(MosaicError::NoInputFiles) => {
                    warn!(mosaic_id = %mosaic_id, "no input files, combination skipped");
                    counters.skipped += 1;
                    self.emit(SearchEvent::CombinationSkipped {
                        mosaic_id,
                        reason: SkipReason::NoInputFiles,
                    });
                }
                Err(e) => {
                    error!(mosaic_id = %mosaic_id, error = %e, "mosaic build failed");
                    counters.failed += 1;
                    self.emit(SearchEvent::BuildFailed {
                        mosaic_id,
                        item_ids: combination
                            .items
                            .iter()
                            .map(|i| i.image_id.clone())
                            .collect(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.finish(outcome, counters, Some(progress))
    }

    /// Ensures every item's preview exists. Items that fail are dropped
    /// from the group. Returns `None` if the run was stopped meanwhile.
    async fn prepare(
        &self,
        mut group: TileGroup,
        counters: &mut RunCounters,
    ) -> Option<(TileGroup, HashMap<String, Footprint>)> {
        let mut footprints = HashMap::new();
        let mut failed: HashSet<String> = HashSet::new();

        for (tile_id, items) in group.iter() {
            for item in items {
                if self.control.checkpoint().await == Checkpoint::Halt {
                    return None;
                }
                match prepare_item(
                    self.previews.as_ref(),
                    self.toolchain.as_ref(),
                    &self.layout,
                    &self.config.roi,
                    &self.config.preview,
                    item,
                )
                .await
                {
                    Ok(prepared) => {
                        counters.items_prepared += 1;
                        if let Some(footprint) = prepared.footprint {
                            footprints.insert(item.image_id.clone(), footprint);
                        }
                        self.emit(SearchEvent::ItemPrepared {
                            tile_id: tile_id.to_string(),
                            image_id: item.image_id.clone(),
                            fetched: prepared.fetched,
                        });
                    }
                    Err(e) => {
                        warn!(
                            tile_id,
                            image_id = %item.image_id,
                            error = %e,
                            "preview preparation failed, excluding image"
                        );
                        counters.items_failed += 1;
                        failed.insert(item.image_id.clone());
                        self.emit(SearchEvent::ItemFailed {
                            tile_id: tile_id.to_string(),
                            image_id: item.image_id.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        group.retain_items(|item| !failed.contains(&item.image_id));
        Some((group, footprints))
    }

    /// Returns why `combination` cannot cover the ROI, if it cannot.
    async fn coverage_gap(
        &self,
        combination: &Combination,
        footprints: &HashMap<String, Footprint>,
    ) -> Option<SkipReason> {
        let mut rings = Vec::with_capacity(combination.tile_count);
        for item in &combination.items {
            match footprints.get(&item.image_id) {
                Some(footprint) => rings.push(footprint.clone()),
                None => {
                    let err = CoverageError::MissingFootprint {
                        image_id: item.image_id.clone(),
                    };
                    return Some(SkipReason::CoverageUnknown(err.to_string()));
                }
            }
        }

        match self
            .coverage
            .evaluate_blocking(self.config.roi.clone(), rings)
            .await
        {
            Ok(result) if result.is_fully_covered => None,
            Ok(result) => Some(SkipReason::NotCovered {
                coverage_percent: result.coverage_percent,
            }),
            Err(e) => Some(SkipReason::CoverageUnknown(e.to_string())),
        }
    }

    fn finish(
        &self,
        outcome: RunOutcome,
        counters: RunCounters,
        progress: Option<ProgressCounter>,
    ) -> SearchSummary {
        if outcome == RunOutcome::Completed {
            // Nothing left to run.
            self.control.stop_task();
        }
        let (mosaics_built, snapshot) = match &progress {
            Some(p) => (p.processed(), p.snapshot()),
            None => (0, Default::default()),
        };
        let summary = SearchSummary {
            outcome,
            items_prepared: counters.items_prepared,
            items_failed: counters.items_failed,
            combinations_considered: counters.considered,
            mosaics_built,
            duplicates: counters.duplicates,
            skipped: counters.skipped,
            failed: counters.failed,
            progress: snapshot,
        };
        info!(
            outcome = %summary.outcome,
            built = summary.mosaics_built,
            failed = summary.failed,
            skipped = summary.skipped,
            "search finished"
        );
        self.emit(SearchEvent::Finished(summary.clone()));
        summary
    }
}
