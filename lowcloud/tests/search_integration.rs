//! Integration tests for complete search runs.
//!
//! These tests drive the orchestrator end to end with in-process fakes for
//! the catalog, the preview source and the raster toolchain:
//! - Prepare → Enumerate → Build with deduplication and caching
//! - Pause / resume / stop at combination boundaries
//! - Per-item and per-combination failures that do not abort the run
//! - Configuration errors raised before any work
//!
//! Run with: `cargo test --test search_integration`

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tempfile::TempDir;

use lowcloud::catalog::{CatalogError, CatalogQuery, CatalogSource, ImageRecord};
use lowcloud::combination::EnumerationPolicy;
use lowcloud::control::RunState;
use lowcloud::geo::{BoundingBox, Footprint, Polygon, Roi};
use lowcloud::mosaic::mosaic_id;
use lowcloud::paths::{ConfigurationError, DataPaths};
use lowcloud::preview::{PreviewError, PreviewRequest, PreviewSource};
use lowcloud::search::{
    ProgressScale, RunOutcome, SearchConfig, SearchError, SearchEvent, SearchHandle,
    SearchOrchestrator, SearchSummary, SkipReason,
};
use lowcloud::toolchain::{RasterToolchain, ToolError};

// ============================================================================
// Test Helpers
// ============================================================================

const ROI_NAME: &str = "test-roi";

/// Catalog serving a fixed list of records through the query filter.
struct FixedCatalog {
    records: Vec<ImageRecord>,
    queries: AtomicUsize,
}

impl FixedCatalog {
    fn new(records: Vec<ImageRecord>) -> Self {
        Self {
            records,
            queries: AtomicUsize::new(0),
        }
    }
}

impl CatalogSource for FixedCatalog {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<ImageRecord>, CatalogError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .iter()
            .filter(|r| query.accepts(r))
            .cloned()
            .collect())
    }
}

/// Preview source writing a placeholder PNG and returning a fixed footprint.
struct FakePreviews {
    footprints: HashMap<String, BoundingBox>,
    unavailable: HashSet<String>,
    fetches: AtomicUsize,
}

impl FakePreviews {
    fn covering(bbox: BoundingBox, ids: &[&str]) -> Self {
        Self {
            footprints: ids.iter().map(|id| (id.to_string(), bbox)).collect(),
            unavailable: HashSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    fn with_footprint(mut self, id: &str, bbox: BoundingBox) -> Self {
        self.footprints.insert(id.to_string(), bbox);
        self
    }

    fn without(mut self, id: &str) -> Self {
        self.unavailable.insert(id.to_string());
        self
    }
}

impl PreviewSource for FakePreviews {
    async fn fetch(&self, request: &PreviewRequest) -> Result<Footprint, PreviewError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.contains(&request.image_id) {
            return Err(PreviewError::Unavailable {
                image_id: request.image_id.clone(),
                reason: "HTTP 503".to_string(),
            });
        }
        std::fs::write(&request.output, b"png").unwrap();
        let bbox = self.footprints[&request.image_id];
        Ok(Footprint::from_bbox(&bbox))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Toolchain writing plausible outputs. Materializing fails for any list
/// that names a raster of the poisoned image.
#[derive(Default)]
struct FakeToolchain {
    poison: Option<String>,
    invocations: AtomicUsize,
}

impl FakeToolchain {
    fn poisoned(image_id: &str) -> Self {
        Self {
            poison: Some(format!("{}_", image_id)),
            ..Default::default()
        }
    }
}

impl RasterToolchain for FakeToolchain {
    async fn build_virtual_mosaic(&self, file_list: &Path, vrt: &Path) -> Result<(), ToolError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let inputs = std::fs::read_to_string(file_list).unwrap();
        std::fs::write(vrt, inputs).unwrap();
        Ok(())
    }

    async fn materialize(&self, source: &Path, output: &Path) -> Result<(), ToolError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let content = std::fs::read_to_string(source).unwrap();
        if let Some(poison) = &self.poison {
            if content.contains(poison.as_str()) {
                std::fs::write(output, b"partial").unwrap();
                return Err(ToolError::Failed {
                    tool: "gdal_translate".to_string(),
                    code: Some(1),
                    stderr: "ERROR 4: corrupt input".to_string(),
                });
            }
        }
        std::fs::write(output, b"tif").unwrap();
        Ok(())
    }

    async fn georeference(
        &self,
        _image: &Path,
        _bbox: &BoundingBox,
        output: &Path,
    ) -> Result<(), ToolError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        std::fs::write(output, b"tile").unwrap();
        Ok(())
    }

    async fn export_png(&self, _raster: &Path, output: &Path) -> Result<(), ToolError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        image::RgbImage::new(64, 32).save(output).unwrap();
        Ok(())
    }
}

struct Workspace {
    _dir: TempDir,
    base: PathBuf,
    bin: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("data");
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        Self {
            _dir: dir,
            base,
            bin,
        }
    }

    fn paths(&self) -> DataPaths {
        DataPaths {
            base_dir: Some(self.base.clone()),
            roi_name: Some(ROI_NAME.to_string()),
            toolchain_dir: Some(self.bin.clone()),
        }
    }

    fn config(&self) -> SearchConfig {
        SearchConfig::new(self.paths(), roi(), date(2024, 6, 1), date(2024, 7, 1))
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn roi_bbox() -> BoundingBox {
    BoundingBox::new(10.0, 45.0, 12.0, 46.0)
}

fn roi() -> Roi {
    Roi::new(ROI_NAME, Polygon::from_bbox(&roi_bbox()))
}

fn record(id: &str, tile: &str, cloud: f64) -> ImageRecord {
    let start = date(2024, 6, 10)
        .and_hms_opt(10, 30, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis();
    ImageRecord {
        id: id.to_string(),
        tile_id: tile.to_string(),
        cloud_percentage: cloud,
        time_start: start,
        time_end: start + 5_000,
        footprint: None,
    }
}

/// Two tiles: `32TMS` with a1 (5%) and a2 (10%), `32TNS` with b1 (3%).
///
/// The enumeration yields 7 combinations over 5 distinct image sets.
fn two_tile_catalog() -> Arc<FixedCatalog> {
    Arc::new(FixedCatalog::new(vec![
        record("a1", "32TMS", 5.0),
        record("a2", "32TMS", 10.0),
        record("b1", "32TNS", 3.0),
        // Filtered out by the catalog query
        record("a3", "32TMS", 80.0),
    ]))
}

fn all_ids() -> [&'static str; 3] {
    ["a1", "a2", "b1"]
}

fn start<P, T>(
    config: SearchConfig,
    catalog: Arc<FixedCatalog>,
    previews: Arc<P>,
    toolchain: Arc<T>,
) -> SearchHandle
where
    P: PreviewSource + 'static,
    T: RasterToolchain + 'static,
{
    SearchOrchestrator::new(config, catalog, previews, toolchain)
        .start()
        .unwrap()
}

/// Collects every remaining event until the worker hangs up.
async fn drain(handle: &mut SearchHandle) -> Vec<SearchEvent> {
    tokio::time::timeout(Duration::from_secs(30), async {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        events
    })
    .await
    .expect("search did not finish in time")
}

fn summary(events: &[SearchEvent]) -> &SearchSummary {
    match events.last() {
        Some(SearchEvent::Finished(summary)) => summary,
        other => panic!("last event is not Finished: {:?}", other),
    }
}

fn built(events: &[SearchEvent]) -> Vec<&lowcloud::mosaic::MosaicResult> {
    events
        .iter()
        .filter_map(|e| match e {
            SearchEvent::MosaicBuilt { result, .. } => Some(result),
            _ => None,
        })
        .collect()
}

fn sorted_ids(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids
}

// ============================================================================
// Complete runs
// ============================================================================

#[tokio::test]
async fn test_run_builds_each_image_set_once() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let mut handle = start(
        ws.config(),
        two_tile_catalog(),
        previews,
        Arc::new(FakeToolchain::default()),
    );

    let events = drain(&mut handle).await;
    let summary = summary(&events);

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.items_prepared, 3);
    assert_eq!(summary.combinations_considered, 7);
    assert_eq!(summary.mosaics_built, 5);
    assert_eq!(summary.duplicates, 2);
    assert_eq!(summary.progress.max, 7);
    assert_eq!(summary.progress.current, 5);
    assert_eq!(
        summary.progress.current + summary.duplicates,
        summary.progress.max
    );

    // Best tile (b1 at 3%) first, then the other tile's clearest image.
    let results = built(&events);
    assert_eq!(results[0].item_ids, vec!["b1"]);
    assert_eq!(results[1].item_ids, vec!["a1"]);
    assert_eq!(results[2].item_ids, vec!["a2"]);
    assert_eq!(results[3].item_ids, vec!["b1", "a1"]);
    assert_eq!(results[3].tile_names, vec!["32TNS", "32TMS"]);

    let distinct: HashSet<Vec<String>> =
        results.iter().map(|r| sorted_ids(&r.item_ids)).collect();
    assert_eq!(distinct.len(), results.len());

    for result in &results {
        assert!(!result.reused);
        assert!(result.preview_path.is_file());
        assert!(result.raster_path.is_file());
        assert_eq!(result.id, mosaic_id(result.item_ids.as_slice()));
    }

    // Nothing but final mosaics in the mosaic directory.
    let mosaic_dir = ws.base.join("thumbnails").join(ROI_NAME).join("mosaic");
    let mut names: Vec<String> = std::fs::read_dir(&mosaic_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names.len(), 10);
    assert!(names
        .iter()
        .all(|n| n.ends_with(".tif") || n.ends_with(".png")));
    assert!(names.iter().all(|n| !n.contains(".full.")));

    assert_eq!(handle.state(), RunState::Stopped);
    assert_eq!(handle.wait().await.unwrap(), summary.clone());
}

#[tokio::test]
async fn test_events_arrive_in_processing_order() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let mut handle = start(
        ws.config(),
        two_tile_catalog(),
        previews,
        Arc::new(FakeToolchain::default()),
    );

    let events = drain(&mut handle).await;

    let started = events
        .iter()
        .position(|e| matches!(e, SearchEvent::EnumerationStarted { .. }))
        .unwrap();
    assert_eq!(started, 3, "all items are prepared before enumeration");
    assert!(events[..started]
        .iter()
        .all(|e| matches!(e, SearchEvent::ItemPrepared { fetched: true, .. })));

    let finished: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, SearchEvent::Finished(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(finished, vec![events.len() - 1]);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_bounded() {
    for scale in [ProgressScale::Combinations, ProgressScale::Tiles] {
        let ws = Workspace::new();
        let mut config = ws.config();
        config.progress_scale = scale;
        let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
        let mut handle = start(
            config,
            two_tile_catalog(),
            previews,
            Arc::new(FakeToolchain::default()),
        );

        let events = drain(&mut handle).await;
        let expected_max = match scale {
            ProgressScale::Combinations => 7,
            ProgressScale::Tiles => 2,
        };

        let mut last = 0;
        for event in &events {
            let progress = match event {
                SearchEvent::EnumerationStarted { progress, .. } => progress,
                SearchEvent::MosaicBuilt { progress, .. } => progress,
                _ => continue,
            };
            assert_eq!(progress.max, expected_max, "{} scale", scale);
            assert!(progress.current >= last);
            assert!(progress.current <= progress.max);
            last = progress.current;
        }
        assert_eq!(summary(&events).mosaics_built, 5);
    }
}

#[tokio::test]
async fn test_limit_bounds_the_run() {
    let ws = Workspace::new();
    let mut config = ws.config();
    config.policy = EnumerationPolicy::prioritized().with_limit(Some(2));
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let mut handle = start(
        config,
        two_tile_catalog(),
        previews,
        Arc::new(FakeToolchain::default()),
    );

    let events = drain(&mut handle).await;
    let summary = summary(&events);
    assert_eq!(summary.combinations_considered, 2);
    assert_eq!(summary.mosaics_built, 2);
    assert_eq!(summary.progress.max, 2);
}

#[tokio::test]
async fn test_rerun_reuses_previews_and_mosaics() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let toolchain = Arc::new(FakeToolchain::default());

    let mut first = start(
        ws.config(),
        two_tile_catalog(),
        Arc::clone(&previews),
        Arc::clone(&toolchain),
    );
    drain(&mut first).await;
    let fetches = previews.fetches.load(Ordering::SeqCst);
    let invocations = toolchain.invocations.load(Ordering::SeqCst);
    assert_eq!(fetches, 3);

    let mut second = start(
        ws.config(),
        two_tile_catalog(),
        Arc::clone(&previews),
        Arc::clone(&toolchain),
    );
    let events = drain(&mut second).await;

    assert_eq!(previews.fetches.load(Ordering::SeqCst), fetches);
    assert_eq!(toolchain.invocations.load(Ordering::SeqCst), invocations);
    assert!(events
        .iter()
        .filter(|e| matches!(e, SearchEvent::ItemPrepared { .. }))
        .all(|e| matches!(e, SearchEvent::ItemPrepared { fetched: false, .. })));
    let results = built(&events);
    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.reused));
}

// ============================================================================
// Run control
// ============================================================================

#[tokio::test]
async fn test_paused_run_makes_no_progress_until_resumed() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let toolchain = Arc::new(FakeToolchain::default());
    let mut handle = start(
        ws.config(),
        two_tile_catalog(),
        Arc::clone(&previews),
        Arc::clone(&toolchain),
    );

    // The worker has not run yet on this single-threaded runtime.
    assert!(handle.pause());
    assert_eq!(handle.state(), RunState::Paused);
    assert!(!handle.pause(), "pausing twice is a no-op");

    let waited = tokio::time::timeout(Duration::from_millis(200), handle.next_event()).await;
    assert!(waited.is_err(), "no event while paused");
    assert_eq!(previews.fetches.load(Ordering::SeqCst), 0);
    assert_eq!(toolchain.invocations.load(Ordering::SeqCst), 0);
    assert!(!handle.is_finished());

    assert!(handle.resume());
    assert_eq!(handle.state(), RunState::Running);

    let events = drain(&mut handle).await;
    assert_eq!(summary(&events).outcome, RunOutcome::Completed);
    assert_eq!(summary(&events).mosaics_built, 5);
}

#[tokio::test]
async fn test_stop_ends_run_at_next_boundary() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let mut handle = start(
        ws.config(),
        two_tile_catalog(),
        previews,
        Arc::new(FakeToolchain::default()),
    );

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        let first_build = matches!(event, SearchEvent::MosaicBuilt { .. });
        events.push(event);
        if first_build {
            handle.stop();
            break;
        }
    }
    events.extend(drain(&mut handle).await);

    let summary = summary(&events);
    assert_eq!(summary.outcome, RunOutcome::Stopped);
    assert!(summary.mosaics_built >= 1);
    assert!(summary.mosaics_built < 5);
    assert_eq!(handle.state(), RunState::Stopped);
    assert!(!handle.resume(), "a stopped run cannot be resumed");
}

#[tokio::test]
async fn test_stop_while_paused_finishes_run() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let mut handle = start(
        ws.config(),
        two_tile_catalog(),
        Arc::clone(&previews),
        Arc::new(FakeToolchain::default()),
    );

    assert!(handle.pause());
    handle.stop();

    let events = drain(&mut handle).await;
    assert_eq!(events.len(), 1);
    let summary = summary(&events);
    assert_eq!(summary.outcome, RunOutcome::Stopped);
    assert_eq!(summary.items_prepared, 0);
    assert_eq!(previews.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_second_start_is_rejected_while_worker_is_alive() {
    let ws = Workspace::new();
    let catalog = two_tile_catalog();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let toolchain = Arc::new(FakeToolchain::default());
    let orchestrator = SearchOrchestrator::new(
        ws.config(),
        Arc::clone(&catalog) as Arc<dyn CatalogSource>,
        Arc::clone(&previews),
        Arc::clone(&toolchain),
    );

    let mut first = orchestrator.start().unwrap();
    assert!(matches!(
        orchestrator.start().unwrap_err(),
        SearchError::AlreadyRunning
    ));

    // Another orchestrator sharing the control sees the same run.
    let sibling = SearchOrchestrator::new(
        ws.config(),
        Arc::clone(&catalog) as Arc<dyn CatalogSource>,
        Arc::clone(&previews),
        Arc::clone(&toolchain),
    )
    .with_control(orchestrator.control().clone());
    assert!(matches!(
        sibling.start().unwrap_err(),
        SearchError::AlreadyRunning
    ));

    // Stopped, but the worker has not exited yet.
    first.stop();
    assert!(matches!(
        orchestrator.start().unwrap_err(),
        SearchError::AlreadyRunning
    ));
    assert_eq!(catalog.queries.load(Ordering::SeqCst), 1);

    let events = drain(&mut first).await;
    assert_eq!(summary(&events).outcome, RunOutcome::Stopped);

    let mut second = orchestrator.start().unwrap();
    let events = drain(&mut second).await;
    let summary = summary(&events);
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.mosaics_built, 5);
    assert_eq!(summary.failed, 0);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unavailable_preview_excludes_image() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()).without("a2"));
    let mut handle = start(
        ws.config(),
        two_tile_catalog(),
        previews,
        Arc::new(FakeToolchain::default()),
    );

    let events = drain(&mut handle).await;
    let failures: Vec<&SearchEvent> = events
        .iter()
        .filter(|e| matches!(e, SearchEvent::ItemFailed { .. }))
        .collect();
    assert_eq!(failures.len(), 1);
    match failures[0] {
        SearchEvent::ItemFailed {
            tile_id,
            image_id,
            reason,
        } => {
            assert_eq!(tile_id, "32TMS");
            assert_eq!(image_id, "a2");
            assert!(reason.contains("HTTP 503"));
        }
        _ => unreachable!(),
    }

    let summary = summary(&events);
    assert_eq!(summary.items_failed, 1);
    assert_eq!(summary.items_prepared, 2);
    // {b1}, {a1}, {a1, b1}
    assert_eq!(summary.mosaics_built, 3);
    assert!(built(&events)
        .iter()
        .all(|r| !r.item_ids.contains(&"a2".to_string())));
}

#[tokio::test]
async fn test_failed_build_is_reported_and_run_continues() {
    let ws = Workspace::new();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let mut handle = start(
        ws.config(),
        two_tile_catalog(),
        previews,
        Arc::new(FakeToolchain::poisoned("b1")),
    );

    let events = drain(&mut handle).await;
    let summary = summary(&events);
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.mosaics_built, 2);
    assert_eq!(summary.progress.current, 2);

    let failed_id = mosaic_id(&["b1"]);
    let failure = events
        .iter()
        .find_map(|e| match e {
            SearchEvent::BuildFailed {
                mosaic_id,
                item_ids,
                error,
            } if *mosaic_id == failed_id => Some((item_ids, error)),
            _ => None,
        })
        .unwrap();
    assert_eq!(failure.0, &vec!["b1".to_string()]);
    assert!(failure.1.contains("corrupt input"));

    // No partial output left for the failed mosaic.
    let mosaic_dir = ws.base.join("thumbnails").join(ROI_NAME).join("mosaic");
    let leftovers: Vec<String> = std::fs::read_dir(&mosaic_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with(&failed_id))
        .collect();
    assert!(leftovers.is_empty(), "leftovers: {:?}", leftovers);
}

#[tokio::test]
async fn test_full_coverage_requirement_skips_partial_mosaics() {
    let ws = Workspace::new();
    let mut config = ws.config();
    config.require_full_coverage = true;
    config.coverage_samples = 64;

    // Tile 32TMS covers the western half of the region, 32TNS the eastern.
    let west = BoundingBox::new(9.9, 44.9, 11.0, 46.1);
    let east = BoundingBox::new(11.0, 44.9, 12.1, 46.1);
    let previews = Arc::new(
        FakePreviews::covering(west, &["a1", "a2"]).with_footprint("b1", east),
    );
    let mut handle = start(
        config,
        two_tile_catalog(),
        previews,
        Arc::new(FakeToolchain::default()),
    );

    let events = drain(&mut handle).await;
    let summary = summary(&events);
    assert_eq!(summary.mosaics_built, 2);
    assert_eq!(summary.skipped, 3);
    assert!(built(&events).iter().all(|r| r.item_ids.len() == 2));
    assert!(events.iter().any(|e| matches!(
        e,
        SearchEvent::CombinationSkipped {
            reason: SkipReason::NotCovered { coverage_percent },
            ..
        } if *coverage_percent < 60.0
    )));
}

#[tokio::test]
async fn test_missing_configuration_fails_before_any_work() {
    let ws = Workspace::new();
    let catalog = two_tile_catalog();
    let previews = Arc::new(FakePreviews::covering(roi_bbox(), &all_ids()));
    let toolchain = Arc::new(FakeToolchain::default());

    let mut config = ws.config();
    config.paths.base_dir = None;
    let err = SearchOrchestrator::new(
        config,
        Arc::clone(&catalog) as Arc<dyn CatalogSource>,
        Arc::clone(&previews),
        Arc::clone(&toolchain),
    )
    .start()
    .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Configuration(ConfigurationError::MissingBaseDir)
    ));

    let mut config = ws.config();
    config.paths.toolchain_dir = Some(ws.bin.join("missing"));
    let orchestrator = SearchOrchestrator::new(
        config,
        Arc::clone(&catalog) as Arc<dyn CatalogSource>,
        Arc::clone(&previews),
        Arc::clone(&toolchain),
    );
    let err = orchestrator.start().unwrap_err();
    assert!(matches!(
        err,
        SearchError::Configuration(ConfigurationError::ToolchainDirNotFound(_))
    ));
    assert_eq!(orchestrator.control().state(), RunState::Idle);

    let mut config = ws.config();
    config.end_date = config.start_date;
    let err = SearchOrchestrator::new(config, catalog.clone(), previews, toolchain)
        .start()
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Configuration(ConfigurationError::Invalid(_))
    ));

    assert_eq!(catalog.queries.load(Ordering::SeqCst), 0);
    assert!(!ws.base.exists());
}

#[tokio::test]
async fn test_empty_catalog_finishes_immediately() {
    let ws = Workspace::new();
    let mut handle = start(
        ws.config(),
        Arc::new(FixedCatalog::new(Vec::new())),
        Arc::new(FakePreviews::covering(roi_bbox(), &[])),
        Arc::new(FakeToolchain::default()),
    );

    let events = drain(&mut handle).await;
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        SearchEvent::EnumerationStarted { tiles: 0, items: 0, .. }
    ));
    let summary = summary(&events);
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.mosaics_built, 0);
    assert_eq!(summary.progress.max, 0);
}
