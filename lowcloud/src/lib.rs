//! lowcloud - low-cloud Sentinel-2 mosaic search
//!
//! Given a region of interest and a date window, lowcloud looks up the
//! Sentinel-2 images intersecting the region, groups them by MGRS tile,
//! enumerates combinations that pick one image per tile (clearest first)
//! and turns each combination into a georeferenced mosaic with the GDAL
//! command-line tools.
//!
//! # High-Level API
//!
//! The [`search`] module drives a whole run:
//!
//! ```ignore
//! use std::sync::Arc;
//! use lowcloud::catalog::JsonCatalog;
//! use lowcloud::config::ConfigFile;
//! use lowcloud::preview::DirectoryPreviewSource;
//! use lowcloud::search::{SearchEvent, SearchOrchestrator};
//! use lowcloud::toolchain::GdalToolchain;
//!
//! let config = ConfigFile::load()?.search_config(roi, start, end);
//! let orchestrator = SearchOrchestrator::new(
//!     config,
//!     Arc::new(JsonCatalog::open(catalog_path)?),
//!     Arc::new(DirectoryPreviewSource::new(preview_dir)),
//!     Arc::new(GdalToolchain::new(bin_dir)),
//! );
//!
//! let mut handle = orchestrator.start()?;
//! while let Some(event) = handle.next_event().await {
//!     if let SearchEvent::MosaicBuilt { result, progress } = event {
//!         println!("{} {}", progress, result.preview_path.display());
//!     }
//! }
//! ```

pub mod catalog;
pub mod combination;
pub mod config;
pub mod control;
pub mod coverage;
pub mod geo;
pub mod logging;
pub mod mosaic;
pub mod paths;
pub mod preview;
pub mod search;
pub mod tile;
pub mod toolchain;

/// Version of the lowcloud library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
