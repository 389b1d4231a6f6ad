//! Search orchestration.
//!
//! A search run goes through three phases on one worker task:
//!
//! 1. **Prepare** - the catalog records are grouped by tile and every
//!    image's georeferenced preview is ensured on disk (fetched only when
//!    missing). Images that fail are excluded from the run.
//! 2. **Enumerate** - combinations are produced lazily by the configured
//!    [`EnumerationPolicy`](crate::combination::EnumerationPolicy).
//! 3. **Build** - each new combination is turned into a mosaic, one at a
//!    time.
//!
//! The worker consults the [`RunControl`](crate::control::RunControl)
//! before every image and every combination, never in the middle of a
//! build. Results and progress are delivered as [`SearchEvent`]s in
//! processing order over an unbounded channel.
//!
//! Progress `max` is fixed when enumeration starts; `current` counts
//! successful builds only and never exceeds `max`. Permutations of an
//! image set already handled count towards `max` but never advance
//! `current`, so a completed run can end below `max`;
//! [`SearchSummary::duplicates`] holds the difference.

mod config;
mod event;
mod handle;
mod orchestrator;
mod progress;

pub use config::{ProgressScale, SearchConfig, DEFAULT_CLOUD_THRESHOLD};
pub use event::{RunOutcome, SearchEvent, SearchSummary, SkipReason};
pub use handle::SearchHandle;
pub use orchestrator::SearchOrchestrator;
pub use progress::Progress;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::paths::ConfigurationError;

/// Errors that prevent a search from running.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Required settings are missing or invalid; nothing was started.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The catalog could not be queried; nothing was started.
    #[error("catalog query failed: {0}")]
    Catalog(#[from] CatalogError),

    /// A run of this orchestrator, or one sharing its control, is still
    /// active; nothing was started.
    #[error("a search is already running; stop it and wait for it to finish")]
    AlreadyRunning,

    /// The worker task ended abnormally.
    #[error("search worker failed: {0}")]
    Worker(String),
}
