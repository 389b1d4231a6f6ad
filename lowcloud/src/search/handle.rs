//! Handle to a running search.
//!
//! The [`SearchHandle`] is returned by
//! [`SearchOrchestrator::start`](super::SearchOrchestrator::start). It
//! carries the run's control, the event stream and the worker task.
//!
//! # Example
//!
//! ```ignore
//! let mut handle = orchestrator.start()?;
//!
//! while let Some(event) = handle.next_event().await {
//!     if let SearchEvent::MosaicBuilt { result, progress } = event {
//!         println!("{} {}", progress, result.preview_path.display());
//!     }
//! }
//!
//! let summary = handle.wait().await?;
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{SearchError, SearchEvent, SearchSummary};
use crate::control::{RunControl, RunState};

/// Handle to a running search.
pub struct SearchHandle {
    control: RunControl,
    events: mpsc::UnboundedReceiver<SearchEvent>,
    task: JoinHandle<SearchSummary>,
}

impl SearchHandle {
    pub(crate) fn new(
        control: RunControl,
        events: mpsc::UnboundedReceiver<SearchEvent>,
        task: JoinHandle<SearchSummary>,
    ) -> Self {
        Self {
            control,
            events,
            task,
        }
    }

    /// The run's control, for sharing with other controllers.
    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    /// Requests a pause at the next combination boundary.
    ///
    /// Returns false if the run is not running.
    pub fn pause(&self) -> bool {
        self.control.pause_task()
    }

    /// Resumes a paused run. Returns false if the run is not paused.
    pub fn resume(&self) -> bool {
        self.control.resume_task()
    }

    /// Stops the run at the next combination boundary.
    pub fn stop(&self) {
        self.control.stop_task()
    }

    /// Next event, or `None` once the worker is gone and all events are
    /// drained.
    pub async fn next_event(&mut self) -> Option<SearchEvent> {
        self.events.recv().await
    }

    /// Non-blocking variant of [`next_event`](Self::next_event).
    pub fn try_next_event(&mut self) -> Option<SearchEvent> {
        self.events.try_recv().ok()
    }

    /// Returns true once the worker task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the worker and returns the run summary.
    ///
    /// Undelivered events are dropped.
    pub async fn wait(self) -> Result<SearchSummary, SearchError> {
        self.task
            .await
            .map_err(|e| SearchError::Worker(e.to_string()))
    }

    /// Splits the handle for callers that drain events on another task.
    pub fn into_parts(
        self,
    ) -> (
        RunControl,
        mpsc::UnboundedReceiver<SearchEvent>,
        JoinHandle<SearchSummary>,
    ) {
        (self.control, self.events, self.task)
    }
}

impl std::fmt::Debug for SearchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHandle")
            .field("state", &self.control.state())
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
