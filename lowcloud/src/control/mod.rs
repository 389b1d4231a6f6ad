//! Cooperative run control shared between a controller and the search worker.
//!
//! A [`RunControl`] holds exactly one [`RunState`] at a time. The controller
//! (the CLI, a UI, a test) requests transitions; the worker reads the state
//! at combination boundaries through [`RunControl::checkpoint`], which parks
//! the worker while the run is paused instead of spinning.
//!
//! # Transitions
//!
//! | Request            | From      | To        |
//! |--------------------|-----------|-----------|
//! | `start_new_task`   | any       | `Running` |
//! | `pause_task`       | `Running` | `Paused`  |
//! | `resume_task`      | `Paused`  | `Running` |
//! | `stop_task`        | any       | `Stopped` |
//!
//! Pause and resume requested from any other state leave the state unchanged.
//!
//! # Example
//!
//! ```
//! use lowcloud::control::{RunControl, RunState};
//!
//! let control = RunControl::new();
//! assert_eq!(control.state(), RunState::Idle);
//!
//! control.start_new_task();
//! assert!(control.pause_task());
//! assert_eq!(control.state(), RunState::Paused);
//!
//! control.stop_task();
//! assert!(!control.resume_task());
//! assert_eq!(control.state(), RunState::Stopped);
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// State of a search run.
///
/// Being an enum, exactly one state holds at any instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunState {
    /// No run has been started.
    #[default]
    Idle,

    /// The worker is enumerating and building.
    Running,

    /// The worker is parked at its next combination boundary.
    Paused,

    /// The run is over; enumeration does not resume without a new start.
    Stopped,
}

impl RunState {
    /// Returns true if no run is active (`Idle` or `Stopped`).
    pub fn is_inactive(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped)
    }

    /// Returns true if the run is currently paused.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the worker may process the next combination.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Paused => write!(f, "Paused"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Control request a controller can issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Begin a fresh run.
    Start,
    /// Park the worker at the next combination boundary.
    Pause,
    /// Continue a paused run.
    Resume,
    /// End the run at the next combination boundary.
    Stop,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Pause => write!(f, "Pause"),
            Self::Resume => write!(f, "Resume"),
            Self::Stop => write!(f, "Stop"),
        }
    }
}

/// Outcome of a worker checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Checkpoint {
    /// Process the next unit of work.
    Proceed,
    /// Leave the enumeration loop without further side effects.
    Halt,
}

/// Shared run-state machine.
///
/// Cloning is cheap; all clones refer to the same state. State changes are
/// published through a [`watch`] channel so a paused worker is woken as soon
/// as the controller resumes or stops the run.
#[derive(Clone, Debug)]
pub struct RunControl {
    state_tx: Arc<watch::Sender<RunState>>,
}

impl RunControl {
    /// Creates a control in the `Idle` state.
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(RunState::Idle);
        Self {
            state_tx: Arc::new(state_tx),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> RunState {
        *self.state_tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Moves to `Running` from any state.
    ///
    /// Only used to begin a fresh run; the caller resets its own per-run
    /// counters.
    pub fn start_new_task(&self) {
        let previous = self.state_tx.send_replace(RunState::Running);
        debug!(from = %previous, "run control: start");
    }

    /// Moves `Running` to `Paused`. Returns false (no-op) from any other state.
    pub fn pause_task(&self) -> bool {
        self.transition(RunState::Running, RunState::Paused)
    }

    /// Moves `Paused` to `Running`. Returns false (no-op) from any other state.
    pub fn resume_task(&self) -> bool {
        self.transition(RunState::Paused, RunState::Running)
    }

    /// Moves to `Stopped` from any state.
    pub fn stop_task(&self) {
        let previous = self.state_tx.send_replace(RunState::Stopped);
        debug!(from = %previous, "run control: stop");
    }

    /// Applies a controller signal.
    ///
    /// Returns true if the state changed.
    pub fn apply(&self, signal: Signal) -> bool {
        let before = self.state();
        match signal {
            Signal::Start => self.start_new_task(),
            Signal::Pause => {
                self.pause_task();
            }
            Signal::Resume => {
                self.resume_task();
            }
            Signal::Stop => self.stop_task(),
        }
        before != self.state()
    }

    /// Worker-side checkpoint, called at combination boundaries.
    ///
    /// Returns immediately with [`Checkpoint::Proceed`] while running. While
    /// paused, waits for the next transition out of `Paused`. Returns
    /// [`Checkpoint::Halt`] once the run is stopped (or was never started).
    pub async fn checkpoint(&self) -> Checkpoint {
        let mut state_rx = self.state_tx.subscribe();
        let settled = match state_rx.wait_for(|state| !state.is_paused()).await {
            Ok(state) => *state,
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => RunState::Stopped,
        };

        if settled.is_running() {
            Checkpoint::Proceed
        } else {
            Checkpoint::Halt
        }
    }

    fn transition(&self, from: RunState, to: RunState) -> bool {
        let changed = self.state_tx.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(%from, %to, "run control transition");
        }
        changed
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}
