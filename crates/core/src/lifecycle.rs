//! Start/stop lifecycle shared by the background loops
//!
//! A loop owner moves through `Idle -> Running -> Stopped`. Stopping cancels
//! the loop's token exactly once; stopping again, or stopping a loop that
//! never ran, does nothing. A stopped owner must be re-armed before it can
//! start again.

use tokio_util::sync::CancellationToken;

use crate::{RenderError, Result};

/// Lifecycle state of a background loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Lifecycle plus the termination token of the active loop
///
/// Not synchronised on its own; owners keep it behind the same lock as the
/// state the loop touches.
#[derive(Debug, Default)]
pub struct LoopControl {
    state: Lifecycle,
    cancel: Option<CancellationToken>,
}

impl LoopControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == Lifecycle::Running
    }

    /// Move Idle -> Running and hand out the new loop's token
    ///
    /// Returns `Ok(None)` when already running, so callers can treat a
    /// second start as a no-op.
    pub fn begin(&mut self) -> Result<Option<CancellationToken>> {
        match self.state {
            Lifecycle::Running => Ok(None),
            Lifecycle::Stopped => Err(RenderError::InvalidState(
                "loop was stopped; rearm before starting again".into(),
            )),
            Lifecycle::Idle => {
                let token = CancellationToken::new();
                self.cancel = Some(token.clone());
                self.state = Lifecycle::Running;
                Ok(Some(token))
            }
        }
    }

    /// Undo a `begin` whose loop could not be spawned
    pub fn abort(&mut self) {
        self.cancel = None;
        self.state = Lifecycle::Idle;
    }

    /// Move Running -> Stopped, firing the token; returns whether it fired
    pub fn end(&mut self) -> bool {
        if self.state != Lifecycle::Running {
            return false;
        }
        self.state = Lifecycle::Stopped;
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        true
    }

    /// Move Stopped -> Idle so the owner may start again
    pub fn rearm(&mut self) {
        if self.state == Lifecycle::Stopped {
            self.state = Lifecycle::Idle;
        }
    }
}

/// Fail early when no tokio runtime can host a background loop
pub(crate) fn runtime() -> Result<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current().map_err(|_| RenderError::NoRuntime)
}
