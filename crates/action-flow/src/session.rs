//! Session bookkeeping and cancellation.
//!
//! Every run gets its own [`SessionId`] and [`CancellationToken`]. Cancels
//! either target the active session or name the session they mean; a cancel
//! naming an older session is ignored, so a late cancel can never abort a
//! newer, unrelated run.

use std::sync::Arc;

use action_primitives::ActionPerformer;
use pagepilot_core_types::SessionId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Identity and cancellation token of one run
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    token: CancellationToken,
}

impl SessionHandle {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelTarget {
    /// Whatever session is active when the cancel is processed
    Active,

    /// Only this session
    Session(SessionId),
}

impl From<Option<SessionId>> for CancelTarget {
    fn from(value: Option<SessionId>) -> Self {
        match value {
            Some(id) => CancelTarget::Session(id),
            None => CancelTarget::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// The named (or active) session was cancelled
    Cancelled { session_id: SessionId },

    /// No session was active; visual state was still cleared
    Idle,

    /// The cancel named a session that is no longer active
    Stale { requested: SessionId },
}

pub struct SessionController {
    performer: Arc<dyn ActionPerformer>,
    active: Mutex<Option<SessionHandle>>,
}

impl SessionController {
    pub fn new(performer: Arc<dyn ActionPerformer>) -> Self {
        Self {
            performer,
            active: Mutex::new(None),
        }
    }

    pub fn performer(&self) -> &Arc<dyn ActionPerformer> {
        &self.performer
    }

    /// Begin a new session with a fresh, un-cancelled token.
    ///
    /// A session that is still active is superseded: its token is cancelled
    /// so at most one run drives the page.
    pub fn start_session(&self) -> SessionHandle {
        self.start_session_with(SessionId::new())
    }

    pub fn start_session_with(&self, id: SessionId) -> SessionHandle {
        let handle = SessionHandle {
            id,
            token: CancellationToken::new(),
        };
        let previous = self.active.lock().replace(handle.clone());
        if let Some(previous) = previous {
            if !previous.is_cancelled() {
                info!(
                    superseded = %previous.id,
                    session = %handle.id,
                    "new session supersedes running session"
                );
                previous.token.cancel();
            }
        }
        debug!(session = %handle.id, "session started");
        handle
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active.lock().as_ref().map(|handle| handle.id.clone())
    }

    /// Cancel a session and clear the cursor overlay.
    pub async fn cancel(&self, target: CancelTarget) -> CancelOutcome {
        let outcome = {
            let active = self.active.lock();
            match (&*active, &target) {
                (Some(handle), CancelTarget::Session(requested)) if &handle.id != requested => {
                    CancelOutcome::Stale {
                        requested: requested.clone(),
                    }
                }
                (None, CancelTarget::Session(requested)) => CancelOutcome::Stale {
                    requested: requested.clone(),
                },
                (Some(handle), _) => {
                    handle.token.cancel();
                    CancelOutcome::Cancelled {
                        session_id: handle.id.clone(),
                    }
                }
                (None, CancelTarget::Active) => CancelOutcome::Idle,
            }
        };

        match &outcome {
            CancelOutcome::Stale { requested } => {
                info!(requested = %requested, "ignoring cancel for inactive session");
            }
            CancelOutcome::Cancelled { session_id } => {
                info!(session = %session_id, "execution cancelled");
                self.performer.teardown().await;
            }
            CancelOutcome::Idle => {
                info!("cancel with no active session");
                self.performer.teardown().await;
            }
        }
        outcome
    }

    /// Forget the session once its run is over. A newer session is left
    /// untouched.
    pub fn finish(&self, handle: &SessionHandle) {
        let mut active = self.active.lock();
        if active.as_ref().map(|current| &current.id) == Some(&handle.id) {
            *active = None;
        }
    }
}
