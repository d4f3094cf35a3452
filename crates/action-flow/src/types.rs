//! Core types for sequence runs

use action_primitives::ActionReport;
use chrono::{DateTime, Utc};
use pagepilot_core_types::SessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every action was executed
    Completed,

    /// Cancellation was observed before the list was exhausted
    Cancelled,
}

/// One executed action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Position in the action list
    pub index: usize,

    #[serde(flatten)]
    pub report: ActionReport,
}

/// Result of one sequence run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub session_id: SessionId,
    pub outcome: RunOutcome,

    /// Number of actions in the list
    pub total: usize,

    /// Steps actually executed, in order
    pub steps: Vec<StepReport>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn executed(&self) -> usize {
        self.steps.len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }
}

/// Lifecycle events published while a run progresses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        session_id: SessionId,
        total: usize,
    },
    ActionFinished {
        session_id: SessionId,
        step: StepReport,
    },
    Finished {
        session_id: SessionId,
        outcome: RunOutcome,
        executed: usize,
    },
}

impl RunEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            RunEvent::Started { session_id, .. }
            | RunEvent::ActionFinished { session_id, .. }
            | RunEvent::Finished { session_id, .. } => session_id,
        }
    }
}
