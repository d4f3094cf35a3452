//! Paced, in-order execution of an action list.

use std::sync::Arc;
use std::time::Duration;

use action_primitives::{ActionPerformer, PageAction};
use chrono::Utc;
use pagepilot_event_bus::{EventBus, InMemoryBus};
use tracing::{debug, info, warn};

use crate::session::SessionHandle;
use crate::types::{RunEvent, RunOutcome, RunReport, StepReport};

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Delay after every action so a person can follow the overlay
    pub pacing: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(500),
        }
    }
}

pub struct SequenceRunner {
    performer: Arc<dyn ActionPerformer>,
    bus: Option<Arc<InMemoryBus<RunEvent>>>,
    config: RunnerConfig,
}

impl SequenceRunner {
    pub fn new(performer: Arc<dyn ActionPerformer>, config: RunnerConfig) -> Self {
        Self {
            performer,
            bus: None,
            config,
        }
    }

    /// Publish run lifecycle events on `bus`
    pub fn with_bus(mut self, bus: Arc<InMemoryBus<RunEvent>>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute `actions` strictly in order for `session`.
    ///
    /// The session token is polled right before and right after each
    /// action. An action that has started always runs to completion;
    /// cancellation only prevents the next one. Cancellation is an outcome,
    /// not an error. Visual teardown belongs to whoever cancelled.
    pub async fn run(&self, session: &SessionHandle, actions: &[PageAction]) -> RunReport {
        let session_id = session.id().clone();
        let token = session.token();
        let started_at = Utc::now();
        let total = actions.len();

        info!(session = %session_id, total, "Starting action sequence");
        self.publish(RunEvent::Started {
            session_id: session_id.clone(),
            total,
        })
        .await;

        let mut steps = Vec::with_capacity(total);
        let mut outcome = RunOutcome::Completed;

        for (index, action) in actions.iter().enumerate() {
            if token.is_cancelled() {
                debug!(session = %session_id, index, "cancelled before action");
                outcome = RunOutcome::Cancelled;
                break;
            }

            let report = self.performer.perform(action).await;
            info!(
                session = %session_id,
                index,
                kind = %report.kind,
                status = ?report.status,
                latency_ms = report.latency_ms,
                "Executed action"
            );
            let step = StepReport { index, report };
            steps.push(step.clone());
            self.publish(RunEvent::ActionFinished {
                session_id: session_id.clone(),
                step,
            })
            .await;

            if token.is_cancelled() {
                debug!(session = %session_id, index, "cancelled after action");
                outcome = RunOutcome::Cancelled;
                break;
            }

            // A cancel during pacing ends the sleep early; the next
            // iteration's check turns it into the outcome.
            tokio::select! {
                _ = tokio::time::sleep(self.config.pacing) => {}
                _ = token.cancelled() => {}
            }
        }

        let executed = steps.len();
        match outcome {
            RunOutcome::Completed => {
                info!(session = %session_id, executed, "Action sequence completed")
            }
            RunOutcome::Cancelled => {
                info!(session = %session_id, executed, total, "Action sequence cancelled")
            }
        }
        self.publish(RunEvent::Finished {
            session_id: session_id.clone(),
            outcome,
            executed,
        })
        .await;

        RunReport {
            session_id,
            outcome,
            total,
            steps,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn publish(&self, event: RunEvent) {
        if let Some(bus) = &self.bus {
            if let Err(err) = bus.publish(event).await {
                warn!(error = %err, "failed to publish run event");
            }
        }
    }
}
