//! Per-page agent: turns inbound messages into sessions and runs.
//!
//! A run executes in its own task so a cancel message can be handled while
//! the run is still going. Runs never overlap: a new run waits for the
//! superseded one to reach its cancel point before touching the page.

use std::sync::Arc;

use action_primitives::{decode_action_list, ActionPerformer, PageAction};
use pagepilot_core_types::SessionId;
use pagepilot_event_bus::InMemoryBus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::errors::FlowError;
use crate::runner::{RunnerConfig, SequenceRunner};
use crate::session::{CancelOutcome, CancelTarget, SessionController, SessionHandle};
use crate::types::{RunEvent, RunOutcome, RunReport};

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// Start a new session for the given action records
    #[serde(rename = "EXECUTE_ACTIONS")]
    ExecuteActions {
        actions: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },

    /// Cancel the named session, or the active one when no id is given
    #[serde(rename = "CANCEL_ACTIONS")]
    CancelActions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
}

impl InboundMessage {
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A run finished, either exhausted or cancelled
    Done {
        session_id: SessionId,
        outcome: RunOutcome,
        executed: usize,
    },

    /// Reply to a cancel that was applied
    Cancelled { session_id: Option<SessionId> },

    /// Reply to a cancel naming a session that is no longer active
    Ignored { session_id: SessionId },

    Error { message: String },
}

impl OutboundMessage {
    pub fn done(report: &RunReport) -> Self {
        OutboundMessage::Done {
            session_id: report.session_id.clone(),
            outcome: report.outcome,
            executed: report.executed(),
        }
    }

    pub fn error(err: &FlowError) -> Self {
        OutboundMessage::Error {
            message: err.to_string(),
        }
    }
}

impl From<CancelOutcome> for OutboundMessage {
    fn from(outcome: CancelOutcome) -> Self {
        match outcome {
            CancelOutcome::Cancelled { session_id } => OutboundMessage::Cancelled {
                session_id: Some(session_id),
            },
            CancelOutcome::Idle => OutboundMessage::Cancelled { session_id: None },
            CancelOutcome::Stale { requested } => OutboundMessage::Ignored {
                session_id: requested,
            },
        }
    }
}

pub struct PageAgent {
    controller: Arc<SessionController>,
    runner: Arc<SequenceRunner>,
    bus: Arc<InMemoryBus<RunEvent>>,
    tasks: Mutex<JoinSet<()>>,
    /// Resolves (or errors) once the most recently started run has ended
    last_run: Mutex<Option<oneshot::Receiver<()>>>,
}

impl PageAgent {
    pub fn new(performer: Arc<dyn ActionPerformer>, config: RunnerConfig) -> Self {
        let bus = InMemoryBus::new(EVENT_BUS_CAPACITY);
        let runner = SequenceRunner::new(performer.clone(), config).with_bus(bus.clone());
        Self {
            controller: Arc::new(SessionController::new(performer)),
            runner: Arc::new(runner),
            bus,
            tasks: Mutex::new(JoinSet::new()),
            last_run: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Run lifecycle events for every session this agent starts
    pub fn events(&self) -> Arc<InMemoryBus<RunEvent>> {
        self.bus.clone()
    }

    /// Start a session and queue it behind the previous run. The returned
    /// turn must be held until the run is over.
    fn start(&self, session_id: Option<SessionId>) -> (SessionHandle, RunTurn) {
        let handle = match session_id {
            Some(id) => self.controller.start_session_with(id),
            None => self.controller.start_session(),
        };
        let (finished, done) = oneshot::channel();
        let previous = self.last_run.lock().replace(done);
        (handle, RunTurn { previous, finished })
    }

    /// Start a session and run it to the end on the current task
    pub async fn execute(
        &self,
        actions: Vec<PageAction>,
        session_id: Option<SessionId>,
    ) -> RunReport {
        let (handle, mut turn) = self.start(session_id);
        turn.wait(&handle).await;
        let report = self.runner.run(&handle, &actions).await;
        self.controller.finish(&handle);
        drop(turn.finished);
        report
    }

    /// Start a session and run it on a background task. The session is
    /// active as soon as this returns, so a cancel handled afterwards always
    /// sees it. The `done` reply is sent on `replies` when the run ends.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        &self,
        actions: Vec<PageAction>,
        session_id: Option<SessionId>,
        replies: mpsc::Sender<OutboundMessage>,
    ) -> SessionId {
        let (handle, mut turn) = self.start(session_id);
        let id = handle.id().clone();
        let runner = self.runner.clone();
        let controller = self.controller.clone();

        self.tasks.lock().spawn(async move {
            turn.wait(&handle).await;
            let report = runner.run(&handle, &actions).await;
            controller.finish(&handle);
            drop(turn.finished);
            if replies.send(OutboundMessage::done(&report)).await.is_err() {
                debug!(session = %report.session_id, "reply channel closed; completion dropped");
            }
        });
        id
    }

    pub async fn cancel(&self, session_id: Option<SessionId>) -> CancelOutcome {
        self.controller.cancel(CancelTarget::from(session_id)).await
    }

    /// Handle one inbound message.
    pub async fn dispatch(
        &self,
        message: InboundMessage,
        replies: &mpsc::Sender<OutboundMessage>,
    ) -> Result<(), FlowError> {
        match message {
            InboundMessage::ExecuteActions {
                actions,
                session_id,
            } => {
                let actions = decode_action_list(&actions)?;
                let id = self.spawn(actions, session_id, replies.clone());
                info!(session = %id, "execute request accepted");
            }
            InboundMessage::CancelActions { session_id } => {
                let outcome = self.cancel(session_id).await;
                replies
                    .send(OutboundMessage::from(outcome))
                    .await
                    .map_err(|err| FlowError::Internal(err.to_string()))?;
            }
        }
        Ok(())
    }

    /// Wait for every spawned run to finish
    pub async fn drain(&self) -> Result<(), FlowError> {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        while let Some(result) = tasks.join_next().await {
            result?;
        }
        Ok(())
    }
}

/// A run's place in the queue
struct RunTurn {
    previous: Option<oneshot::Receiver<()>>,
    finished: oneshot::Sender<()>,
}

impl RunTurn {
    /// Wait for the run that came before. Its sender is only ever dropped,
    /// so the receive error is the completion signal.
    async fn wait(&mut self, handle: &SessionHandle) {
        if let Some(previous) = self.previous.take() {
            debug!(session = %handle.id(), "waiting for superseded run to stop");
            let _ = previous.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::{ActionInterpreter, InterpreterConfig, MemoryPage};
    use pagepilot_core_types::Viewport;
    use serde_json::json;
    use std::time::Duration;

    fn agent() -> (Arc<MemoryPage>, PageAgent) {
        let page = Arc::new(MemoryPage::new(Viewport::default()));
        let interpreter = Arc::new(ActionInterpreter::new(
            page.clone(),
            InterpreterConfig::default(),
        ));
        (page, PageAgent::new(interpreter, RunnerConfig::default()))
    }

    fn execute(actions: Value, id: &str) -> InboundMessage {
        InboundMessage::ExecuteActions {
            actions,
            session_id: Some(SessionId::from(id)),
        }
    }

    #[test]
    fn parses_extension_messages() {
        let msg = InboundMessage::parse(r#"{"type":"CANCEL_ACTIONS"}"#).unwrap();
        assert_eq!(msg, InboundMessage::CancelActions { session_id: None });

        let msg =
            InboundMessage::parse(r#"{"type":"EXECUTE_ACTIONS","actions":[{"type":"wait"}]}"#)
                .unwrap();
        assert!(matches!(
            msg,
            InboundMessage::ExecuteActions {
                session_id: None,
                ..
            }
        ));

        assert!(InboundMessage::parse(r#"{"type":"PROCESS_COMMAND"}"#).is_err());
    }

    #[test]
    fn done_reply_shape() {
        let reply = OutboundMessage::Done {
            session_id: SessionId::from("s1"),
            outcome: RunOutcome::Completed,
            executed: 3,
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"status": "done", "session_id": "s1", "outcome": "completed", "executed": 3})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn execute_message_replies_done() {
        let (page, agent) = agent();
        let (tx, mut rx) = mpsc::channel(8);

        agent
            .dispatch(
                execute(json!([{"action": "scroll_down", "lines": 3}]), "s1"),
                &tx,
            )
            .await
            .unwrap();
        agent.drain().await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Done {
                session_id: SessionId::from("s1"),
                outcome: RunOutcome::Completed,
                executed: 1,
            })
        );
        assert_eq!(page.scroll_y(), 60);
        assert_eq!(agent.controller().active_session(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_message_stops_run_and_clears_overlay() {
        let (page, agent) = agent();
        let (tx, mut rx) = mpsc::channel(8);

        let actions = json!([
            {"type": "mouse_move", "parameters": {"x": 10, "y": 10}},
            {"type": "wait", "parameters": {"ms": 1000}},
            {"type": "scroll_down"}
        ]);
        agent.dispatch(execute(actions, "s1"), &tx).await.unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        agent
            .dispatch(InboundMessage::CancelActions { session_id: None }, &tx)
            .await
            .unwrap();
        agent.drain().await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Cancelled {
                session_id: Some(SessionId::from("s1"))
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Done {
                session_id: SessionId::from("s1"),
                outcome: RunOutcome::Cancelled,
                executed: 2,
            })
        );
        assert!(page.overlay().is_none());
        assert_eq!(page.scroll_y(), 0);
    }

    /// Cancel lands while the click visual is still waiting to revert
    async fn cancel_during_click(click: &str) {
        let (page, agent) = agent();
        let (tx, mut rx) = mpsc::channel(8);

        let actions = json!([
            {"type": "mouse_move", "parameters": {"x": 10, "y": 10}},
            {"type": click},
            {"type": "scroll_down"}
        ]);
        agent.dispatch(execute(actions, "s1"), &tx).await.unwrap();

        tokio::time::sleep(Duration::from_millis(550)).await;
        agent
            .dispatch(InboundMessage::CancelActions { session_id: None }, &tx)
            .await
            .unwrap();
        agent.drain().await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Cancelled {
                session_id: Some(SessionId::from("s1"))
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Done {
                session_id: SessionId::from("s1"),
                outcome: RunOutcome::Cancelled,
                executed: 2,
            })
        );
        assert!(page.overlay().is_none(), "{} revert re-created the overlay", click);
        assert_eq!(page.scroll_y(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_left_click_keeps_overlay_removed() {
        cancel_during_click("left_click").await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_right_click_keeps_overlay_removed() {
        cancel_during_click("right_click").await;
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_run_waits_for_old_run_to_stop() {
        let (page, agent) = agent();
        let (tx, mut rx) = mpsc::channel(8);

        agent
            .dispatch(
                execute(json!([{"type": "wait", "parameters": {"ms": 1000}}]), "old"),
                &tx,
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        agent
            .dispatch(execute(json!([{"type": "scroll_down"}]), "new"), &tx)
            .await
            .unwrap();
        assert_eq!(
            agent.controller().active_session(),
            Some(SessionId::from("new"))
        );

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(page.scroll_y(), 0, "new run started while the old one was mid-action");

        agent.drain().await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Done {
                session_id: SessionId::from("old"),
                outcome: RunOutcome::Cancelled,
                executed: 1,
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(OutboundMessage::Done {
                session_id: SessionId::from("new"),
                outcome: RunOutcome::Completed,
                executed: 1,
            })
        );
        assert_eq!(page.scroll_y(), 200);
        assert_eq!(agent.controller().active_session(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cancel_leaves_new_run_alone() {
        let (page, agent) = agent();
        let (tx, mut rx) = mpsc::channel(8);

        agent
            .dispatch(execute(json!([{"type": "wait"}]), "old"), &tx)
            .await
            .unwrap();
        agent
            .dispatch(execute(json!([{"type": "scroll_down"}]), "new"), &tx)
            .await
            .unwrap();
        agent
            .dispatch(
                InboundMessage::CancelActions {
                    session_id: Some(SessionId::from("old")),
                },
                &tx,
            )
            .await
            .unwrap();
        agent.drain().await.unwrap();

        let mut replies = Vec::new();
        while let Ok(reply) = rx.try_recv() {
            replies.push(reply);
        }
        assert!(replies.contains(&OutboundMessage::Ignored {
            session_id: SessionId::from("old")
        }));
        assert!(replies.contains(&OutboundMessage::Done {
            session_id: SessionId::from("new"),
            outcome: RunOutcome::Completed,
            executed: 1,
        }));
        assert_eq!(page.scroll_y(), 200);
    }

    #[tokio::test]
    async fn non_list_payload_is_rejected() {
        let (_page, agent) = agent();
        let (tx, _rx) = mpsc::channel(8);
        let err = agent
            .dispatch(execute(json!({"type": "wait"}), "s1"), &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Action(_)));
        assert_eq!(agent.controller().active_session(), None);
    }
}
