//! Action interpreter: one [`PageAction`] in, one effect (plus its visual
//! delay) out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::host::PageHost;
use crate::overlay::{CursorOverlay, OverlayStyle};
use crate::primitives::{self, Outcome};
use crate::types::{ActionReport, PageAction, Toast};

/// What to do with a `mouse_move` that only names a box identifier.
///
/// Only the identifier is known, not its geometry, so any position is a
/// guess. The fallback stays deterministic and configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxFallback {
    /// Move to the centre of the viewport and tag the cursor
    #[default]
    ViewportCenter,

    /// Tag the cursor, leave its position alone
    Ignore,
}

#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Pressed state duration for `left_click`
    pub click_revert: Duration,

    /// Colour pulse duration for `right_click`
    pub pulse: Duration,

    pub scroll_px_per_line: i64,
    pub default_scroll_lines: u32,
    pub default_wait: Duration,

    pub toast_lifetime: Duration,
    pub toast_fade: Duration,

    pub box_fallback: BoxFallback,
    pub overlay_style: OverlayStyle,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            click_revert: Duration::from_millis(200),
            pulse: Duration::from_millis(200),
            scroll_px_per_line: 20,
            default_scroll_lines: 10,
            default_wait: Duration::from_millis(1000),
            toast_lifetime: Duration::from_millis(3000),
            toast_fade: Duration::from_millis(500),
            box_fallback: BoxFallback::ViewportCenter,
            overlay_style: OverlayStyle::default(),
        }
    }
}

impl InterpreterConfig {
    pub fn toast(&self, text: impl Into<String>) -> Toast {
        Toast {
            text: text.into(),
            lifetime_ms: self.toast_lifetime.as_millis() as u64,
            fade_ms: self.toast_fade.as_millis() as u64,
        }
    }
}

/// Performs single actions on behalf of a sequence runner.
///
/// `perform` never fails: per-action faults are logged and reported, so a
/// bad action cannot abort the surrounding sequence.
#[async_trait]
pub trait ActionPerformer: Send + Sync {
    async fn perform(&self, action: &PageAction) -> ActionReport;

    /// Remove any visual state left on the page. Returns whether something
    /// was removed.
    async fn teardown(&self) -> bool;
}

pub struct ActionInterpreter {
    host: Arc<dyn PageHost>,
    overlay: Arc<CursorOverlay>,
    config: InterpreterConfig,
}

impl ActionInterpreter {
    pub fn new(host: Arc<dyn PageHost>, config: InterpreterConfig) -> Self {
        let overlay = Arc::new(CursorOverlay::new(
            host.clone(),
            config.overlay_style.clone(),
        ));
        Self {
            host,
            overlay,
            config,
        }
    }

    pub fn host(&self) -> &Arc<dyn PageHost> {
        &self.host
    }

    pub fn overlay(&self) -> &Arc<CursorOverlay> {
        &self.overlay
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    async fn dispatch(&self, action: &PageAction) -> Result<Outcome, crate::ActionError> {
        match action {
            PageAction::MovePointer { point, box_id } => {
                primitives::execute_move(self, *point, box_id.as_deref()).await
            }
            PageAction::PrimaryClick => primitives::execute_primary_click(self).await,
            PageAction::SecondaryClick => primitives::execute_secondary_click(self).await,
            PageAction::SendKeys { input } => {
                primitives::execute_send_keys(self, input.as_ref()).await
            }
            PageAction::Scroll { direction, lines } => {
                primitives::execute_scroll(self, *direction, *lines).await
            }
            PageAction::Navigate { url } => {
                primitives::execute_navigate(self, url.as_deref()).await
            }
            PageAction::Tab { op } => primitives::execute_tab(self, *op).await,
            PageAction::Wait { ms } => primitives::execute_wait(self, *ms).await,
            PageAction::Notify { text } => primitives::execute_notify(self, text.as_deref()).await,
            PageAction::Unsupported { tag } => {
                warn!(kind = ?tag, "unsupported action; skipping");
                Ok(Outcome::Skipped("unsupported action kind".to_string()))
            }
        }
    }
}

#[async_trait]
impl ActionPerformer for ActionInterpreter {
    async fn perform(&self, action: &PageAction) -> ActionReport {
        let started_at = Utc::now();
        let start_instant = Instant::now();
        let kind = action.label();

        debug!(kind = %kind, ?action, "Executing action");
        let result = self.dispatch(action).await;
        let latency_ms = start_instant.elapsed().as_millis() as u64;

        match result {
            Ok(Outcome::Performed) => {
                info!(kind = %kind, latency_ms, "Action performed");
                ActionReport::performed(kind, started_at, latency_ms)
            }
            Ok(Outcome::Skipped(reason)) => {
                debug!(kind = %kind, reason = %reason, "Action skipped");
                ActionReport::skipped(kind, started_at, latency_ms, reason)
            }
            Err(err) => {
                warn!(kind = %kind, error = %err, "Action failed; continuing");
                ActionReport::failure(kind, started_at, latency_ms, &err)
            }
        }
    }

    async fn teardown(&self) -> bool {
        match self.overlay.destroy().await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(error = %err, "failed to remove cursor overlay");
                false
            }
        }
    }
}
