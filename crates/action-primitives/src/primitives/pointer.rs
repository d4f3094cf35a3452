//! Pointer primitives - move, primary click, secondary click

use pagepilot_core_types::Point;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    errors::ActionError,
    interpreter::{ActionInterpreter, BoxFallback},
    primitives::Outcome,
};

/// Move the cursor overlay.
///
/// Explicit coordinates always win. A box identifier on its own falls back
/// to the configured [`BoxFallback`]; either way the cursor is tagged with
/// the identifier.
pub(crate) async fn execute_move(
    interpreter: &ActionInterpreter,
    point: Option<Point>,
    box_id: Option<&str>,
) -> Result<Outcome, ActionError> {
    let overlay = interpreter.overlay();
    overlay.ensure().await?;

    if let Some(id) = box_id {
        overlay.set_label(Some(format!("Box {}", id))).await?;
    }

    let target = match (point, box_id) {
        (Some(point), _) => point,
        (None, Some(id)) => match interpreter.config().box_fallback {
            BoxFallback::ViewportCenter => {
                let viewport = interpreter.host().viewport().await?;
                debug!(box_id = %id, "no coordinates for box; using viewport centre");
                viewport.center()
            }
            BoxFallback::Ignore => {
                return Ok(Outcome::skipped("box identifier without coordinates"));
            }
        },
        (None, None) => {
            warn!("mouse_move without coordinates or box identifier");
            return Ok(Outcome::skipped("no coordinates"));
        }
    };

    overlay.move_to(target).await?;
    Ok(Outcome::Performed)
}

/// Click whatever sits under the cursor.
///
/// The pressed visual is always reverted after the configured delay, even
/// when activation fails. A cancel that removed the overlay in the meantime
/// leaves it removed.
pub(crate) async fn execute_primary_click(
    interpreter: &ActionInterpreter,
) -> Result<Outcome, ActionError> {
    let overlay = interpreter.overlay();
    overlay.set_pressed(true).await?;

    let result = activate_under_cursor(interpreter).await;

    sleep(interpreter.config().click_revert).await;
    overlay.restore_idle().await?;
    result
}

async fn activate_under_cursor(interpreter: &ActionInterpreter) -> Result<Outcome, ActionError> {
    let position = interpreter.overlay().position();
    let host = interpreter.host();
    match host.element_at(position).await? {
        Some(element) => {
            debug!(element = %element, position = %position, "activating element");
            host.activate(&element).await?;
            Ok(Outcome::Performed)
        }
        None => {
            debug!(position = %position, "no element under cursor");
            Ok(Outcome::skipped("no element under cursor"))
        }
    }
}

/// Visual-only feedback; secondary clicks have no page effect.
pub(crate) async fn execute_secondary_click(
    interpreter: &ActionInterpreter,
) -> Result<Outcome, ActionError> {
    let overlay = interpreter.overlay();
    overlay.set_pulse(true).await?;
    sleep(interpreter.config().pulse).await;
    overlay.restore_idle().await?;
    Ok(Outcome::Performed)
}
