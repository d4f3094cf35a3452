//! Notification primitives - tab operations and explicit notifications

use tracing::{info, warn};

use crate::{
    errors::ActionError,
    interpreter::ActionInterpreter,
    primitives::Outcome,
    types::TabOp,
};

/// Tab operations cannot be carried out from inside a page; the attempt is
/// surfaced to the user instead.
pub(crate) async fn execute_tab(
    interpreter: &ActionInterpreter,
    op: TabOp,
) -> Result<Outcome, ActionError> {
    let kind = op.kind().as_str();
    info!(kind = %kind, "tab action not available inside the page");
    let toast = interpreter.config().toast(format!("Action: {}", kind));
    interpreter.host().show_toast(&toast).await?;
    Ok(Outcome::Performed)
}

pub(crate) async fn execute_notify(
    interpreter: &ActionInterpreter,
    text: Option<&str>,
) -> Result<Outcome, ActionError> {
    let Some(text) = text else {
        warn!("notification without text");
        return Ok(Outcome::skipped("no text"));
    };
    let toast = interpreter.config().toast(text);
    interpreter.host().show_toast(&toast).await?;
    Ok(Outcome::Performed)
}
