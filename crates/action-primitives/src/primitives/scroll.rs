//! Scroll primitive - viewport scrolling by lines

use tracing::debug;

use crate::{
    errors::ActionError,
    interpreter::ActionInterpreter,
    primitives::Outcome,
    types::{ScrollBehavior, ScrollDirection},
};

pub(crate) async fn execute_scroll(
    interpreter: &ActionInterpreter,
    direction: ScrollDirection,
    lines: Option<u32>,
) -> Result<Outcome, ActionError> {
    let dy = scroll_delta(interpreter, direction, lines);
    debug!(dy, "scrolling viewport");
    interpreter
        .host()
        .scroll_by(dy, ScrollBehavior::Smooth)
        .await?;
    Ok(Outcome::Performed)
}

pub(crate) fn scroll_delta(
    interpreter: &ActionInterpreter,
    direction: ScrollDirection,
    lines: Option<u32>,
) -> i64 {
    let config = interpreter.config();
    let lines = i64::from(lines.unwrap_or(config.default_scroll_lines));
    lines
        .saturating_mul(config.scroll_px_per_line)
        .saturating_mul(direction.sign())
}
