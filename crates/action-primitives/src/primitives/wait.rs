//! Wait primitive

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::{errors::ActionError, interpreter::ActionInterpreter, primitives::Outcome};

/// Suspend the current sequence only; other tasks keep running.
pub(crate) async fn execute_wait(
    interpreter: &ActionInterpreter,
    ms: Option<u64>,
) -> Result<Outcome, ActionError> {
    let duration = ms
        .map(Duration::from_millis)
        .unwrap_or(interpreter.config().default_wait);
    debug!(ms = duration.as_millis() as u64, "waiting");
    sleep(duration).await;
    Ok(Outcome::Performed)
}
