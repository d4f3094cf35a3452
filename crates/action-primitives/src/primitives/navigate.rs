//! Navigate primitive - replace the page location

use tracing::{info, warn};

use crate::{
    errors::ActionError, interpreter::ActionInterpreter, primitives::Outcome,
};

/// Returns as soon as navigation is requested; the page may still be loading
/// (or already gone) when the next action runs.
pub(crate) async fn execute_navigate(
    interpreter: &ActionInterpreter,
    url: Option<&str>,
) -> Result<Outcome, ActionError> {
    let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) else {
        warn!("navigate_to_link without url");
        return Ok(Outcome::skipped("no url"));
    };

    info!(url = %url, "navigating");
    interpreter.host().navigate(url).await?;
    Ok(Outcome::Performed)
}
