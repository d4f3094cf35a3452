//! Action list files.

use std::path::Path;

use action_primitives::{decode_envelope, PageAction};
use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

/// Read an action list from `path`. Accepts a bare JSON array or one of the
/// backend envelopes (`commands`, `actions`, `error`).
pub async fn load_actions(path: &Path) -> Result<Vec<PageAction>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read action file {}", path.display()))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("Action file {} is not valid JSON", path.display()))?;
    let actions = decode_envelope(&payload)
        .with_context(|| format!("Failed to decode actions from {}", path.display()))?;
    debug!(path = %path.display(), count = actions.len(), "loaded action list");
    Ok(actions)
}
