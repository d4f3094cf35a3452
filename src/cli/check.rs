use std::path::PathBuf;

use action_primitives::PageAction;
use anyhow::Result;
use clap::Args;
use serde_json::json;
use tracing::warn;

use crate::loader::load_actions;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Action list file (bare array or backend envelope)
    pub file: PathBuf,
}

pub async fn cmd_check(args: CheckArgs) -> Result<()> {
    let actions = load_actions(&args.file).await?;

    let unsupported: Vec<usize> = actions
        .iter()
        .enumerate()
        .filter(|(_, action)| matches!(action, PageAction::Unsupported { .. }))
        .map(|(index, _)| index)
        .collect();
    for index in &unsupported {
        warn!(index, kind = %actions[*index].label(), "action will be skipped");
    }

    let output = json!({
        "total": actions.len(),
        "unsupported": unsupported,
        "actions": actions,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
