use std::path::PathBuf;
use std::sync::Arc;

use action_flow::PageAgent;
use action_primitives::{ActionInterpreter, MemoryPage};
use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::context::CliContext;
use crate::config::parse_viewport;
use crate::loader::load_actions;

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Action list file (bare array or backend envelope)
    pub file: PathBuf,

    /// Viewport of the simulated page
    #[arg(long, default_value = "1280x720", value_name = "WxH")]
    pub viewport: String,

    /// Override the delay between actions
    #[arg(long, value_name = "MS")]
    pub pacing_ms: Option<u64>,

    /// Replay against a live Chromium page opened at this URL
    #[cfg(feature = "chromium")]
    #[arg(long)]
    pub url: Option<String>,

    /// Show the browser window
    #[cfg(feature = "chromium")]
    #[arg(long)]
    pub headed: bool,
}

pub async fn cmd_replay(args: ReplayArgs, ctx: &CliContext) -> Result<()> {
    let actions = load_actions(&args.file).await?;
    let viewport = parse_viewport(&args.viewport)?;

    let mut config = ctx.config().clone();
    if let Some(pacing_ms) = args.pacing_ms {
        config.pacing_ms = pacing_ms;
    }

    #[cfg(feature = "chromium")]
    if let Some(url) = &args.url {
        return crate::chromium::replay(url, viewport, args.headed, actions, &config).await;
    }

    let page = Arc::new(MemoryPage::new(viewport));
    let interpreter = Arc::new(ActionInterpreter::new(page.clone(), config.interpreter()));
    let agent = PageAgent::new(interpreter, config.runner());
    let report = agent.execute(actions, None).await;

    let output = json!({
        "report": report,
        "journal": page.journal(),
        "page": {
            "location": page.location(),
            "scroll_y": page.scroll_y(),
            "overlay": page.overlay(),
            "toasts": page.toasts(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
