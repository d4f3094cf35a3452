use std::sync::Arc;

use action_flow::{InboundMessage, OutboundMessage, PageAgent};
use action_primitives::{ActionInterpreter, MemoryPage};
use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::context::CliContext;
use crate::config::parse_viewport;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Args, Clone, Debug)]
pub struct BridgeArgs {
    /// Viewport of the simulated page
    #[arg(long, default_value = "1280x720", value_name = "WxH")]
    pub viewport: String,

    /// Also write run lifecycle events to stdout
    #[arg(long)]
    pub events: bool,
}

/// Read `EXECUTE_ACTIONS` / `CANCEL_ACTIONS` messages from stdin, one per
/// line, and write every reply as one JSON line on stdout. Runs until stdin
/// is closed and every started run has finished.
pub async fn cmd_bridge(args: BridgeArgs, ctx: &CliContext) -> Result<()> {
    let viewport = parse_viewport(&args.viewport)?;
    let config = ctx.config();
    let page = Arc::new(MemoryPage::new(viewport));
    let interpreter = Arc::new(ActionInterpreter::new(page, config.interpreter()));
    let agent = PageAgent::new(interpreter, config.runner());

    let (line_tx, mut line_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = line_rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let (reply_tx, mut reply_rx) = mpsc::channel::<OutboundMessage>(CHANNEL_CAPACITY);
    let replies = {
        let line_tx = line_tx.clone();
        tokio::spawn(async move {
            while let Some(reply) = reply_rx.recv().await {
                if !forward(&line_tx, &reply).await {
                    break;
                }
            }
        })
    };

    let events = if args.events {
        let mut events = pagepilot_event_bus::to_mpsc(agent.events(), CHANNEL_CAPACITY);
        let line_tx = line_tx.clone();
        Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if !forward(&line_tx, &event).await {
                    break;
                }
            }
        }))
    } else {
        None
    };
    drop(line_tx);

    info!("bridge ready; reading messages from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let result = match InboundMessage::parse(line) {
            Ok(message) => agent.dispatch(message, &reply_tx).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(error = %err, "rejected inbound message");
            if reply_tx.send(OutboundMessage::error(&err)).await.is_err() {
                break;
            }
        }
    }

    debug!("stdin closed; waiting for running sessions");
    agent.drain().await?;
    drop(reply_tx);
    drop(agent);

    replies.await.context("reply forwarder failed")?;
    if let Some(events) = events {
        events.await.context("event forwarder failed")?;
    }
    writer
        .await
        .context("stdout writer failed")?
        .context("Failed to write to stdout")?;
    Ok(())
}

/// Encode `value` as one output line. Returns false once stdout is gone.
async fn forward<T: serde::Serialize>(line_tx: &mpsc::Sender<String>, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(line) => line_tx.send(line).await.is_ok(),
        Err(err) => {
            warn!(error = %err, "failed to encode output line");
            true
        }
    }
}
