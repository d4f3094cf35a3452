//! Live page host backed by a launched Chromium instance.

use std::sync::Arc;

use action_flow::PageAgent;
use action_primitives::{ActionInterpreter, HostError, PageAction, ScriptEvaluator, ScriptPage};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use pagepilot_core_types::Viewport;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Evaluates host scripts in one Chromium page over the DevTools protocol
pub struct ChromiumEvaluator {
    page: Page,
}

impl ChromiumEvaluator {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl ScriptEvaluator for ChromiumEvaluator {
    async fn evaluate(&self, script: &str) -> Result<Value, HostError> {
        let result = self
            .page
            .evaluate(script.to_string())
            .await
            .map_err(|err| HostError::Script(err.to_string()))?;
        result
            .into_value::<Value>()
            .map_err(|err| HostError::Protocol(err.to_string()))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    pub async fn launch(viewport: Viewport, headed: bool) -> Result<Self> {
        let mut builder =
            BrowserConfig::builder().window_size(viewport.width as u32, viewport.height as u32);
        if headed {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|err| anyhow!("browser config error: {}", err))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chromium")?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "browser handler stopped");
                    break;
                }
            }
        });
        info!(headed, "Chromium launched");
        Ok(Self { browser, handler })
    }

    pub async fn open(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;
        page.wait_for_navigation()
            .await
            .with_context(|| format!("Navigation to {} did not finish", url))?;
        Ok(page)
    }

    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "failed to close browser");
        }
        self.handler.abort();
    }
}

/// Replay `actions` on a fresh Chromium page opened at `url`
pub async fn replay(
    url: &str,
    viewport: Viewport,
    headed: bool,
    actions: Vec<PageAction>,
    config: &Config,
) -> Result<()> {
    let session = ChromiumSession::launch(viewport, headed).await?;
    let page = session.open(url).await?;
    let host = Arc::new(ScriptPage::new(Arc::new(ChromiumEvaluator::new(page))));
    let interpreter = Arc::new(ActionInterpreter::new(host, config.interpreter()));
    let agent = PageAgent::new(interpreter, config.runner());

    let report = agent.execute(actions, None).await;
    session.close().await;

    let output = json!({ "url": url, "report": report });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
