use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{FbzoneError, Result};
use crate::session::snapshot::PageScripts;
use crate::session::{BrowserLauncher, BrowserSession, CaptureLog, SessionConfig};
use crate::site::AssetFilter;

/// Flags that keep the automation fingerprint low and the browser stable in
/// containers.
const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-notifications",
    "--disable-extensions",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Launches a fresh Chrome/Chromium per session via chromiumoxide.
#[derive(Debug, Default, Clone)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    pub fn new() -> Self {
        Self
    }

    fn browser_config(config: &SessionConfig) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                ..Default::default()
            })
            .args(LAUNCH_ARGS.iter().copied())
            .args(config.extra_args.iter().map(String::as_str));

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| FbzoneError::Browser(format!("Failed to build browser config: {}", e)))
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, config: &SessionConfig) -> Result<Box<dyn BrowserSession>> {
        let (mut browser, mut handler) = Browser::launch(Self::browser_config(config)?)
            .await
            .map_err(|e| {
                FbzoneError::Browser(format!(
                    "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                    e
                ))
            })?;

        // Spawn the browser handler
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Handle browser events
            }
        });

        let page = match open_page(&browser, &config.user_agent).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Box::new(ChromeSession {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
            capture_task: Mutex::new(None),
        }))
    }
}

async fn open_page(browser: &Browser, user_agent: &str) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| FbzoneError::Browser(format!("Failed to create page: {}", e)))?;

    page.set_user_agent(user_agent)
        .await
        .map_err(|e| FbzoneError::Browser(format!("Failed to set user agent: {}", e)))?;

    Ok(page)
}

pub struct ChromeSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
    capture_task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn start_capture(&self, filter: AssetFilter) -> Result<CaptureLog> {
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| FbzoneError::Browser(format!("Failed to listen for requests: {}", e)))?;

        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| FbzoneError::Browser(format!("Failed to enable interception: {}", e)))?;

        let log = CaptureLog::new();
        let writer = log.clone();
        let page = self.page.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let url = &event.request.url;
                if filter.accepts(url) && writer.record(url) {
                    debug!(url = %url, "captured asset request");
                }
                if let Err(e) = page
                    .execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                {
                    warn!(url = %url, error = %e, "failed to continue intercepted request");
                }
            }
        });

        if let Some(previous) = self.capture_task.lock().await.replace(task) {
            previous.abort();
        }
        Ok(log)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| FbzoneError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| FbzoneError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| FbzoneError::Script(format!("Failed to parse result: {:?}", e)))
    }

    async fn element_exists(&self, selector: &str) -> Result<bool> {
        let found = self.evaluate(&PageScripts::element_exists(selector)).await?;
        Ok(found.as_bool().unwrap_or(false))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| FbzoneError::Browser(format!("No element for '{}': {}", selector, e)))?
            .click()
            .await
            .map_err(|e| FbzoneError::Browser(format!("Click on '{}' failed: {}", selector, e)))?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(task) = self.capture_task.lock().await.take() {
            task.abort();
        }

        let Some(mut browser) = self.browser.lock().await.take() else {
            return;
        };
        if let Err(e) = browser.close().await {
            warn!(error = %e, "failed to close browser");
        }
        if let Err(e) = browser.wait().await {
            debug!(error = %e, "browser process wait failed");
        }
        self.handler_task.abort();
    }
}

impl Drop for ChromeSession {
    // Reached without `close` only when the session was abandoned. Dropping
    // the browser kills its process.
    fn drop(&mut self) {
        if let Some(task) = self.capture_task.get_mut().take() {
            task.abort();
        }
        self.handler_task.abort();
    }
}
