//! Test doubles for the browser and outbound HTTP seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::app::{FbzoneError, Result};
use crate::fetcher::{AssetFetcher, AssetResponse, HeaderList};
use crate::session::{BrowserLauncher, BrowserSession, CaptureLog, PageScripts, SessionConfig};
use crate::site::AssetFilter;

#[derive(Clone)]
enum Canned {
    Response {
        status: u16,
        content_type: Option<String>,
        body: Bytes,
        content_length: Option<u64>,
    },
    Failure,
}

/// Serves canned responses by exact URL; anything else is a 404.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Canned>,
    requested: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(mut self, url: &str, canned: Canned) -> Self {
        self.responses.insert(url.to_string(), canned);
        self
    }

    pub fn with(self, url: &str, status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let content_length = Some(body.len() as u64);
        self.insert(
            url,
            Canned::Response {
                status,
                content_type: Some(content_type.to_string()),
                body,
                content_length,
            },
        )
    }

    /// Response that advertises `declared` as its length.
    pub fn with_length(
        self,
        url: &str,
        status: u16,
        content_type: &str,
        body: impl Into<Bytes>,
        declared: u64,
    ) -> Self {
        self.insert(
            url,
            Canned::Response {
                status,
                content_type: Some(content_type.to_string()),
                body: body.into(),
                content_length: Some(declared),
            },
        )
    }

    /// Response without a `Content-Length`.
    pub fn chunked(self, url: &str, status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.insert(
            url,
            Canned::Response {
                status,
                content_type: Some(content_type.to_string()),
                body: body.into(),
                content_length: None,
            },
        )
    }

    pub fn failing(self, url: &str) -> Self {
        self.insert(url, Canned::Failure)
    }

    /// Every response takes `delay` to arrive.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn get(&self, url: &str, _headers: &HeaderList<'_>) -> Result<AssetResponse> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.responses.get(url).cloned() {
            Some(Canned::Response {
                status,
                content_type,
                body,
                content_length,
            }) => {
                let mut response = AssetResponse::buffered(status, content_type.as_deref(), body);
                response.content_length = content_length;
                Ok(response)
            }
            Some(Canned::Failure) => Err(FbzoneError::Other("connection reset".into())),
            None => Ok(AssetResponse::buffered(404, Some("text/html"), "not found")),
        }
    }
}

/// How a [`FakeSession`] behaves.
#[derive(Clone, Default)]
pub struct FakePage {
    /// Markup returned by the snapshot script.
    pub markup: String,
    /// URLs the page "requests" once navigation starts.
    pub requests: Vec<String>,
    /// Selectors reported present.
    pub present: Vec<String>,
    pub fail_launch: bool,
    pub fail_navigation: bool,
    pub navigation_delay: Option<Duration>,
    pub hang_snapshot: bool,
    /// Every content size check reports more images than the last.
    pub lazy_content: bool,
}

/// Shared record of what fake sessions did.
#[derive(Default)]
pub struct FakeEvents {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub size_checks: AtomicUsize,
    pub log: Mutex<Vec<String>>,
}

impl FakeEvents {
    fn push(&self, event: impl Into<String>) {
        self.log.lock().unwrap().push(event.into());
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct FakeLauncher {
    page: FakePage,
    pub events: Arc<FakeEvents>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            events: Arc::new(FakeEvents::default()),
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, _config: &SessionConfig) -> Result<Box<dyn BrowserSession>> {
        if self.page.fail_launch {
            return Err(FbzoneError::Browser("no chrome here".into()));
        }
        self.events.launches.fetch_add(1, Ordering::SeqCst);
        self.events.push("launch");
        Ok(Box::new(FakeSession {
            page: self.page.clone(),
            events: self.events.clone(),
            capture: Mutex::new(None),
        }))
    }
}

pub struct FakeSession {
    page: FakePage,
    events: Arc<FakeEvents>,
    capture: Mutex<Option<(AssetFilter, CaptureLog)>>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn start_capture(&self, filter: AssetFilter) -> Result<CaptureLog> {
        self.events.push("capture");
        let log = CaptureLog::new();
        *self.capture.lock().unwrap() = Some((filter, log.clone()));
        Ok(log)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.events.push(format!("navigate {}", url));
        // Requests only reach the log if capture was attached first.
        {
            let capture = self.capture.lock().unwrap();
            if let Some((filter, log)) = capture.as_ref() {
                for request in &self.page.requests {
                    if filter.accepts(request) {
                        log.record(request);
                    }
                }
            }
        }
        if let Some(delay) = self.page.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        if self.page.fail_navigation {
            return Err(FbzoneError::Navigation(format!("{}: net::ERR_FAILED", url)));
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        if script == PageScripts::snapshot() {
            self.events.push("snapshot");
            if self.page.hang_snapshot {
                futures::future::pending::<()>().await;
            }
            return Ok(serde_json::Value::String(self.page.markup.clone()));
        }
        if script == PageScripts::content_size() {
            let checks = self.events.size_checks.fetch_add(1, Ordering::SeqCst);
            let images = if self.page.lazy_content { checks } else { 0 };
            return Ok(serde_json::Value::String(format!("{}:1080", images)));
        }
        Ok(serde_json::Value::Bool(true))
    }

    async fn element_exists(&self, selector: &str) -> Result<bool> {
        Ok(self.page.present.iter().any(|s| s == selector))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.events.push(format!("click {}", selector));
        Ok(())
    }

    async fn close(&self) {
        self.events.closes.fetch_add(1, Ordering::SeqCst);
        self.events.push("close");
    }
}

/// Session timings small enough for tests.
pub fn quick_config() -> SessionConfig {
    SessionConfig {
        navigation_timeout_secs: 1,
        element_wait_secs: 0,
        popup_wait_secs: 0,
        settle_after_load_ms: 0,
        settle_after_click_ms: 0,
        settle_after_scroll_ms: 0,
        poll_interval_ms: 1,
        extraction_timeout_secs: 2,
        ..Default::default()
    }
}
