use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::app::{FbzoneError, Result};
use crate::domain::{ExtractedMetadata, ExtractionRequest, MediaKind};
use crate::fetcher::{AssetFetcher, GraphClient};
use crate::miner::{MinedPage, Miner};
use crate::normalizer::Normalizer;
use crate::session::snapshot::PageScripts;
use crate::session::{poll_until, BrowserLauncher, BrowserSession, SessionConfig, SessionState};
use crate::site::SiteAdapter;
use crate::validator::{Selection, SelectionPolicy, Validator};

const DESKTOP_HEADERS: &[(&str, &str)] = &[(
    "User-Agent",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
)];

/// What one browser session produced.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub mined: MinedPage,
    /// Intercepted asset URLs in first-seen order.
    pub captured: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescription {
    pub title: String,
    pub description: String,
}

/// Runs the extraction flows. Shared by all requests; each call launches
/// its own browser.
pub struct Orchestrator {
    launcher: Arc<dyn BrowserLauncher>,
    adapter: Arc<dyn SiteAdapter>,
    fetcher: Arc<dyn AssetFetcher>,
    validator: Validator,
    graph: Option<GraphClient>,
    miner: Miner,
    normalizer: Normalizer,
    config: SessionConfig,
    sessions: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        adapter: Arc<dyn SiteAdapter>,
        fetcher: Arc<dyn AssetFetcher>,
        config: SessionConfig,
    ) -> Self {
        let validator = Validator::new(fetcher.clone(), adapter.clone())
            .with_budget(config.validation_timeout());
        let sessions = Arc::new(Semaphore::new(config.max_sessions.max(1)));
        Self {
            launcher,
            adapter,
            fetcher,
            validator,
            graph: None,
            miner: Miner::new(),
            normalizer: Normalizer::new(),
            config,
            sessions,
        }
    }

    pub fn with_graph(mut self, graph: GraphClient) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_miner(mut self, miner: Miner) -> Self {
        self.miner = miner;
        self
    }

    pub fn adapter(&self) -> &dyn SiteAdapter {
        self.adapter.as_ref()
    }

    pub fn fetcher(&self) -> &Arc<dyn AssetFetcher> {
        &self.fetcher
    }

    pub async fn scrape_video(&self, url: &str) -> Result<ExtractedMetadata> {
        let request = ExtractionRequest::new(url, MediaKind::Video)?;
        let extraction = self.extract_page(&request).await?;
        Ok(extraction.mined.metadata)
    }

    /// Ranked candidate list for a photo page, before validation.
    pub async fn photo_candidates(&self, url: &str) -> Result<Vec<String>> {
        let request = ExtractionRequest::new(url, MediaKind::Photo)?;
        let graph_seeds = self.graph_seeds(&request).await;
        let extraction = self.extract_page(&request).await?;

        let seeds = graph_seeds
            .into_iter()
            .chain(extraction.mined.asset_urls)
            .chain(extraction.captured);
        let candidates = self.adapter.synthesis_rules().expand_all(seeds);
        info!(count = candidates.len(), "photo candidates synthesized");
        Ok(candidates)
    }

    pub async fn scrape_photo(&self, url: &str) -> Result<Selection> {
        let candidates = self.photo_candidates(url).await?;
        Ok(self
            .validator
            .select(&candidates, SelectionPolicy::Exhaustive)
            .await)
    }

    /// Ranked candidate list for a profile picture, before validation.
    pub async fn profile_candidates(&self, url: &str) -> Result<Vec<String>> {
        let request = ExtractionRequest::new(url, MediaKind::ProfilePicture)?;
        let extraction = self.extract_page(&request).await?;
        let PageExtraction { mined, captured } = extraction;

        let logo = mined.metadata.creator_logo.value().map(str::to_string);
        let adapter = self.adapter.as_ref();
        let seeds = logo.into_iter().chain(
            mined
                .asset_urls
                .into_iter()
                .chain(captured)
                .filter(|u| adapter.is_profile_picture(u)),
        );
        let candidates = adapter.synthesis_rules().expand_all(seeds);
        info!(count = candidates.len(), "profile candidates synthesized");
        Ok(candidates)
    }

    pub async fn download_profile_picture(&self, url: &str) -> Result<Selection> {
        let candidates = self.profile_candidates(url).await?;
        Ok(self
            .validator
            .select(&candidates, SelectionPolicy::OriginalFastPath)
            .await)
    }

    /// Title and description, from Open Graph tags when the page serves
    /// them, else from a full video scrape.
    pub async fn describe(&self, url: &str) -> Result<PageDescription> {
        let request = ExtractionRequest::new(url, MediaKind::Video)?;

        match self.fetch_page_meta(request.target_url().as_str()).await {
            Ok(meta) if !meta.is_empty() => {
                return Ok(PageDescription {
                    title: meta.title,
                    description: meta.description,
                });
            }
            Ok(_) => debug!("page carries no open graph text"),
            Err(e) => warn!(error = %e, "page fetch failed"),
        }

        info!("falling back to browser scrape for description");
        let metadata = self.extract_page(&request).await?.mined.metadata;
        Ok(PageDescription {
            title: metadata.creator.to_string(),
            description: metadata.description.to_string(),
        })
    }

    async fn fetch_page_meta(&self, url: &str) -> Result<crate::normalizer::PageMeta> {
        let response = self.fetcher.get(url, DESKTOP_HEADERS).await?;
        if !response.is_success() {
            return Err(FbzoneError::Other(format!("status {}", response.status)));
        }
        let body = response.bytes().await?;
        Ok(self.normalizer.page_meta(&body))
    }

    async fn graph_seeds(&self, request: &ExtractionRequest) -> Vec<String> {
        let Some(graph) = &self.graph else {
            return Vec::new();
        };
        let Some(photo_id) = self.adapter.graph_photo_id(request.target_url()) else {
            return Vec::new();
        };
        match graph.photo_sources(&photo_id).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(photo_id, error = %e, "graph lookup failed");
                Vec::new()
            }
        }
    }

    /// Run one browser session for `request`. The session is closed before
    /// this returns, whatever the outcome.
    pub async fn extract_page(&self, request: &ExtractionRequest) -> Result<PageExtraction> {
        let content_id = self
            .adapter
            .content_id(request.target_url())
            .unwrap_or_default();
        let span = info_span!(
            "extract",
            kind = %request.kind(),
            url = %request.target_url(),
            content_id = %content_id,
        );

        async {
            let queue_timeout = self.config.queue_timeout();
            let _permit = timeout(queue_timeout, self.sessions.acquire())
                .await
                .map_err(|_| {
                    FbzoneError::Timeout(format!(
                        "no browser slot free within {}s",
                        queue_timeout.as_secs()
                    ))
                })?
                .map_err(|e| FbzoneError::Browser(format!("Session limiter closed: {}", e)))?;

            info!(state = %SessionState::Created, "session state");
            let guard = SessionGuard::new(self.launcher.launch(&self.config).await?);
            info!(state = %SessionState::Launched, "session state");

            let deadline = self.config.extraction_timeout();
            let result = match timeout(deadline, self.drive(guard.session(), request)).await {
                Ok(result) => result,
                Err(_) => Err(FbzoneError::Timeout(format!(
                    "extraction exceeded {}s",
                    deadline.as_secs()
                ))),
            };

            guard.close().await;
            info!(state = %SessionState::Closed, ok = result.is_ok(), "session state");
            result
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        request: &ExtractionRequest,
    ) -> Result<PageExtraction> {
        let capture = session
            .start_capture(self.adapter.asset_filter().clone())
            .await?;

        info!(state = %SessionState::NavigationPending, "session state");
        let url = request.target_url().as_str();
        let nav_timeout = self.config.navigation_timeout();
        timeout(nav_timeout, session.navigate(url))
            .await
            .map_err(|_| {
                FbzoneError::Timeout(format!(
                    "navigation to {} exceeded {}s",
                    url,
                    nav_timeout.as_secs()
                ))
            })??;

        info!(state = %SessionState::Interactive, "session state");
        self.interact(session, request.kind()).await;

        info!(state = %SessionState::Extracting, "session state");
        let markup = match session.evaluate(&PageScripts::snapshot()).await? {
            serde_json::Value::String(markup) => markup,
            other => {
                return Err(FbzoneError::Script(format!(
                    "snapshot returned {} instead of markup",
                    other
                )))
            }
        };
        let mined = self.miner.mine(&markup, url, self.adapter.as_ref());
        let captured = capture.snapshot();
        debug!(
            mined = mined.asset_urls.len(),
            captured = captured.len(),
            "page extracted"
        );

        Ok(PageExtraction { mined, captured })
    }

    /// Best-effort page preparation. Nothing here fails the request.
    async fn interact(&self, session: &dyn BrowserSession, kind: MediaKind) {
        let rules = self.adapter.interaction_rules();

        if self
            .wait_for(session, &rules.popup_close, self.config.popup_wait())
            .await
        {
            match session.click(&rules.popup_close).await {
                Ok(()) => {
                    debug!("interstitial dismissed");
                    self.settle(session, self.config.settle_after_click()).await;
                }
                Err(e) => warn!(error = %e, "could not dismiss interstitial"),
            }
        }

        match kind {
            MediaKind::Video => {
                if !self
                    .wait_for(session, &rules.video_ready_marker, self.config.element_wait())
                    .await
                {
                    warn!(selector = %rules.video_ready_marker, "creator heading did not appear");
                }
            }
            MediaKind::Photo => self.expand(session, &rules.photo_expand).await,
            MediaKind::ProfilePicture => self.expand(session, &rules.profile_expand).await,
        }

        self.settle(session, self.config.settle_after_load()).await;

        for script in [PageScripts::scroll_to_bottom(), PageScripts::scroll_to_top()] {
            let before = content_size(session).await;
            if let Err(e) = session.evaluate(script).await {
                warn!(error = %e, "scroll failed");
            }
            self.settle_after_scroll(session, before).await;
        }
    }

    /// Wait for lazily loaded content after a scroll. A page where nothing
    /// new appears is given the full bound.
    async fn settle_after_scroll(
        &self,
        session: &dyn BrowserSession,
        before: Option<serde_json::Value>,
    ) {
        let max = self.config.settle_after_scroll();
        if max.is_zero() {
            return;
        }
        let started = Instant::now();
        let before = &before;
        let grew = poll_until(
            move || async move {
                let now = content_size(session).await;
                now.is_some() && now != *before
            },
            self.config.poll_interval(),
            max,
        )
        .await;

        if grew {
            debug!("new content after scroll");
            self.settle(session, max.saturating_sub(started.elapsed()))
                .await;
        }
    }

    /// Click the first present selector, if any.
    async fn expand(&self, session: &dyn BrowserSession, selectors: &[String]) {
        for selector in selectors {
            if !session.element_exists(selector).await.unwrap_or(false) {
                continue;
            }
            match session.click(selector).await {
                Ok(()) => {
                    debug!(selector = %selector, "expanded media");
                    self.settle(session, self.config.settle_after_click()).await;
                }
                Err(e) => warn!(selector = %selector, error = %e, "expand click failed"),
            }
            return;
        }
        debug!("no expand target present");
    }

    async fn wait_for(
        &self,
        session: &dyn BrowserSession,
        selector: &str,
        max: Duration,
    ) -> bool {
        poll_until(
            move || async move { session.element_exists(selector).await.unwrap_or(false) },
            self.config.poll_interval(),
            max,
        )
        .await
    }

    /// Wait until the document and its images have loaded, at most `max`.
    async fn settle(&self, session: &dyn BrowserSession, max: Duration) {
        if max.is_zero() {
            return;
        }
        let ready = poll_until(
            move || async move {
                session
                    .evaluate(PageScripts::readiness())
                    .await
                    .map(|v| v.as_bool().unwrap_or(false))
                    .unwrap_or(false)
            },
            self.config.poll_interval(),
            max,
        )
        .await;
        if ready {
            // Late layout work still lands after readiness flips.
            sleep(self.config.poll_interval()).await;
        } else {
            debug!(max_ms = max.as_millis() as u64, "page did not settle");
        }
    }
}

async fn content_size(session: &dyn BrowserSession) -> Option<serde_json::Value> {
    session.evaluate(PageScripts::content_size()).await.ok()
}

/// Owns a launched session until it is closed. If the extraction future is
/// dropped first, the browser is closed on a background task.
struct SessionGuard {
    session: Arc<dyn BrowserSession>,
    closed: bool,
}

impl SessionGuard {
    fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Arc::from(session),
            closed: false,
        }
    }

    fn session(&self) -> &dyn BrowserSession {
        self.session.as_ref()
    }

    async fn close(mut self) {
        self.session.close().await;
        self.closed = true;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let session = self.session.clone();
        match Handle::try_current() {
            Ok(handle) => {
                warn!("extraction cancelled, closing browser in background");
                handle.spawn(async move { session.close().await });
            }
            Err(_) => warn!("extraction cancelled outside a runtime, browser not closed"),
        }
    }
}
