//! Browser sessions.
//!
//! One request owns one browser session for its whole life. The
//! [`Orchestrator`] drives it through:
//!
//! ```text
//! Created → Launched → NavigationPending → Interactive → Extracting → Closed
//! ```
//!
//! `Closed` is reached on every path, including failures and timeouts.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fbzone::session::{ChromeLauncher, Orchestrator};
//!
//! let metadata = orchestrator.scrape_video("https://www.facebook.com/watch?v=1").await?;
//! ```

mod capture;
mod chrome;
mod config;
mod orchestrator;
mod poll;
pub mod snapshot;

pub use capture::CaptureLog;
pub use chrome::ChromeLauncher;
pub use config::SessionConfig;
pub use orchestrator::{Orchestrator, PageDescription, PageExtraction};
pub use poll::poll_until;
pub use snapshot::PageScripts;

use std::fmt;

use async_trait::async_trait;

use crate::app::Result;
use crate::site::AssetFilter;

/// Selectors for the interaction steps run before extraction.
#[derive(Debug, Clone)]
pub struct InteractionRules {
    /// Close button of the login/cookie interstitial.
    pub popup_close: String,
    /// Element whose presence means a video post has rendered.
    pub video_ready_marker: String,
    /// Tried in order on photo pages; the first present one is clicked.
    pub photo_expand: Vec<String>,
    /// Tried in order on profile pages; the first present one is clicked.
    pub profile_expand: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Launched,
    NavigationPending,
    Interactive,
    Extracting,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Launched => "launched",
            Self::NavigationPending => "navigation_pending",
            Self::Interactive => "interactive",
            Self::Extracting => "extracting",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &SessionConfig) -> Result<Box<dyn BrowserSession>>;
}

/// One browser with one page.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Intercept requests and record those `filter` accepts. Must be called
    /// before [`navigate`](Self::navigate) to see the initial load.
    async fn start_capture(&self, filter: AssetFilter) -> Result<CaptureLog>;

    /// Navigate and wait for the load to finish.
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    async fn element_exists(&self, selector: &str) -> Result<bool>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Release the browser. Safe to call more than once.
    async fn close(&self);
}
