use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Browser session settings (`[browser]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// User agent presented to the target site
    pub user_agent: String,

    /// Explicit Chrome/Chromium binary; autodetected when unset
    pub chrome_executable: Option<String>,

    /// Additional command line flags appended after the built-in ones
    pub extra_args: Vec<String>,

    /// Navigation timeout in seconds (default: 45)
    pub navigation_timeout_secs: u64,

    /// How long to wait for the post's creator heading (default: 15)
    pub element_wait_secs: u64,

    /// How long to wait for an interstitial close button (default: 10)
    pub popup_wait_secs: u64,

    /// Settle bound after navigation, in milliseconds (default: 5000)
    pub settle_after_load_ms: u64,

    /// Settle bound after a click, in milliseconds (default: 3000)
    pub settle_after_click_ms: u64,

    /// Settle bound after each scroll, in milliseconds (default: 2000)
    pub settle_after_scroll_ms: u64,

    /// Interval between readiness checks (default: 250)
    pub poll_interval_ms: u64,

    /// Deadline for one whole extraction, launch to close (default: 120)
    pub extraction_timeout_secs: u64,

    /// How long a request may wait for a free browser slot (default: 60)
    pub queue_timeout_secs: u64,

    /// Budget for downloading and checking candidates (default: 120)
    pub validation_timeout_secs: u64,

    /// Maximum concurrent browser sessions (default: 4)
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
                .to_string(),
            chrome_executable: None,
            extra_args: Vec::new(),
            navigation_timeout_secs: 45,
            element_wait_secs: 15,
            popup_wait_secs: 10,
            settle_after_load_ms: 5000,
            settle_after_click_ms: 3000,
            settle_after_scroll_ms: 2000,
            poll_interval_ms: 250,
            extraction_timeout_secs: 120,
            queue_timeout_secs: 60,
            validation_timeout_secs: 120,
            max_sessions: 4,
        }
    }
}

impl SessionConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn popup_wait(&self) -> Duration {
        Duration::from_secs(self.popup_wait_secs)
    }

    pub fn settle_after_load(&self) -> Duration {
        Duration::from_millis(self.settle_after_load_ms)
    }

    pub fn settle_after_click(&self) -> Duration {
        Duration::from_millis(self.settle_after_click_ms)
    }

    pub fn settle_after_scroll(&self) -> Duration {
        Duration::from_millis(self.settle_after_scroll_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout_secs)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_secs)
    }

    /// Create a config optimized for speed (less thorough)
    pub fn fast() -> Self {
        Self {
            navigation_timeout_secs: 20,
            element_wait_secs: 5,
            popup_wait_secs: 3,
            settle_after_load_ms: 1500,
            settle_after_click_ms: 1000,
            settle_after_scroll_ms: 750,
            extraction_timeout_secs: 60,
            queue_timeout_secs: 30,
            validation_timeout_secs: 60,
            max_sessions: 8,
            ..Default::default()
        }
    }

    /// Create a config optimized for recall (slower)
    pub fn thorough() -> Self {
        Self {
            navigation_timeout_secs: 90,
            element_wait_secs: 30,
            popup_wait_secs: 15,
            settle_after_load_ms: 10_000,
            settle_after_click_ms: 5000,
            settle_after_scroll_ms: 4000,
            extraction_timeout_secs: 240,
            queue_timeout_secs: 120,
            validation_timeout_secs: 240,
            max_sessions: 2,
            ..Default::default()
        }
    }
}
