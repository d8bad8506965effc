//! Configuration management for fbzone.
//!
//! Configuration is read from `~/.config/fbzone/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::session::SessionConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub browser: SessionConfig,
    pub fetch: FetchConfig,
    pub graph: GraphConfig,
}

/// HTTP API listener.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Upper bound for one API request, extraction and validation included
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 10000,
            request_timeout_secs: 300,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Outbound HTTP used for validation, proxying and page fetches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Connect bound for streamed downloads.
    pub connect_timeout_secs: u64,
    /// Longest gap between body chunks of a streamed download.
    pub stream_read_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            stream_read_timeout_secs: 60,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Optional Graph API access for photo lookups.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub api_base: String,
    pub access_token: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.facebook.com/v18.0".to_string(),
            access_token: None,
        }
    }
}

impl GraphConfig {
    /// Token, if one is configured and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create(&config_path)
    }

    /// Load from `path`, writing the commented defaults there first if it
    /// does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load from an existing file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/fbzone/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("fbzone").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# fbzone configuration

[server]
# Address and port of the HTTP API
bind = "0.0.0.0"
port = 10000

# Upper bound for one API request, extraction and validation included (seconds)
request_timeout_secs = 300

[browser]
# Run browser in headless mode (no visible window)
headless = true

# Fixed viewport; some layouts only render at desktop sizes
viewport_width = 1920
viewport_height = 1080

# Path to a Chrome/Chromium binary (autodetected when unset)
# chrome_executable = "/usr/bin/chromium"

# Extra command line flags for the browser
extra_args = []

# Navigation timeout in seconds
navigation_timeout_secs = 45

# How long to wait for the post to render and for popups (seconds)
element_wait_secs = 15
popup_wait_secs = 10

# Upper bounds for settling after load, clicks and scrolls (milliseconds)
settle_after_load_ms = 5000
settle_after_click_ms = 3000
settle_after_scroll_ms = 2000
poll_interval_ms = 250

# Deadline for one whole extraction, launch to close (seconds)
extraction_timeout_secs = 120

# How long a request waits for a free browser slot (seconds)
queue_timeout_secs = 60

# Budget for downloading and checking candidate images (seconds)
validation_timeout_secs = 120

# Maximum concurrent browser sessions
max_sessions = 4

[fetch]
# Timeout for candidate downloads and page fetches (seconds)
timeout_secs = 30

# Proxied downloads have no overall limit; these bound connecting and
# each stall between chunks instead (seconds)
connect_timeout_secs = 10
stream_read_timeout_secs = 60

[graph]
# Graph API token; enables API lookups for photo URLs carrying an fbid
# access_token = ""
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.browser, SessionConfig::default());
        assert_eq!(config.fetch, FetchConfig::default());
        assert!(config.graph.token().is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[server]
port = 8080

[browser]
headless = false
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom values
        assert_eq!(config.server.port, 8080);
        assert!(!config.browser.headless);
        // Default values
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.browser.navigation_timeout_secs, 45);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.browser.max_sessions, 4);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config: Config = toml::from_str("[graph]\naccess_token = \"  \"\n").unwrap();
        assert!(config.graph.token().is_none());

        let config: Config = toml::from_str("[graph]\naccess_token = \"abc\"\n").unwrap();
        assert_eq!(config.graph.token(), Some("abc"));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_or_create(&path).unwrap();
        assert_eq!(config.server.port, 10000);
        assert!(path.exists());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.browser, config.browser);
    }

    #[test]
    fn test_parse_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nport = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
