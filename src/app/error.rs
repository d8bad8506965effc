use thiserror::Error;

#[derive(Error, Debug)]
pub enum FbzoneError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Could not download any valid images ({} candidates tried)", tried.len())]
    NoValidImage { tried: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl FbzoneError {
    /// Whether the failure is a bad caller input rather than a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::UnsupportedUrl(_))
    }
}

pub type Result<T> = std::result::Result<T, FbzoneError>;
