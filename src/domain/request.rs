use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{FbzoneError, Result};

/// Which extraction flow a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Photo,
    ProfilePicture,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Video => "video",
            MediaKind::Photo => "photo",
            MediaKind::ProfilePicture => "profile_picture",
        };
        f.write_str(name)
    }
}

/// One incoming extraction call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    target_url: Url,
    kind: MediaKind,
}

impl ExtractionRequest {
    /// Parse and validate the target. Only absolute http(s) URLs are accepted.
    pub fn new(target_url: &str, kind: MediaKind) -> Result<Self> {
        let target_url = Url::parse(target_url.trim())?;
        match target_url.scheme() {
            "http" | "https" => Ok(Self { target_url, kind }),
            other => Err(FbzoneError::UnsupportedUrl(format!(
                "scheme '{}' is not supported",
                other
            ))),
        }
    }

    pub fn target_url(&self) -> &Url {
        &self.target_url
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}
