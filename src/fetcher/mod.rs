pub mod graph;
pub mod http_fetcher;

pub use graph::GraphClient;
pub use http_fetcher::HttpFetcher;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::app::Result;

/// Extra request headers, name and value.
pub type HeaderList<'a> = [(&'a str, &'a str)];

enum BodySource {
    Http(reqwest::Response),
    Buffered(Bytes),
}

/// Response head with a body that has not been read yet.
///
/// Callers can reject on status or headers without downloading anything.
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    body: BodySource,
}

impl std::fmt::Debug for AssetResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl AssetResponse {
    pub fn from_response(response: reqwest::Response) -> Self {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Self {
            status: response.status().as_u16(),
            content_type,
            content_length: response.content_length(),
            body: BodySource::Http(response),
        }
    }

    /// In-memory response; `content_length` is the body length.
    pub fn buffered(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            content_type: content_type.map(String::from),
            content_length: Some(body.len() as u64),
            body: BodySource::Buffered(body),
        }
    }

    /// Drop the advertised length, as chunked responses do.
    pub fn without_length(mut self) -> Self {
        self.content_length = None;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes> {
        match self.body {
            BodySource::Http(response) => Ok(response.bytes().await?),
            BodySource::Buffered(bytes) => Ok(bytes),
        }
    }

    /// Body as a chunk stream, for passthrough.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        match self.body {
            BodySource::Http(response) => response.bytes_stream().map_err(Into::into).boxed(),
            BodySource::Buffered(bytes) => stream::once(async move { Ok(bytes) }).boxed(),
        }
    }
}

/// Outbound GET used for candidate validation, proxying and page fetches.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// GET `url`, following redirects. Non-2xx statuses are returned, not
    /// raised; only transport failures are errors.
    async fn get(&self, url: &str, headers: &HeaderList<'_>) -> Result<AssetResponse>;

    /// GET for a body that is passed through as it arrives. Only connecting
    /// and stalls between chunks are bounded, not the whole transfer.
    async fn stream(&self, url: &str, headers: &HeaderList<'_>) -> Result<AssetResponse> {
        self.get(url, headers).await
    }
}
