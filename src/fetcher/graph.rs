use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::app::{FbzoneError, Result};
use crate::fetcher::AssetFetcher;

#[derive(Debug, Deserialize)]
struct PhotoImages {
    #[serde(default)]
    images: Vec<PhotoImage>,
}

#[derive(Debug, Deserialize)]
struct PhotoImage {
    source: String,
    #[serde(default)]
    width: u32,
}

/// Minimal Graph API client for photo image sources.
pub struct GraphClient {
    fetcher: Arc<dyn AssetFetcher>,
    api_base: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        api_base: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            api_base: api_base.into(),
            access_token: access_token.into(),
        }
    }

    /// Image sources of a photo, widest first.
    pub async fn photo_sources(&self, photo_id: &str) -> Result<Vec<String>> {
        let endpoint = format!("{}/{}", self.api_base.trim_end_matches('/'), photo_id);
        let url = Url::parse_with_params(&endpoint, &[("fields", "images")])?;

        // The token travels in a header so it never shows up in URLs or errors.
        let authorization = format!("Bearer {}", self.access_token);
        let response = self
            .fetcher
            .get(url.as_str(), &[("Authorization", authorization.as_str())])
            .await?;
        if !response.is_success() {
            return Err(FbzoneError::Other(format!(
                "Graph API returned status {}",
                response.status
            )));
        }

        let body = response.bytes().await?;
        let mut parsed: PhotoImages = serde_json::from_slice(&body)?;
        parsed.images.sort_by(|a, b| b.width.cmp(&a.width));
        debug!(photo_id, count = parsed.images.len(), "graph sources");

        Ok(parsed.images.into_iter().map(|i| i.source).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{AssetResponse, HeaderList};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedFetcher {
        status: u16,
        body: &'static str,
        requested: Mutex<Vec<String>>,
        headers: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl AssetFetcher for CannedFetcher {
        async fn get(&self, url: &str, headers: &HeaderList<'_>) -> Result<AssetResponse> {
            self.requested.lock().unwrap().push(url.to_string());
            self.headers.lock().unwrap().extend(
                headers
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string())),
            );
            if self.fail {
                return Err(FbzoneError::Other(format!("error sending request for url ({})", url)));
            }
            Ok(AssetResponse::buffered(
                self.status,
                Some("application/json"),
                self.body,
            ))
        }
    }

    fn client(status: u16, body: &'static str) -> (GraphClient, Arc<CannedFetcher>) {
        canned(status, body, false)
    }

    fn canned(status: u16, body: &'static str, fail: bool) -> (GraphClient, Arc<CannedFetcher>) {
        let fetcher = Arc::new(CannedFetcher {
            status,
            body,
            requested: Mutex::new(Vec::new()),
            headers: Mutex::new(Vec::new()),
            fail,
        });
        let graph = GraphClient::new(fetcher.clone(), "https://graph.facebook.com/v18.0", "tok");
        (graph, fetcher)
    }

    #[tokio::test]
    async fn test_sources_sorted_by_width() {
        let (graph, fetcher) = client(
            200,
            r#"{"images":[{"source":"https://a/small.jpg","width":320,"height":240},
                          {"source":"https://a/big.jpg","width":2048,"height":1536},
                          {"source":"https://a/mid.jpg","width":960,"height":720}]}"#,
        );

        let sources = graph.photo_sources("1234").await.unwrap();
        assert_eq!(sources, vec!["https://a/big.jpg", "https://a/mid.jpg", "https://a/small.jpg"]);

        let requested = fetcher.requested.lock().unwrap();
        assert_eq!(
            requested[0],
            "https://graph.facebook.com/v18.0/1234?fields=images"
        );
    }

    #[tokio::test]
    async fn test_token_sent_as_bearer_header() {
        let (graph, fetcher) = client(200, r#"{"images":[]}"#);
        graph.photo_sources("1234").await.unwrap();

        let headers = fetcher.headers.lock().unwrap();
        assert_eq!(
            headers.as_slice(),
            &[("Authorization".to_string(), "Bearer tok".to_string())]
        );
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_token() {
        let (graph, fetcher) = canned(200, "", true);

        let err = graph.photo_sources("1234").await.unwrap_err();
        assert!(err.to_string().contains("graph.facebook.com"));
        assert!(!err.to_string().contains("tok"));
        assert!(fetcher
            .requested
            .lock()
            .unwrap()
            .iter()
            .all(|url| !url.contains("tok")));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (graph, _) = client(400, r#"{"error":{"message":"bad token"}}"#);
        assert!(graph.photo_sources("1").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_images_is_empty() {
        let (graph, _) = client(200, r#"{"id":"1"}"#);
        tokio_test::assert_ok!(graph.photo_sources("1").await);
    }
}
