use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client, ClientBuilder};
use tracing::debug;

use crate::app::Result;
use crate::config::FetchConfig;
use crate::fetcher::{AssetFetcher, AssetResponse, HeaderList};

pub struct HttpFetcher {
    client: Client,
    /// No total timeout, so long passthrough bodies are not cut off mid-transfer.
    streaming: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let client = base_builder(config)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        let streaming = base_builder(config)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.stream_read_timeout_secs))
            .build()
            .expect("Failed to build streaming HTTP client");

        Self { client, streaming }
    }

    async fn send(&self, client: &Client, url: &str, headers: &HeaderList<'_>) -> Result<AssetResponse> {
        let response = client.get(url).headers(header_map(headers)).send().await?;
        debug!(url, status = response.status().as_u16(), "fetched");
        Ok(AssetResponse::from_response(response))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

fn base_builder(config: &FetchConfig) -> ClientBuilder {
    Client::builder()
        .redirect(redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .user_agent(config.user_agent.as_str())
}

fn header_map(headers: &HeaderList<'_>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }
    map
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn get(&self, url: &str, headers: &HeaderList<'_>) -> Result<AssetResponse> {
        self.send(&self.client, url, headers).await
    }

    async fn stream(&self, url: &str, headers: &HeaderList<'_>) -> Result<AssetResponse> {
        self.send(&self.streaming, url, headers).await
    }
}
