use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::app::FbzoneError;
use crate::domain::{ExtractedMetadata, ValidatedImage};
use crate::server::{ApiError, AppState};
use crate::session::PageDescription;

pub const PHOTO_FILENAME: &str = "fbzone_hd_photo";
pub const PROFILE_FILENAME: &str = "fbzone_profile_picture";
pub const VIDEO_FILENAME: &str = "fbzone_hdvideo.mp4";

const IMAGE_SOURCE_HEADER: &str = "x-image-source-url";

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    url: Option<String>,
}

impl UrlQuery {
    fn require(self) -> Result<String, ApiError> {
        self.url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ApiError::MissingUrl)
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
}

pub async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

pub async fn scrape_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ExtractedMetadata>, ApiError> {
    let url = query.require()?;
    Ok(Json(state.orchestrator.scrape_video(&url).await?))
}

pub async fn description_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<PageDescription>, ApiError> {
    let url = query.require()?;
    Ok(Json(state.orchestrator.describe(&url).await?))
}

pub async fn scrape_photo_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Response, ApiError> {
    let url = query.require()?;
    let image = state.orchestrator.scrape_photo(&url).await?.into_result()?;
    Ok(image_response(image, PHOTO_FILENAME))
}

pub async fn profile_picture_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Response, ApiError> {
    let url = query.require()?;
    let image = state
        .orchestrator
        .download_profile_picture(&url)
        .await?
        .into_result()?;
    Ok(image_response(image, PROFILE_FILENAME))
}

/// Stream a remote file back as a download, without inspecting it.
pub async fn download_proxy_handler(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Response, ApiError> {
    let url = query.require()?;
    let target = Url::parse(&url).map_err(FbzoneError::from)?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(FbzoneError::UnsupportedUrl(target.scheme().to_string()).into());
    }

    info!(url = %target, "proxying download");
    let response = state.orchestrator.fetcher().stream(target.as_str(), &[]).await?;
    if !response.is_success() {
        return Err(FbzoneError::Other(format!(
            "Failed to download file: upstream returned status {}",
            response.status
        ))
        .into());
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_DISPOSITION, attachment(VIDEO_FILENAME));
    if let Some(value) = response
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(length) = response.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok((headers, Body::from_stream(response.into_stream())).into_response())
}

fn attachment(filename: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn image_response(image: ValidatedImage, stem: &str) -> Response {
    let filename = format!("{}.{}", stem, image.format.extension());
    info!(source = %image.source_url, size = image.size_bytes(), "serving image");

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&image.content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_DISPOSITION, attachment(&filename));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(image.size_bytes()));
    if let Ok(value) = HeaderValue::from_str(&image.source_url) {
        headers.insert(HeaderName::from_static(IMAGE_SOURCE_HEADER), value);
    }

    (headers, image.bytes).into_response()
}
