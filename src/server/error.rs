use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::app::FbzoneError;

/// Error body for every failed request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried_urls: Option<Vec<String>>,
}

#[derive(Debug)]
pub enum ApiError {
    MissingUrl,
    Extraction(FbzoneError),
}

impl From<FbzoneError> for ApiError {
    fn from(err: FbzoneError) -> Self {
        Self::Extraction(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingUrl => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Missing url param".to_string(),
                    tried_urls: None,
                },
            ),
            ApiError::Extraction(err) => {
                let status = match &err {
                    FbzoneError::NoValidImage { .. } => StatusCode::NOT_FOUND,
                    e if e.is_client_error() => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!(error = %err, "request failed");
                } else {
                    warn!(error = %err, status = status.as_u16(), "request rejected");
                }

                let error = err.to_string();
                let tried_urls = match err {
                    FbzoneError::NoValidImage { tried } => Some(tried),
                    _ => None,
                };
                (status, ErrorBody { error, tried_urls })
            }
        };
        (status, Json(body)).into_response()
    }
}
