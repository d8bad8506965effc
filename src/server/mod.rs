//! HTTP API.
//!
//! | Route                         | Result                                  |
//! |-------------------------------|-----------------------------------------|
//! | `GET /health`                 | liveness                                |
//! | `GET /scrape?url=`            | video metadata JSON                     |
//! | `GET /description?url=`       | `{title, description}`                  |
//! | `GET /scrape-photo?url=`      | best photo as an attachment             |
//! | `GET /download-profile-picture?url=` | best profile picture             |
//! | `GET /download-proxy?url=`    | streamed passthrough download           |

mod error;
mod routes;

pub use error::{ApiError, ErrorBody};
pub use routes::{PHOTO_FILENAME, PROFILE_FILENAME, VIDEO_FILENAME};

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::{FbzoneError, Result};
use crate::config::ServerConfig;
use crate::session::Orchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Build the Axum application router
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(routes::health_handler))
        .route("/scrape", get(routes::scrape_handler))
        .route("/description", get(routes::description_handler))
        .route("/scrape-photo", get(routes::scrape_photo_handler))
        .route(
            "/download-profile-picture",
            get(routes::profile_picture_handler),
        )
        .route("/download-proxy", get(routes::download_proxy_handler))
        .layer(middleware::from_fn(move |request, next| {
            request_deadline(request_timeout, request, next)
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answer with the JSON error once `limit` passes. The handler future is
/// dropped, which closes any browser it still holds.
async fn request_deadline(limit: Duration, request: Request, next: Next) -> Response {
    match timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::from(FbzoneError::Timeout(format!(
            "request exceeded {:?}",
            limit
        )))
        .into_response(),
    }
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let router = build_router(state, config.request_timeout());
    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
