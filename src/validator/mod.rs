//! Candidate validation and selection.
//!
//! Candidates are fetched outside the browser, one at a time, in rank order.
//! A candidate survives only if the response is a 2xx image whose body
//! starts with the magic bytes of its declared type. Among survivors the
//! largest body wins; ties keep the earlier candidate.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::app::{FbzoneError, Result};
use crate::domain::ValidatedImage;
use crate::fetcher::AssetFetcher;
use crate::site::SiteAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Try every candidate and keep the largest.
    Exhaustive,
    /// Stop at the first valid candidate whose URL marks it as the original
    /// upload.
    OriginalFastPath,
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub best: Option<ValidatedImage>,
    /// Every candidate that was attempted, in order.
    pub tried: Vec<String>,
}

impl Selection {
    pub fn into_result(self) -> Result<ValidatedImage> {
        self.best
            .ok_or(FbzoneError::NoValidImage { tried: self.tried })
    }
}

#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error("status {0}")]
    Status(u16),

    #[error("content type {0:?} is not an image")]
    NotImage(Option<String>),

    #[error("{size} bytes does not beat current best of {best}")]
    NotLarger { size: u64, best: u64 },

    #[error("body does not match declared type {0}")]
    MagicMismatch(String),

    #[error("validation budget ran out")]
    OutOfTime,

    #[error(transparent)]
    Fetch(#[from] FbzoneError),
}

pub struct Validator {
    fetcher: Arc<dyn AssetFetcher>,
    adapter: Arc<dyn SiteAdapter>,
    budget: Option<Duration>,
}

impl Validator {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, adapter: Arc<dyn SiteAdapter>) -> Self {
        Self {
            fetcher,
            adapter,
            budget: None,
        }
    }

    /// Stop trying candidates once `budget` has elapsed. The best image found
    /// so far is kept.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub async fn select(&self, candidates: &[String], policy: SelectionPolicy) -> Selection {
        let mut selection = Selection::default();
        let deadline = self.budget.map(|budget| Instant::now() + budget);

        for url in candidates {
            let remaining = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        warn!(
                            tried = selection.tried.len(),
                            left = candidates.len() - selection.tried.len(),
                            "validation budget exhausted"
                        );
                        break;
                    }
                    Some(remaining)
                }
                None => None,
            };

            selection.tried.push(url.clone());
            let best_size = selection.best.as_ref().map(|b| b.size_bytes() as u64);
            let fast_path =
                policy == SelectionPolicy::OriginalFastPath && self.adapter.is_original_quality(url);
            // Original-quality candidates bypass the size floor.
            let floor = if fast_path { None } else { best_size };

            let checked = match remaining {
                Some(remaining) => timeout(remaining, self.check(url, floor))
                    .await
                    .unwrap_or(Err(Rejection::OutOfTime)),
                None => self.check(url, floor).await,
            };

            let image = match checked {
                Ok(image) => image,
                Err(reason) => {
                    debug!(url = %url, reason = %reason, "candidate rejected");
                    continue;
                }
            };

            debug!(url = %url, size = image.size_bytes(), "candidate valid");

            if fast_path {
                info!(url = %url, "original-quality candidate found");
                selection.best = Some(image);
                return selection;
            }

            if best_size.map_or(true, |best| image.size_bytes() as u64 > best) {
                selection.best = Some(image);
            }
        }

        match &selection.best {
            Some(best) => info!(
                url = %best.source_url,
                size = best.size_bytes(),
                tried = selection.tried.len(),
                "best candidate selected"
            ),
            None => info!(tried = selection.tried.len(), "no valid candidate"),
        }
        selection
    }

    async fn check(
        &self,
        url: &str,
        best_size: Option<u64>,
    ) -> std::result::Result<ValidatedImage, Rejection> {
        let response = self
            .fetcher
            .get(url, self.adapter.image_request_headers())
            .await?;

        if !response.is_success() {
            return Err(Rejection::Status(response.status));
        }

        let content_type = match &response.content_type {
            Some(ct) if ct.trim().to_ascii_lowercase().starts_with("image/") => ct.clone(),
            other => return Err(Rejection::NotImage(other.clone())),
        };

        let beats_best = |size: u64| best_size.map_or(size > 0, |best| size > best);

        if let Some(length) = response.content_length {
            if !beats_best(length) {
                return Err(Rejection::NotLarger {
                    size: length,
                    best: best_size.unwrap_or(0),
                });
            }
        }

        let body = response.bytes().await?;
        if !beats_best(body.len() as u64) {
            return Err(Rejection::NotLarger {
                size: body.len() as u64,
                best: best_size.unwrap_or(0),
            });
        }

        ValidatedImage::validate(url, &content_type, body)
            .ok_or(Rejection::MagicMismatch(content_type))
    }
}
