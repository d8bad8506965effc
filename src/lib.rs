//! # fbzone
//!
//! Extracts media and metadata from Facebook pages by driving a headless
//! browser, mining the rendered page, and validating candidate downloads.
//!
//! ## Architecture
//!
//! ```text
//! Session (browser + interception) → Miner → Synth → Validator → Server / CLI
//! ```
//!
//! - [`session`]: One browser per request, network capture, page interaction
//! - [`miner`]: DOM and script heuristics over a page snapshot
//! - [`synth`]: CDN-aware candidate URL generation
//! - [`validator`]: Magic-byte validation and largest-image selection
//! - [`server`]: HTTP API built with axum
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the HTTP API
//! fbzone serve --port 10000
//!
//! # Video metadata as JSON
//! fbzone scrape https://www.facebook.com/watch?v=123
//!
//! # Save the best photo
//! fbzone photo https://www.facebook.com/photo/?fbid=456 -o photo.jpg
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the browser
/// launcher, asset fetcher, site adapter and orchestrator.
pub mod app;

/// Command-line interface using clap.
///
/// - `serve [--port]` - Run the HTTP API
/// - `scrape <url>` - Print video metadata
/// - `photo <url> [-o]` - Save the best photo
/// - `profile <url> [-o]` - Save a profile picture
/// - `candidates <url> [--profile]` - List ranked candidates
/// - `description <url>` - Print title and description
pub mod cli;

/// Configuration loaded from `~/.config/fbzone/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`ExtractionRequest`](domain::ExtractionRequest): A validated target URL and flow
/// - [`ExtractedMetadata`](domain::ExtractedMetadata): Best-effort video metadata
/// - [`ValidatedImage`](domain::ValidatedImage): An image body that passed validation
pub mod domain;

/// HTTP fetching outside the browser.
///
/// - [`AssetFetcher`](fetcher::AssetFetcher): Async trait for candidate downloads
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`GraphClient`](fetcher::GraphClient): Optional Graph API photo lookup
pub mod fetcher;

pub mod miner;

/// Open Graph parsing for pages that are served without a browser.
pub mod normalizer;

pub mod server;

pub mod session;

/// Site-specific selectors, patterns and host rules.
pub mod site;

pub mod synth;

pub mod validator;

#[cfg(test)]
pub(crate) mod testing;
