//! DOM and script mining.
//!
//! Works on a serialized page snapshot (see [`crate::session::snapshot`])
//! instead of live browser handles, so every strategy is a plain function
//! over a [`DomView`] and can be tested against inline HTML.
//!
//! ```text
//! snapshot markup ─► DomView ─┬─► discover_assets ─► asset URLs
//!                             └─► FieldStrategies ─► ExtractedMetadata
//! ```

pub mod assets;
pub mod dom;
pub mod metadata;
mod rules;
mod strategy;

pub use assets::discover_assets;
pub use dom::DomView;
pub use metadata::FieldStrategies;
pub use rules::{MiningRules, ScopedSelector};
pub use strategy::{first_success, MineContext, MineError, Strategy, StrategyFn};

use tracing::debug;

use crate::domain::ExtractedMetadata;
use crate::site::SiteAdapter;

/// Everything recovered from one snapshot.
#[derive(Debug, Clone)]
pub struct MinedPage {
    /// Location the snapshot was taken at, after redirects.
    pub page_url: String,
    pub asset_urls: Vec<String>,
    pub metadata: ExtractedMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct Miner {
    strategies: FieldStrategies,
}

impl Miner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategies(strategies: FieldStrategies) -> Self {
        Self { strategies }
    }

    /// Mine a snapshot. Never fails: unresolved fields stay missing.
    pub fn mine(&self, markup: &str, fallback_url: &str, adapter: &dyn SiteAdapter) -> MinedPage {
        let view = DomView::parse(markup, fallback_url);
        let rules = adapter.mining_rules();
        let mut ctx = MineContext {
            rules,
            assets: adapter.asset_filter(),
            alternate_layout: adapter.is_alternate_layout(view.page_url()),
            creator: None,
        };

        let s = &self.strategies;
        let creator = first_success("creator", &s.creator, &view, &ctx);
        ctx.creator = creator.value().map(str::to_string);

        let metadata = ExtractedMetadata {
            creator,
            creator_logo: first_success("creator_logo", &s.creator_logo, &view, &ctx),
            description: first_success("description", &s.description, &view, &ctx),
            likes: first_success("likes", &s.likes, &view, &ctx),
            comments: first_success("comments", &s.comments, &view, &ctx),
            plays: first_success("plays", &s.plays, &view, &ctx),
            duration: first_success("duration", &s.duration, &view, &ctx),
            uploaded_date: first_success("uploaded_date", &s.uploaded_date, &view, &ctx),
            thumbnail: first_success("thumbnail", &s.thumbnail, &view, &ctx),
            followers: first_success("followers", &s.followers, &view, &ctx),
        };

        let asset_urls = discover_assets(&view, rules, ctx.assets);
        debug!(
            resolved = metadata.resolved_count(),
            assets = asset_urls.len(),
            alternate = ctx.alternate_layout,
            "snapshot mined"
        );

        MinedPage {
            page_url: view.page_url().to_string(),
            asset_urls,
            metadata,
        }
    }
}
