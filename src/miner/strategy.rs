use tracing::{debug, warn};

use crate::domain::MetaField;
use crate::miner::dom::DomView;
use crate::miner::rules::MiningRules;
use crate::site::AssetFilter;

#[derive(Debug, thiserror::Error)]
pub enum MineError {
    #[error("malformed snapshot: {0}")]
    Snapshot(String),

    #[error("{0}")]
    Strategy(String),
}

/// Inputs shared by every strategy of one mining pass.
pub struct MineContext<'a> {
    pub rules: &'a MiningRules,
    pub assets: &'a AssetFilter,
    pub alternate_layout: bool,
    /// Creator name resolved earlier in the pass, if any.
    pub creator: Option<String>,
}

pub type StrategyFn = fn(&DomView, &MineContext<'_>) -> Result<Option<String>, MineError>;

/// One named way of resolving a field.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: StrategyFn,
}

impl Strategy {
    pub const fn new(name: &'static str, run: StrategyFn) -> Self {
        Self { name, run }
    }
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Strategy").field(&self.name).finish()
    }
}

/// Run strategies in order; the first non-empty value wins.
///
/// A failing strategy is logged and skipped. When nothing resolves the
/// field stays missing.
pub fn first_success(
    field: &str,
    strategies: &[Strategy],
    view: &DomView,
    ctx: &MineContext<'_>,
) -> MetaField {
    for strategy in strategies {
        match (strategy.run)(view, ctx) {
            Ok(Some(value)) if !value.trim().is_empty() => {
                debug!(field, strategy = strategy.name, "field resolved");
                return MetaField::found(value.trim());
            }
            Ok(_) => {}
            Err(e) => {
                warn!(field, strategy = strategy.name, error = %e, "strategy failed");
            }
        }
    }
    debug!(field, "no strategy resolved field");
    MetaField::missing()
}
