use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::fetcher::{AssetFetcher, GraphClient, HttpFetcher};
use crate::server::AppState;
use crate::session::{BrowserLauncher, ChromeLauncher, Orchestrator};
use crate::site::{FacebookAdapter, SiteAdapter};

pub struct AppContext {
    pub config: Config,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppContext {
    /// Wire the production components from `config`.
    pub fn new(config: Config) -> Self {
        let fetcher: Arc<dyn AssetFetcher> = Arc::new(HttpFetcher::new(&config.fetch));
        let launcher: Arc<dyn BrowserLauncher> = Arc::new(ChromeLauncher::new());
        Self::with_components(config, launcher, fetcher)
    }

    /// Wire the orchestrator around caller-supplied browser and fetcher.
    pub fn with_components(
        config: Config,
        launcher: Arc<dyn BrowserLauncher>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        let adapter: Arc<dyn SiteAdapter> = Arc::new(FacebookAdapter::new());
        let mut orchestrator =
            Orchestrator::new(launcher, adapter, fetcher.clone(), config.browser.clone());

        if let Some(token) = config.graph.token() {
            info!(api_base = %config.graph.api_base, "graph api seeding enabled");
            orchestrator = orchestrator.with_graph(GraphClient::new(
                fetcher,
                config.graph.api_base.clone(),
                token,
            ));
        }

        Self {
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.orchestrator.clone())
    }
}
