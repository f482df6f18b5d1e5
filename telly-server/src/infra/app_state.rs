use std::sync::Arc;

use telly_config::Config;
use telly_core::{
    CacheStore, CatalogQueries, CatalogStore, IngestionDriver, OriginClient,
    Pacing, Reconciler,
};

/// Shared handles behind every route. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CatalogStore>,
    pub queries: CatalogQueries,
    pub reconciler: Reconciler,
    pub cache: CacheStore,
    pub origin: Arc<dyn OriginClient>,
    pub ingest: IngestionDriver,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn CatalogStore>,
        cache: CacheStore,
        origin: Arc<dyn OriginClient>,
    ) -> Self {
        let pacing = Pacing {
            show_delay: config.ingest.show_delay,
            season_delay: config.ingest.season_delay,
        };
        Self {
            queries: CatalogQueries::new(store.clone()),
            reconciler: Reconciler::new(store.clone()),
            ingest: IngestionDriver::new(origin.clone(), store.clone(), pacing),
            config,
            store,
            cache,
            origin,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .field("ingest", &self.ingest)
            .finish_non_exhaustive()
    }
}
