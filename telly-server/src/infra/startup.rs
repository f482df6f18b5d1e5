//! Wiring from configuration to live handles.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request},
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tower::ServiceExt;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, info, warn};

use telly_config::{CacheConfig, Config};
use telly_core::{
    CacheSettings, CacheStore, CatalogStore, OriginClient, PostgresCatalogStore,
    RedisCacheBackend, TmdbOriginClient,
};

use super::app_state::AppState;

pub fn cache_settings(config: &CacheConfig) -> CacheSettings {
    CacheSettings {
        default_ttl: config.default_ttl,
        command_timeout: config.command_timeout,
        connect_timeout: config.connect_timeout,
        connect_retries: config.connect_retries,
        backoff_step: config.retry_backoff_step,
        backoff_cap: config.retry_backoff_cap,
    }
}

/// Connect the response cache. Never fails: without Redis, or when it
/// cannot be reached, caching is disabled and the server runs without it.
pub async fn connect_cache(config: &Config) -> CacheStore {
    let Some(redis) = config.redis.as_ref() else {
        warn!("No Redis configured; response caching disabled");
        return CacheStore::disabled();
    };

    match RedisCacheBackend::new(&redis.url) {
        Ok(backend) => {
            CacheStore::connect(Arc::new(backend), cache_settings(&config.cache))
                .await
        }
        Err(err) => {
            warn!(error = %err, "Invalid Redis configuration; response caching disabled");
            CacheStore::disabled()
        }
    }
}

pub async fn connect_database(config: &Config) -> anyhow::Result<PgPool> {
    let url = config
        .database
        .primary_url
        .as_deref()
        .context("DATABASE_URL (or DATABASE_HOST/DATABASE_NAME) must be set")?;
    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")
}

pub fn build_origin(config: &Config) -> anyhow::Result<Arc<dyn OriginClient>> {
    let client = TmdbOriginClient::new(
        config.origin.base_url.clone(),
        config.origin.api_key.clone(),
        config.origin.timeout,
    )
    .context("failed to build origin client")?;
    Ok(Arc::new(client))
}

/// Cache and origin around an open pool, for the server or an ingestion
/// command.
pub async fn build_state(config: Config, pool: PgPool) -> anyhow::Result<AppState> {
    let store: Arc<dyn CatalogStore> = Arc::new(PostgresCatalogStore::new(pool));
    let cache = connect_cache(&config).await;
    let origin = build_origin(&config)?;
    Ok(AppState::new(Arc::new(config), store, cache, origin))
}

pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.dev_mode || config.cors.is_wildcard_included() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .collect();
    let methods: Vec<Method> = config
        .cors
        .allowed_methods
        .iter()
        .filter_map(|method| Method::from_bytes(method.trim().as_bytes()).ok())
        .collect();
    let headers: Vec<HeaderName> = config
        .cors
        .allowed_headers
        .iter()
        .filter_map(|header| HeaderName::from_bytes(header.trim().as_bytes()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::list(methods))
        .allow_headers(AllowHeaders::list(headers))
}

/// Issue one GET per path through the full app so warm routes are cached
/// before the first client asks.
pub async fn warm_cache(app: Router, paths: Vec<&'static str>) {
    for path in &paths {
        let request = match Request::get(*path).body(Body::empty()) {
            Ok(request) => request,
            Err(err) => {
                warn!(path, error = %err, "Skipping cache warm-up");
                continue;
            }
        };
        match app.clone().oneshot(request).await {
            Ok(response) => debug!(path, status = %response.status(), "Cache warm-up"),
            Err(err) => warn!(path, error = %err, "Cache warm-up failed"),
        }
    }
    info!(routes = paths.len(), "Cache warm-up finished");
}
