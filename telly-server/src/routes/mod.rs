use axum::{
    Router, middleware,
    routing::{MethodRouter, get, post},
};

use crate::{
    AppState,
    handlers::{admin, passthrough, trending, tv},
    infra::middleware::{
        CachePolicy, ResponseCacheState, origin_fallback, response_cache,
    },
};

pub const TRENDING_PATH: &str = "/trending/tv/day";

/// Catalog, passthrough and admin routes.
///
/// Read routes compose their layers here: the response cache wraps the
/// origin fallback, which wraps the handler. Fallback responses are marked
/// and never cached.
pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/tv", post(tv::create_show))
        .route(
            "/tv/{id}",
            cached(
                &state,
                tv::show_cache_policy(),
                with_fallback(&state, get(tv::get_show)),
            )
            .delete(tv::delete_show),
        )
        .route(
            "/tv/{id}/season/{season_number}",
            cached(
                &state,
                tv::season_cache_policy(),
                with_fallback(&state, get(tv::get_season)),
            ),
        )
        .route(
            TRENDING_PATH,
            cached(
                &state,
                trending::trending_cache_policy(),
                get(trending::trending_day),
            ),
        )
        .route("/search/{*rest}", get(passthrough::forward))
        .route("/admin/ingest/show/{id}", post(admin::ingest_show))
        .route("/admin/ingest/{feed}", post(admin::ingest_feed))
        .fallback(passthrough::unmatched)
}

/// Parameterless cached routes whose policy asks to be warmed at startup.
pub fn warm_paths() -> Vec<&'static str> {
    [(TRENDING_PATH, trending::trending_cache_policy())]
        .into_iter()
        .filter(|(_, policy)| policy.is_warm())
        .map(|(path, _)| path)
        .collect()
}

fn cached(
    state: &AppState,
    policy: CachePolicy,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.layer(middleware::from_fn_with_state(
        ResponseCacheState::new(state.cache.clone(), policy),
        response_cache,
    ))
}

fn with_fallback(
    state: &AppState,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.layer(middleware::from_fn_with_state(state.clone(), origin_fallback))
}
