use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use telly_model::{SeasonDetail, ShowDetail, ShowPayload};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    middleware::CachePolicy,
};

pub fn show_cache_policy() -> CachePolicy {
    CachePolicy::new("tv.show")
}

pub fn season_cache_policy() -> CachePolicy {
    CachePolicy::new("tv.season")
}

/// Ids that are not numeric cannot exist locally, so they are reported as
/// missing and left to the origin fallback.
fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> AppResult<T> {
    raw.parse()
        .map_err(|_| AppError::not_found(format!("{what} {raw} not found")))
}

pub async fn get_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ShowDetail>> {
    let id = parse_id(&id, "TV show")?;
    Ok(Json(state.queries.show(id).await?))
}

pub async fn get_season(
    State(state): State<AppState>,
    Path((id, season_number)): Path<(String, String)>,
) -> AppResult<Json<SeasonDetail>> {
    let show_id = parse_id(&id, "TV show")?;
    let season_number = parse_id(&season_number, "Season")?;
    Ok(Json(state.queries.season(show_id, season_number).await?))
}

pub async fn create_show(
    State(state): State<AppState>,
    Json(payload): Json<ShowPayload>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.reconciler.import_payload(payload, None).await?;
    info!(
        show_id = outcome.show_id,
        created = outcome.show_created,
        seasons = outcome.seasons_created,
        episodes = outcome.episodes_created,
        "Show stored"
    );
    invalidate_show(&state, outcome.show_id).await;

    let detail = state.queries.show(outcome.show_id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn delete_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, "TV show")?;
    if !state.store.delete_show(id).await? {
        return Err(AppError::not_found(format!("TV show {id} not found")));
    }
    info!(show_id = id, "Show deleted");
    invalidate_show(&state, id).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn invalidate_show(state: &AppState, id: i64) {
    let params = BTreeMap::from([("id".to_string(), id.to_string())]);
    let key = show_cache_policy().key(&params, &BTreeMap::new());
    state.cache.delete(&key).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_ids_are_not_found() {
        let err = parse_id::<i64>("popular", "TV show").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "TV show popular not found");
        assert_eq!(parse_id::<i32>("3", "Season").unwrap(), 3);
    }
}
