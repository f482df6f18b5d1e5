use axum::{
    Json,
    extract::{OriginalUri, State},
};
use serde_json::Value;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Forward the request path and query to the origin and relay its JSON.
pub async fn forward(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Value>> {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    Ok(Json(state.origin.fetch_path(path).await?))
}

/// Router fallback: anything under `/tv/` that no local route serves goes to
/// the origin, everything else is not found.
pub async fn unmatched(
    state: State<AppState>,
    uri: OriginalUri,
) -> AppResult<Json<Value>> {
    if uri.0.path().starts_with("/tv/") {
        return forward(state, uri).await;
    }
    Err(AppError::not_found(format!("No route for {}", uri.0.path())))
}
