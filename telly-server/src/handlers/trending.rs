use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use telly_model::{Page, ShowSummary};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    middleware::CachePolicy,
};

pub fn trending_cache_policy() -> CachePolicy {
    CachePolicy::new("trending.tv_day").warmed()
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    page: Option<String>,
}

impl TrendingQuery {
    fn page(&self) -> AppResult<u32> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                AppError::bad_request(format!(
                    "page must be a positive integer, got {raw}"
                ))
            }),
        }
    }
}

/// Locally stored shows by popularity. Pages past the end are not found and
/// have no origin fallback.
pub async fn trending_day(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> AppResult<Json<Page<ShowSummary>>> {
    let page = query.page()?;
    Ok(Json(state.queries.trending(page).await?))
}
