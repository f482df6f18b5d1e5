//! Bulk ingestion triggers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::info;

use telly_core::{Feed, IngestReport};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct PagesQuery {
    /// Comma separated page numbers, `1` when absent.
    pages: Option<String>,
}

/// Parse `1,2, 5` into page numbers. Every entry must be a positive integer.
pub fn parse_pages(raw: Option<&str>) -> AppResult<Vec<u32>> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(vec![1]);
    };
    raw.split(',')
        .map(|part| match part.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(AppError::bad_request(format!(
                "invalid page number '{}'",
                part.trim()
            ))),
        })
        .collect()
}

pub async fn ingest_feed(
    State(state): State<AppState>,
    Path(feed): Path<Feed>,
    Query(query): Query<PagesQuery>,
) -> AppResult<Json<IngestReport>> {
    let pages = parse_pages(query.pages.as_deref())?;
    info!(?feed, ?pages, "Ingestion requested");
    Ok(Json(state.ingest.ingest_feed(feed, &pages).await?))
}

pub async fn ingest_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<IngestReport>> {
    info!(show_id = id, "Single show ingestion requested");
    Ok(Json(state.ingest.ingest_show(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_default_to_first() {
        assert_eq!(parse_pages(None).unwrap(), vec![1]);
        assert_eq!(parse_pages(Some(" ")).unwrap(), vec![1]);
    }

    #[test]
    fn pages_are_comma_separated() {
        assert_eq!(parse_pages(Some("1, 2,5")).unwrap(), vec![1, 2, 5]);
    }

    #[test]
    fn bad_pages_are_rejected() {
        assert!(parse_pages(Some("1,x")).is_err());
        assert!(parse_pages(Some("0")).is_err());
        assert!(parse_pages(Some("1,,2")).is_err());
    }
}
