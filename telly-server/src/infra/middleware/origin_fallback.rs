//! Serves a locally missing resource from the origin API.
//!
//! Only responses tagged [`ErrorKind::NotFound`] trigger the fallback; every
//! other outcome passes through unchanged. The upstream path is the original
//! request path and query, since the read routes mirror the origin's layout.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri, RawPathParams, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, info, warn};

use telly_core::CatalogError;

use crate::infra::{app_state::AppState, errors::ErrorKind};

/// Marks a response synthesized from the origin. The response cache never
/// stores these.
#[derive(Debug, Clone, Copy)]
pub struct OriginFallback;

/// Set by a handler whose response is already on its way to the client. A
/// not-found carrying this marker is returned as is.
#[derive(Debug, Clone, Copy)]
pub struct ResponseCommitted;

pub async fn origin_fallback(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let uri = match OriginalUri::from_request_parts(&mut parts, &state).await {
        Ok(OriginalUri(uri)) => uri,
        Err(_) => parts.uri.clone(),
    };
    let show_id = RawPathParams::from_request_parts(&mut parts, &state)
        .await
        .ok()
        .and_then(|params| {
            params
                .iter()
                .find(|(name, _)| *name == "id")
                .and_then(|(_, value)| value.parse::<i64>().ok())
        });

    let response = next.run(Request::from_parts(parts, body)).await;

    if response.extensions().get::<ErrorKind>() != Some(&ErrorKind::NotFound) {
        return response;
    }
    if response.extensions().get::<ResponseCommitted>().is_some() {
        debug!("Response already committed for {}; keeping the not-found", uri);
        return response;
    }

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    info!(path = %path, "Not found locally; falling back to origin");

    match state.origin.fetch_path(&path).await {
        Ok(payload) => {
            if state.config().ingest.persist_on_fallback
                && let Some(id) = show_id
            {
                persist_in_background(&state, id);
            }
            let mut response = (StatusCode::OK, Json(payload)).into_response();
            response.extensions_mut().insert(OriginFallback);
            response
        }
        Err(err) => {
            warn!(path = %path, error = %err, "Origin fallback failed");
            let (status, message) = match err {
                CatalogError::Upstream {
                    status: Some(404),
                    message,
                } => (StatusCode::NOT_FOUND, message),
                CatalogError::Upstream { message, .. } => {
                    (StatusCode::BAD_GATEWAY, message)
                }
                other => (StatusCode::BAD_GATEWAY, other.to_string()),
            };
            let mut response = (
                status,
                Json(json!({
                    "error": "External API error",
                    "message": message,
                })),
            )
                .into_response();
            response.extensions_mut().insert(OriginFallback);
            response
        }
    }
}

fn persist_in_background(state: &AppState, show_id: i64) {
    let ingest = state.ingest.clone();
    tokio::spawn(async move {
        match ingest.ingest_show(show_id).await {
            Ok(report) if report.failed.is_empty() => debug!(
                show_id,
                imported = report.imported.len(),
                "Persisted show served by origin fallback"
            ),
            Ok(_) => warn!(show_id, "Failed to persist fallback show"),
            Err(err) => warn!(show_id, error = %err, "Failed to persist fallback show"),
        }
    });
}
