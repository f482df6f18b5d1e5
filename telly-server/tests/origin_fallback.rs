use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower::ServiceExt;

use telly_server::infra::{
    errors::AppError,
    middleware::{ResponseCommitted, origin_fallback},
};

#[path = "support/mod.rs"]
mod support;

use support::{StubOrigin, body_json, build_test_app, build_test_app_with, show, test_config};

#[tokio::test]
async fn missing_show_is_served_from_origin() {
    let upstream = json!({"id": 99, "name": "Only Upstream", "seasons": []});
    let t = build_test_app(StubOrigin::json(upstream.clone())).await;

    let response = t.get("/tv/99?language=en-US").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, upstream);
    assert_eq!(t.origin.paths(), vec!["/tv/99?language=en-US".to_string()]);
}

#[tokio::test]
async fn missing_season_is_served_from_origin() {
    let upstream = json!({"id": 7, "season_number": 3, "episodes": []});
    let t = build_test_app(StubOrigin::json(upstream.clone())).await;
    t.seed(show(1, "Local", 1.0)).await;

    let response = t.get("/tv/1/season/3").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, upstream);
    assert_eq!(t.origin.paths(), vec!["/tv/1/season/3".to_string()]);
}

#[tokio::test]
async fn local_rows_never_touch_the_origin() {
    let t = build_test_app(StubOrigin::failing(500)).await;
    t.seed(show(1, "Local", 1.0)).await;

    let response = t.get("/tv/1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Local");
    assert_eq!(t.origin.calls(), 0);
}

#[tokio::test]
async fn origin_failure_is_a_bad_gateway() {
    let t = build_test_app(StubOrigin::failing(503)).await;

    let response = t.get("/tv/12345").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "External API error");
    assert!(body["message"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn not_found_upstream_stays_not_found() {
    let t = build_test_app(StubOrigin::failing(404)).await;

    let response = t.get("/tv/12345").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "External API error");
}

#[tokio::test]
async fn fallback_responses_are_not_cached() {
    let t = build_test_app(StubOrigin::json(json!({"id": 99, "name": "Upstream"}))).await;

    t.get("/tv/99").await;
    let second = t.get("/tv/99").await;

    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(t.origin.calls(), 2);
    assert!(t.backend.is_empty());
}

async fn committed_not_found() -> Response {
    let mut response = AppError::not_found("already streaming").into_response();
    response.extensions_mut().insert(ResponseCommitted);
    response
}

async fn rejected() -> Result<(), AppError> {
    Err(AppError::bad_request("bad input"))
}

#[tokio::test]
async fn committed_response_keeps_the_original_error() {
    let t = build_test_app(StubOrigin::json(json!({"id": 1}))).await;
    let app = Router::new()
        .route("/tv/{id}", get(committed_not_found))
        .route("/tv/{id}/season/{season_number}", get(rejected))
        .layer(middleware::from_fn_with_state(t.state.clone(), origin_fallback))
        .with_state(t.state.clone());

    let response = app
        .clone()
        .oneshot(axum::http::Request::get("/tv/1").body(axum::body::Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["message"], "already streaming");

    let response = app
        .oneshot(
            axum::http::Request::get("/tv/1/season/1")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(t.origin.calls(), 0);
}

#[tokio::test]
async fn fallback_can_persist_the_show() {
    let mut config = test_config();
    config.ingest.persist_on_fallback = true;
    let t = build_test_app_with(StubOrigin::json(show(42, "Fetched", 3.0)), config, true).await;

    let response = t.get("/tv/42").await;
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..100 {
        if t.store.show_ids().await.contains(&42) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("show 42 was never persisted");
}
