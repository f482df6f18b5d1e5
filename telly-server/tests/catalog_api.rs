use anyhow::Result;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

#[path = "support/mod.rs"]
mod support;

use support::{StubOrigin, TestApp, build_test_app, show};

fn server(t: &TestApp) -> TestServer {
    TestServer::new(t.app.clone()).unwrap()
}

#[tokio::test]
async fn create_returns_the_stored_detail() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    let server = server(&t);

    let response = server.post("/tv").json(&show(5, "Posted", 2.5)).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], 5);
    assert_eq!(body["name"], "Posted");
    assert_eq!(body["genres"][0]["name"], "Drama");
    assert_eq!(body["networks"][0]["origin_country"], "US");
    assert_eq!(body["seasons"][0]["season_number"], 1);

    let season = server.get("/tv/5/season/1").await;
    season.assert_status_ok();
    let season: Value = season.json();
    assert_eq!(season["episodes"][0]["crew"][0]["id"], 66633);
    Ok(())
}

#[tokio::test]
async fn create_twice_keeps_one_copy() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    let server = server(&t);

    server.post("/tv").json(&show(5, "Posted", 2.5)).await.assert_status(StatusCode::CREATED);
    server.post("/tv").json(&show(5, "Posted", 2.5)).await.assert_status(StatusCode::CREATED);

    let counts = t.store.counts().await;
    assert_eq!(counts.shows, 1);
    assert_eq!(counts.seasons, 1);
    assert_eq!(counts.episodes, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_payload_is_rejected() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    let server = server(&t);

    let response = server.post("/tv").json(&json!({"id": 5, "name": ""})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 400);
    assert_eq!(t.store.counts().await.shows, 0);
    Ok(())
}

#[tokio::test]
async fn delete_then_delete_again() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    t.seed(show(5, "Doomed", 1.0)).await;
    let server = server(&t);

    server.delete("/tv/5").await.assert_status(StatusCode::NO_CONTENT);
    server.delete("/tv/5").await.assert_status_not_found();

    let counts = t.store.counts().await;
    assert_eq!(counts.shows, 0);
    assert_eq!(counts.episodes, 0);
    assert_eq!(counts.genres, 1);
    assert_eq!(t.origin.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn trending_pages_by_popularity() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    t.seed(show(1, "Low", 1.0)).await;
    t.seed(show(2, "High", 50.0)).await;
    let server = server(&t);

    let response = server.get("/trending/tv/day").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["total_results"], 2);
    let ids: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1]);

    server.get("/trending/tv/day?page=2").await.assert_status_not_found();
    server.get("/trending/tv/day?page=0").await.assert_status(StatusCode::BAD_REQUEST);
    server.get("/trending/tv/day?page=two").await.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(t.origin.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_catalog_has_no_trending_pages() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    let server = server(&t);

    let response = server.get("/trending/tv/day").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 404);

    assert!(t.backend.is_empty());
    assert_eq!(t.origin.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn search_and_unknown_tv_paths_pass_through() -> Result<()> {
    let upstream = json!({"page": 1, "results": [{"id": 1396}]});
    let t = build_test_app(StubOrigin::json(upstream.clone())).await;
    let server = server(&t);

    let search = server.get("/search/tv").add_query_param("query", "breaking").await;
    search.assert_status_ok();
    assert_eq!(search.json::<Value>(), upstream);

    let episode = server.get("/tv/1396/season/1/episode/1").await;
    episode.assert_status_ok();

    assert_eq!(
        t.origin.paths(),
        vec![
            "/search/tv?query=breaking".to_string(),
            "/tv/1396/season/1/episode/1".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn passthrough_relays_upstream_failures() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    let server = server(&t);

    server.get("/search/tv").await.assert_status(StatusCode::BAD_GATEWAY);
    server.get("/unknown").await.assert_status_not_found();
    assert_eq!(t.origin.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn admin_ingest_imports_a_show() -> Result<()> {
    let t = build_test_app(StubOrigin::json(show(42, "Fetched", 3.0))).await;
    let server = server(&t);

    let response = server.post("/admin/ingest/show/42").await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["imported"][0]["show_id"], 42);
    assert_eq!(report["failed"], json!([]));

    let again: Value = server.post("/admin/ingest/show/42").await.json();
    assert_eq!(again["skipped"], json!([42]));
    assert_eq!(t.store.show_ids().await, vec![42]);
    Ok(())
}

#[tokio::test]
async fn admin_ingest_validates_pages() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    let server = server(&t);

    server
        .post("/admin/ingest/trending")
        .add_query_param("pages", "1,x")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(t.origin.calls(), 0);

    server
        .post("/admin/ingest/popular")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(t.origin.paths(), vec!["/tv/popular?page=1&language=en-US".to_string()]);
    Ok(())
}

#[tokio::test]
async fn ping_and_health() -> Result<()> {
    let t = build_test_app(StubOrigin::failing(500)).await;
    let server = server(&t);

    server.get("/ping").await.assert_status_ok();

    let health = server.get("/health").await;
    health.assert_status_ok();
    let body: Value = health.json();
    assert_eq!(body["checks"]["database"]["status"], "healthy");
    assert_eq!(body["checks"]["cache"]["status"], "healthy");
    Ok(())
}
