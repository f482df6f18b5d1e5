#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use telly_config::{
    Config,
    loader::compose,
    sources::{EnvConfig, FileConfig},
};
use telly_core::{
    CacheSettings, CacheStore, CatalogError, Feed, MemoryCacheBackend,
    MemoryCatalogStore, OriginClient, Reconciler, Result,
};
use telly_model::{FeedPage, SeasonPayload, ShowPayload};
use telly_server::{AppState, create_app};

/// What the stub origin answers to arbitrary path requests.
#[derive(Debug, Clone)]
pub enum OriginReply {
    Json(Value),
    Status(u16),
}

/// Origin stand-in that records every path it is asked for.
#[derive(Debug)]
pub struct StubOrigin {
    reply: OriginReply,
    calls: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl StubOrigin {
    pub fn replying(reply: OriginReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn json(value: Value) -> Self {
        Self::replying(OriginReply::Json(value))
    }

    pub fn failing(status: u16) -> Self {
        Self::replying(OriginReply::Status(status))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    fn record(&self, path: String) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path);
    }

    fn answer(&self) -> Result<Value> {
        match &self.reply {
            OriginReply::Json(value) => Ok(value.clone()),
            OriginReply::Status(status) => Err(CatalogError::upstream(
                Some(*status),
                format!("origin answered {status}"),
            )),
        }
    }
}

#[async_trait]
impl OriginClient for StubOrigin {
    async fn fetch_show(&self, id: i64) -> Result<ShowPayload> {
        self.record(format!("/tv/{id}"));
        Ok(serde_json::from_value(self.answer()?)?)
    }

    async fn fetch_season(&self, show_id: i64, season_number: i32) -> Result<SeasonPayload> {
        self.record(format!("/tv/{show_id}/season/{season_number}"));
        Ok(serde_json::from_value(self.answer()?)?)
    }

    async fn fetch_feed_page(&self, feed: Feed, page: u32) -> Result<FeedPage> {
        self.record(feed.path(page));
        Ok(serde_json::from_value(self.answer()?)?)
    }

    async fn fetch_path(&self, path_and_query: &str) -> Result<Value> {
        self.record(path_and_query.to_string());
        self.answer()
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryCatalogStore>,
    pub backend: Arc<MemoryCacheBackend>,
    pub origin: Arc<StubOrigin>,
}

pub fn test_config() -> Config {
    let mut config = compose(FileConfig::default(), EnvConfig::default())
        .expect("default configuration composes");
    config.ingest.show_delay = Duration::ZERO;
    config.ingest.season_delay = Duration::ZERO;
    config
}

pub async fn build_test_app(origin: StubOrigin) -> TestApp {
    build_test_app_with(origin, test_config(), true).await
}

pub async fn build_test_app_with(
    origin: StubOrigin,
    config: Config,
    with_cache: bool,
) -> TestApp {
    let store = Arc::new(MemoryCatalogStore::new());
    let backend = Arc::new(MemoryCacheBackend::new());
    let cache = if with_cache {
        CacheStore::connect(backend.clone(), CacheSettings::default()).await
    } else {
        CacheStore::disabled()
    };
    let origin = Arc::new(origin);
    let state = AppState::new(Arc::new(config), store.clone(), cache, origin.clone());
    TestApp {
        app: create_app(state.clone()),
        state,
        store,
        backend,
        origin,
    }
}

impl TestApp {
    pub async fn seed(&self, show: Value) {
        Reconciler::new(self.store.clone())
            .import_payload(serde_json::from_value(show).unwrap(), None)
            .await
            .expect("seed import");
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Cache writes happen off the request path; wait for one to land.
    pub async fn wait_for_cached(&self, key: &str) {
        for _ in 0..100 {
            if self.backend.contains(key) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("cache entry {key} never written");
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

pub fn show(id: i64, name: &str, popularity: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "popularity": popularity,
        "genres": [{"id": 18, "name": "Drama"}],
        "networks": [{"id": 174, "name": "AMC", "origin_country": "US"}],
        "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}],
        "seasons": [
            {
                "id": id * 10,
                "season_number": 1,
                "name": "Season 1",
                "episodes": [
                    {"id": id * 100, "episode_number": 1, "name": "Pilot",
                     "crew": [{"id": 66633, "name": "Vince Gilligan", "job": "Director"}],
                     "guest_stars": [{"id": 92495, "name": "John Koyama"}]}
                ]
            }
        ]
    })
}
