use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::{Url, form_urlencoded};

use telly_model::{FeedPage, SeasonPayload, ShowPayload};

use super::{Feed, OriginClient};
use crate::error::{CatalogError, Result};

const API_KEY_PARAM: &str = "api_key";

/// HTTP client for the TMDB v3 API.
#[derive(Clone)]
pub struct TmdbOriginClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl fmt::Debug for TmdbOriginClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbOriginClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TmdbOriginClient {
    pub fn new(
        base_url: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("telly/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CatalogError::Internal(format!("Failed to build HTTP client: {e}"))
            })?;

        if api_key.is_none() {
            warn!("TMDB API key not configured; origin requests will likely be rejected");
        }

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Join `path_and_query` onto the base URL, keep its query parameters
    /// and inject the API key, replacing any caller supplied one.
    pub fn build_url(&self, path_and_query: &str) -> Result<Url> {
        let (path, query) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));

        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(None);

        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .filter(|(name, _)| name != API_KEY_PARAM)
            .collect();

        if !pairs.is_empty() || self.api_key.is_some() {
            let mut serializer = url.query_pairs_mut();
            for (name, value) in &pairs {
                serializer.append_pair(name, value);
            }
            if let Some(key) = &self.api_key {
                serializer.append_pair(API_KEY_PARAM, key);
            }
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = self.build_url(path_and_query)?;
        let path = path_and_query.split('?').next().unwrap_or(path_and_query);
        debug!(path, "origin GET");

        let response = self.http.get(url).send().await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "failed" };
            CatalogError::upstream(None, format!("Origin request to {path} {kind}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.chars().take(200).collect::<String>();
            return Err(CatalogError::upstream(
                Some(status.as_u16()),
                format!("Origin returned {status} for {path}: {detail}"),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            CatalogError::upstream(
                Some(status.as_u16()),
                format!("Malformed origin payload for {path}: {e}"),
            )
        })
    }
}

#[async_trait]
impl OriginClient for TmdbOriginClient {
    async fn fetch_show(&self, id: i64) -> Result<ShowPayload> {
        self.get_json(&format!("/tv/{id}")).await
    }

    async fn fetch_season(
        &self,
        show_id: i64,
        season_number: i32,
    ) -> Result<SeasonPayload> {
        self.get_json(&format!("/tv/{show_id}/season/{season_number}"))
            .await
    }

    async fn fetch_feed_page(&self, feed: Feed, page: u32) -> Result<FeedPage> {
        self.get_json(&feed.path(page)).await
    }

    async fn fetch_path(&self, path_and_query: &str) -> Result<serde_json::Value> {
        self.get_json(path_and_query).await
    }
}
