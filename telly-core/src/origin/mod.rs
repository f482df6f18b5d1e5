//! Upstream media API.

pub mod tmdb;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use telly_model::{FeedPage, SeasonPayload, ShowPayload};

use crate::error::Result;

pub use tmdb::TmdbOriginClient;

/// Show listing exposed by the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Trending,
    Popular,
}

impl Feed {
    pub fn path(self, page: u32) -> String {
        match self {
            Feed::Trending => {
                format!("/trending/tv/day?page={page}&language=en-US")
            }
            Feed::Popular => format!("/tv/popular?page={page}&language=en-US"),
        }
    }
}

/// Calls to the origin. Implementations do not retry; any non-2xx answer,
/// transport failure or timeout is a [`crate::CatalogError::Upstream`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OriginClient: Send + Sync {
    async fn fetch_show(&self, id: i64) -> Result<ShowPayload>;

    async fn fetch_season(
        &self,
        show_id: i64,
        season_number: i32,
    ) -> Result<SeasonPayload>;

    /// `Feed::Trending` is the trending page lookup.
    async fn fetch_feed_page(&self, feed: Feed, page: u32) -> Result<FeedPage>;

    /// Fetch any origin path (with optional query string) as raw JSON.
    async fn fetch_path(&self, path_and_query: &str) -> Result<serde_json::Value>;
}
