//! Bulk ingestion from the origin's show feeds.
//!
//! Origin calls are strictly sequential with a fixed pause between them to
//! stay under upstream rate limits.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{error, info, warn};

use telly_model::ShowPayload;

use crate::catalog::CatalogStore;
use crate::error::Result;
use crate::origin::{Feed, OriginClient};
use crate::reconcile::{ImportMemo, ImportOutcome, Reconciler};

/// Memo entries kept per batch before it starts over.
const MEMO_CAPACITY: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause before each show (and each feed page after the first).
    pub show_delay: Duration,
    /// Pause after each season detail fetch.
    pub season_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_secs(1),
            season_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImport {
    pub show_id: i64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub feed: Option<Feed>,
    pub pages: Vec<u32>,
    pub imported: Vec<ImportOutcome>,
    /// Shows already in the catalog.
    pub skipped: Vec<i64>,
    pub failed: Vec<FailedImport>,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tally {
    imported: Vec<ImportOutcome>,
    skipped: Vec<i64>,
    failed: Vec<FailedImport>,
}

#[derive(Clone)]
pub struct IngestionDriver {
    origin: Arc<dyn OriginClient>,
    store: Arc<dyn CatalogStore>,
    reconciler: Reconciler,
    pacing: Pacing,
}

impl std::fmt::Debug for IngestionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionDriver")
            .field("store", &self.store)
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl IngestionDriver {
    pub fn new(
        origin: Arc<dyn OriginClient>,
        store: Arc<dyn CatalogStore>,
        pacing: Pacing,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(store.clone()),
            origin,
            store,
            pacing,
        }
    }

    /// Import every show listed on `pages` of `feed` that the catalog does
    /// not have yet. A show that fails is recorded and the batch moves on; a
    /// feed page that cannot be fetched ends the batch with that error.
    pub async fn ingest_feed(&self, feed: Feed, pages: &[u32]) -> Result<IngestReport> {
        let started = Instant::now();
        info!(?feed, ?pages, "starting feed ingestion");

        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                sleep(self.pacing.show_delay).await;
            }
            let listing = self.origin.fetch_feed_page(feed, *page).await?;
            ids.extend(
                listing
                    .results
                    .into_iter()
                    .map(|entry| entry.id)
                    .filter(|id| seen.insert(*id)),
            );
        }

        let memo = ImportMemo::with_capacity(MEMO_CAPACITY);
        let tally = self.import_missing(&ids, &memo).await?;

        let report = self.report(Some(feed), pages.to_vec(), tally, started);
        info!(
            ?feed,
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed_ms,
            "feed ingestion finished"
        );
        Ok(report)
    }

    /// Import a single show by id unless it is already present.
    pub async fn ingest_show(&self, id: i64) -> Result<IngestReport> {
        let started = Instant::now();
        let memo = ImportMemo::new();
        let tally = self.import_missing(&[id], &memo).await?;
        Ok(self.report(None, Vec::new(), tally, started))
    }

    async fn import_missing(&self, ids: &[i64], memo: &ImportMemo) -> Result<Tally> {
        let existing = self.store.existing_show_ids(ids).await?;
        let mut tally = Tally::default();

        for &id in ids {
            if existing.contains(&id) {
                tally.skipped.push(id);
                continue;
            }

            sleep(self.pacing.show_delay).await;
            match self.import_show(id, memo).await {
                Ok(outcome) => tally.imported.push(outcome),
                Err(err) => {
                    error!(show_id = id, error = %err, "failed to import show");
                    tally.failed.push(FailedImport {
                        show_id: id,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(tally)
    }

    /// Fetch a show with the full detail of each of its seasons and hand it
    /// to the reconciler.
    pub async fn import_show(&self, id: i64, memo: &ImportMemo) -> Result<ImportOutcome> {
        let mut payload = self.origin.fetch_show(id).await?;
        self.fill_seasons(&mut payload).await;
        self.reconciler.import_payload(payload, Some(memo)).await
    }

    /// Episodes, crew and guest stars are only available per season. A season
    /// whose detail cannot be fetched keeps its summary without episodes.
    async fn fill_seasons(&self, payload: &mut ShowPayload) {
        let show_id = payload.id;
        for season in payload.seasons.iter_mut() {
            let Some(number) = season.season_number else {
                continue;
            };
            match self.origin.fetch_season(show_id, number).await {
                Ok(detail) => {
                    let episode_count = detail.episode_count.or(season.episode_count);
                    *season = detail;
                    season.season_number.get_or_insert(number);
                    season.episode_count = season.episode_count.or(episode_count);
                }
                Err(err) => {
                    warn!(
                        show_id,
                        season_number = number,
                        error = %err,
                        "season detail unavailable, importing summary only"
                    );
                }
            }
            sleep(self.pacing.season_delay).await;
        }
    }

    fn report(
        &self,
        feed: Option<Feed>,
        pages: Vec<u32>,
        tally: Tally,
        started: Instant,
    ) -> IngestReport {
        IngestReport {
            feed,
            pages,
            imported: tally.imported,
            skipped: tally.skipped,
            failed: tally.failed,
            elapsed_ms: started.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalogStore;
    use crate::error::CatalogError;
    use crate::origin::MockOriginClient;
    use mockall::predicate::eq;
    use serde_json::json;
    use telly_model::{FeedPage, SeasonPayload};

    fn show(id: i64, seasons: &[i32]) -> ShowPayload {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("Show {id}"),
            "popularity": 10.0,
            "seasons": seasons
                .iter()
                .map(|n| json!({"id": id * 100 + i64::from(*n), "season_number": n, "episode_count": 9}))
                .collect::<Vec<_>>(),
        }))
        .unwrap()
    }

    fn season(show_id: i64, number: i32) -> SeasonPayload {
        serde_json::from_value(json!({
            "id": show_id * 100 + i64::from(number),
            "season_number": number,
            "episodes": [
                {"id": show_id * 1000 + 1, "episode_number": 1, "name": "Pilot",
                 "crew": [{"id": 7, "name": "Director", "job": "Director"}],
                 "guest_stars": []},
                {"id": show_id * 1000 + 2, "episode_number": 2, "name": "Second",
                 "crew": [{"id": 7, "name": "Director", "job": "Director"}],
                 "guest_stars": [{"id": 8, "name": "Guest"}]}
            ]
        }))
        .unwrap()
    }

    fn feed_page(page: u32, ids: &[i64]) -> FeedPage {
        serde_json::from_value(json!({
            "page": page,
            "results": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
            "total_pages": 5,
            "total_results": 100,
        }))
        .unwrap()
    }

    fn driver(origin: MockOriginClient, store: Arc<MemoryCatalogStore>) -> IngestionDriver {
        IngestionDriver::new(Arc::new(origin), store, Pacing::default())
    }

    #[tokio::test(start_paused = true)]
    async fn imports_missing_shows_and_skips_known_ones() {
        let store = Arc::new(MemoryCatalogStore::new());
        let reconciler = Reconciler::new(store.clone());
        reconciler.import_payload(show(1, &[]), None).await.unwrap();

        let mut origin = MockOriginClient::new();
        origin
            .expect_fetch_feed_page()
            .with(eq(Feed::Trending), eq(1))
            .times(1)
            .returning(|_, page| Ok(feed_page(page, &[1, 2])));
        origin
            .expect_fetch_show()
            .with(eq(2))
            .times(1)
            .returning(|id| Ok(show(id, &[1])));
        origin
            .expect_fetch_season()
            .with(eq(2), eq(1))
            .times(1)
            .returning(|id, n| Ok(season(id, n)));

        let started = Instant::now();
        let report = driver(origin, store.clone())
            .ingest_feed(Feed::Trending, &[1])
            .await
            .unwrap();

        assert_eq!(report.skipped, vec![1]);
        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].episodes_created, 2);
        assert!(report.failed.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(1500));

        let counts = store.counts().await;
        assert_eq!(counts.shows, 2);
        assert_eq!(counts.episodes, 2);
        assert_eq!(counts.credits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_show_does_not_stop_the_batch() {
        let store = Arc::new(MemoryCatalogStore::new());

        let mut origin = MockOriginClient::new();
        origin
            .expect_fetch_feed_page()
            .times(2)
            .returning(|_, page| Ok(feed_page(page, if page == 1 { &[3, 4] } else { &[4, 5] })));
        origin.expect_fetch_show().returning(|id| {
            if id == 4 {
                Err(CatalogError::upstream(Some(500), "boom"))
            } else {
                Ok(show(id, &[]))
            }
        });

        let report = driver(origin, store.clone())
            .ingest_feed(Feed::Popular, &[1, 2])
            .await
            .unwrap();

        let imported: Vec<i64> = report.imported.iter().map(|o| o.show_id).collect();
        assert_eq!(imported, vec![3, 5]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].show_id, 4);
        assert_eq!(report.pages, vec![1, 2]);
        assert_eq!(store.show_ids().await, vec![3, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_season_keeps_the_show() {
        let store = Arc::new(MemoryCatalogStore::new());

        let mut origin = MockOriginClient::new();
        origin
            .expect_fetch_show()
            .returning(|id| Ok(show(id, &[1, 2])));
        origin.expect_fetch_season().returning(|id, n| {
            if n == 2 {
                Err(CatalogError::upstream(Some(404), "missing"))
            } else {
                Ok(season(id, n))
            }
        });

        let report = driver(origin, store.clone()).ingest_show(9).await.unwrap();

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.imported[0].seasons_created, 2);
        let detail = store.show_detail(9).await.unwrap().unwrap();
        assert_eq!(detail.seasons.len(), 2);
        assert_eq!(detail.seasons[1].episode_count, Some(9));
    }

    #[tokio::test(start_paused = true)]
    async fn feed_page_failure_ends_the_batch() {
        let store = Arc::new(MemoryCatalogStore::new());
        let mut origin = MockOriginClient::new();
        origin
            .expect_fetch_feed_page()
            .returning(|_, _| Err(CatalogError::upstream(None, "timed out")));

        let err = driver(origin, store)
            .ingest_feed(Feed::Trending, &[1])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Upstream { .. }));
    }
}
