use std::sync::Arc;

use telly_model::{PAGE_SIZE, Page, SeasonDetail, ShowDetail, ShowSummary};

use super::CatalogStore;
use crate::error::{CatalogError, Result};

/// Read side of the catalog. Absent rows are reported as
/// [`CatalogError::NotFound`] so the HTTP layer can fall back to the origin.
#[derive(Debug, Clone)]
pub struct CatalogQueries {
    store: Arc<dyn CatalogStore>,
}

impl CatalogQueries {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn show(&self, id: i64) -> Result<ShowDetail> {
        self.store
            .show_detail(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("TV show {id} not found")))
    }

    pub async fn season(&self, show_id: i64, season_number: i32) -> Result<SeasonDetail> {
        self.store
            .season_detail(show_id, season_number)
            .await?
            .ok_or_else(|| {
                CatalogError::NotFound(format!(
                    "Season {season_number} of TV show {show_id} not found"
                ))
            })
    }

    /// One page of locally stored shows, most popular first.
    ///
    /// Pages are 1-based. A page past the last one is `NotFound`, never an
    /// empty page. With no shows stored there are no pages at all.
    pub async fn trending(&self, page: u32) -> Result<Page<ShowSummary>> {
        if page < 1 {
            return Err(CatalogError::Validation(
                "page must be greater than or equal to 1".into(),
            ));
        }

        let total = self.store.count_shows().await?;
        let total_pages = Page::<ShowSummary>::page_count(total);
        if page > total_pages {
            return Err(CatalogError::NotFound(format!(
                "Page {page} is beyond the last page ({total_pages})"
            )));
        }

        let results = self
            .store
            .show_summaries(Page::<ShowSummary>::offset(page), PAGE_SIZE)
            .await?;

        Ok(Page {
            page,
            results,
            total_pages,
            total_results: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalogStore;
    use crate::reconcile::Reconciler;
    use telly_model::{Show, ShowImport};

    fn import(id: i64, popularity: f64) -> ShowImport {
        let mut show = Show::new(id, format!("Show {id}"));
        show.popularity = Some(popularity);
        ShowImport {
            show,
            genres: vec![],
            networks: vec![],
            creators: vec![],
            production_companies: vec![],
            production_countries: vec![],
            origin_countries: vec![],
            spoken_languages: vec![],
            seasons: vec![],
        }
    }

    async fn seeded(count: i64) -> CatalogQueries {
        let store = Arc::new(MemoryCatalogStore::new());
        let reconciler = Reconciler::new(store.clone());
        for id in 1..=count {
            reconciler
                .import(&import(id, (id % 7) as f64), None)
                .await
                .unwrap();
        }
        CatalogQueries::new(store)
    }

    #[tokio::test]
    async fn missing_show_is_not_found() {
        let queries = seeded(0).await;
        assert!(queries.show(99).await.unwrap_err().is_not_found());
        assert!(queries.season(99, 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn trending_pages_and_boundary() {
        let queries = seeded(45).await;

        let first = queries.trending(1).await.unwrap();
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_results, 45);
        assert_eq!(first.results.len(), 20);
        let pops: Vec<_> = first.results.iter().map(|s| s.popularity).collect();
        assert!(pops.windows(2).all(|w| w[0] >= w[1]));

        let last = queries.trending(3).await.unwrap();
        assert_eq!(last.results.len(), 5);

        assert!(queries.trending(4).await.unwrap_err().is_not_found());
        assert!(matches!(
            queries.trending(0).await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn empty_catalog_has_no_first_page() {
        let queries = seeded(0).await;
        assert!(queries.trending(1).await.unwrap_err().is_not_found());
        assert!(queries.trending(2).await.unwrap_err().is_not_found());
    }
}
