//! Runs against a live PostgreSQL (`DATABASE_URL`); enable with
//! `--features postgres-tests`.
#![cfg(feature = "postgres-tests")]

mod common;

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use telly_core::catalog::CatalogQueries;
use telly_core::{
    CatalogError, CatalogStore, ImportMemo, PostgresCatalogStore, Reconciler,
};

use common::{better_call_saul, breaking_bad, payload};

async fn count(pool: &PgPool, table: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?)
}

#[sqlx::test(migrator = "telly_core::MIGRATOR")]
async fn import_is_idempotent(pool: PgPool) -> Result<()> {
    let store = Arc::new(PostgresCatalogStore::new(pool.clone()));
    let reconciler = Reconciler::new(store.clone());

    let first = reconciler.import_payload(payload(breaking_bad()), None).await?;
    assert!(first.show_created);
    assert_eq!(first.episodes_created, 4);

    let second = reconciler.import_payload(payload(breaking_bad()), None).await?;
    assert!(!second.show_created);
    assert_eq!(second.references_created, 0);

    assert_eq!(count(&pool, "tv_shows").await?, 1);
    assert_eq!(count(&pool, "genres").await?, 2);
    assert_eq!(count(&pool, "seasons").await?, 2);
    assert_eq!(count(&pool, "episodes").await?, 4);
    assert_eq!(count(&pool, "detailed_people").await?, 3);
    assert_eq!(count(&pool, "episode_crew").await?, 4);
    assert_eq!(count(&pool, "episode_guest_stars").await?, 1);
    Ok(())
}

#[sqlx::test(migrator = "telly_core::MIGRATOR")]
async fn show_detail_reads_back_normalized_rows(pool: PgPool) -> Result<()> {
    let store = Arc::new(PostgresCatalogStore::new(pool));
    Reconciler::new(store.clone())
        .import_payload(payload(breaking_bad()), None)
        .await?;

    let detail = store.show_detail(1396).await?.expect("show");
    assert_eq!(detail.show.popularity, Some(288.459));
    assert_eq!(detail.show.episode_run_time, vec![45, 47]);
    assert_eq!(detail.origin_country, vec!["US".to_string()]);
    let seasons: Vec<i32> = detail.seasons.iter().map(|s| s.season_number).collect();
    assert_eq!(seasons, vec![1, 2]);

    let season = store.season_detail(1396, 1).await?.expect("season");
    let pilot = &season.episodes[0];
    assert_eq!(pilot.episode.name, "Pilot");
    assert_eq!(pilot.crew.len(), 2);
    assert_eq!(pilot.guest_stars.len(), 1);
    Ok(())
}

#[sqlx::test(migrator = "telly_core::MIGRATOR")]
async fn failed_import_leaves_nothing_behind(pool: PgPool) -> Result<()> {
    let store = Arc::new(PostgresCatalogStore::new(pool.clone()));
    let reconciler = Reconciler::new(store);

    // Season 3572 taken by another show makes the second import fail after
    // the show row, its references and season 2 were already written.
    let mut other = better_call_saul();
    other["seasons"][0]["id"] = serde_json::json!(3572);
    reconciler.import_payload(payload(other), None).await?;

    let err = reconciler
        .import_payload(payload(breaking_bad()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    assert_eq!(count(&pool, "tv_shows").await?, 1);
    assert_eq!(count(&pool, "seasons").await?, 1);
    assert_eq!(count(&pool, "episodes").await?, 1);
    assert_eq!(count(&pool, "languages").await?, 0);
    Ok(())
}

#[sqlx::test(migrator = "telly_core::MIGRATOR")]
async fn trending_orders_by_popularity(pool: PgPool) -> Result<()> {
    let store = Arc::new(PostgresCatalogStore::new(pool));
    let reconciler = Reconciler::new(store.clone());
    let memo = ImportMemo::new();
    reconciler
        .import_payload(payload(better_call_saul()), Some(&memo))
        .await?;
    reconciler
        .import_payload(payload(breaking_bad()), Some(&memo))
        .await?;

    let page = CatalogQueries::new(store.clone()).trending(1).await?;
    let ids: Vec<i64> = page.results.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1396, 60059]);
    assert_eq!(page.results[0].genre_ids, vec![18, 80]);
    assert!(CatalogQueries::new(store).trending(2).await.is_err());
    Ok(())
}

#[sqlx::test(migrator = "telly_core::MIGRATOR")]
async fn delete_cascades(pool: PgPool) -> Result<()> {
    let store = Arc::new(PostgresCatalogStore::new(pool.clone()));
    Reconciler::new(store.clone())
        .import_payload(payload(breaking_bad()), None)
        .await?;

    assert!(store.delete_show(1396).await?);
    assert_eq!(count(&pool, "seasons").await?, 0);
    assert_eq!(count(&pool, "episode_crew").await?, 0);
    assert_eq!(count(&pool, "genres").await?, 2);
    Ok(())
}
