//! Catalog core for telly.
//!
//! Holds everything between the HTTP surface and the outside world: the
//! response cache store, the origin API client, the catalog store ports with
//! their PostgreSQL and in-memory implementations, the entity reconciler that
//! turns upstream payloads into normalized rows, and the bulk ingestion driver.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod ingest;
pub mod origin;
pub mod reconcile;

pub use cache::{
    CacheBackend, CacheKeys, CacheSettings, CacheStore, HealthState,
    MemoryCacheBackend, RedisCacheBackend,
};
pub use catalog::{
    CatalogQueries, CatalogStore, CatalogTx, MemoryCatalogStore,
    PostgresCatalogStore,
};
pub use error::{CatalogError, Result};
pub use ingest::{FailedImport, IngestReport, IngestionDriver, Pacing};
pub use origin::{Feed, OriginClient, TmdbOriginClient};
pub use reconcile::{ImportMemo, ImportOutcome, Reconciler};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
