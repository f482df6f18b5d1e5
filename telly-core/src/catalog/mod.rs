//! Catalog persistence: store ports, the PostgreSQL and in-memory
//! implementations, and the read queries served by the HTTP layer.

pub mod memory;
pub mod ports;
pub mod postgres;
pub mod queries;

pub use memory::{MemoryCatalogStore, RowCounts};
pub use ports::{
    CatalogStore, CatalogTx, EpisodeRole, RefKey, ReferenceKind, ReferenceRows,
    ShowRelation,
};
pub use postgres::PostgresCatalogStore;
pub use queries::CatalogQueries;
