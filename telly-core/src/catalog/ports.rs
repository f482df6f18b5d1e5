use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;

use telly_model::{
    Country, DetailedPerson, Episode, Genre, Language, Network, Person,
    ProductionCompany, Season, SeasonDetail, Show, ShowDetail, ShowSummary,
};

use crate::error::Result;

/// Natural key of a shared reference row: upstream numeric id or ISO code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RefKey {
    Id(i64),
    Code(String),
}

impl fmt::Display for RefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKey::Id(id) => write!(f, "{id}"),
            RefKey::Code(code) => f.write_str(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceKind {
    Genre,
    Network,
    Company,
    /// Show creators ([`Person`]).
    Creator,
    /// Episode crew and guest stars ([`DetailedPerson`]).
    Credit,
    Country,
    Language,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Genre => "genre",
            ReferenceKind::Network => "network",
            ReferenceKind::Company => "production_company",
            ReferenceKind::Creator => "person",
            ReferenceKind::Credit => "detailed_person",
            ReferenceKind::Country => "country",
            ReferenceKind::Language => "language",
        }
    }
}

/// Rows to insert for one reference kind.
#[derive(Debug, Clone)]
pub enum ReferenceRows {
    Genres(Vec<Genre>),
    Networks(Vec<Network>),
    Companies(Vec<ProductionCompany>),
    Creators(Vec<Person>),
    Credits(Vec<DetailedPerson>),
    Countries(Vec<Country>),
    Languages(Vec<Language>),
}

impl ReferenceRows {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            ReferenceRows::Genres(_) => ReferenceKind::Genre,
            ReferenceRows::Networks(_) => ReferenceKind::Network,
            ReferenceRows::Companies(_) => ReferenceKind::Company,
            ReferenceRows::Creators(_) => ReferenceKind::Creator,
            ReferenceRows::Credits(_) => ReferenceKind::Credit,
            ReferenceRows::Countries(_) => ReferenceKind::Country,
            ReferenceRows::Languages(_) => ReferenceKind::Language,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReferenceRows::Genres(rows) => rows.len(),
            ReferenceRows::Networks(rows) => rows.len(),
            ReferenceRows::Companies(rows) => rows.len(),
            ReferenceRows::Creators(rows) => rows.len(),
            ReferenceRows::Credits(rows) => rows.len(),
            ReferenceRows::Countries(rows) => rows.len(),
            ReferenceRows::Languages(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Show association tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShowRelation {
    Genres,
    Networks,
    Creators,
    Companies,
    ProductionCountries,
    OriginCountries,
    SpokenLanguages,
}

impl ShowRelation {
    pub fn target(self) -> ReferenceKind {
        match self {
            ShowRelation::Genres => ReferenceKind::Genre,
            ShowRelation::Networks => ReferenceKind::Network,
            ShowRelation::Creators => ReferenceKind::Creator,
            ShowRelation::Companies => ReferenceKind::Company,
            ShowRelation::ProductionCountries | ShowRelation::OriginCountries => {
                ReferenceKind::Country
            }
            ShowRelation::SpokenLanguages => ReferenceKind::Language,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EpisodeRole {
    Crew,
    GuestStar,
}

/// One unit of work against the catalog. Every write lands on commit or not
/// at all; dropping a transaction without committing rolls it back.
///
/// Inserts never overwrite: a row whose key already exists is left as is and
/// reported as not created.
#[async_trait]
pub trait CatalogTx: Send + Sync {
    /// Subset of `keys` already present for `kind`.
    async fn find_references(
        &self,
        kind: ReferenceKind,
        keys: &[RefKey],
    ) -> Result<HashSet<RefKey>>;

    /// Insert rows, skipping keys that already exist. Returns rows inserted.
    async fn create_references(&self, rows: ReferenceRows) -> Result<u64>;

    async fn insert_show(&self, show: &Show) -> Result<bool>;

    async fn link_show(
        &self,
        show_id: i64,
        relation: ShowRelation,
        keys: &[RefKey],
    ) -> Result<()>;

    async fn seasons_for_show(&self, show_id: i64) -> Result<Vec<Season>>;

    async fn create_season(&self, season: &Season) -> Result<bool>;

    async fn existing_episode_ids(&self, ids: &[i64]) -> Result<HashSet<i64>>;

    async fn create_episode(&self, episode: &Episode) -> Result<bool>;

    async fn link_episode_people(
        &self,
        episode_id: i64,
        role: EpisodeRole,
        person_ids: &[i64],
    ) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Catalog persistence port.
#[async_trait]
pub trait CatalogStore: Send + Sync + fmt::Debug {
    async fn begin(&self) -> Result<Box<dyn CatalogTx>>;

    async fn show_detail(&self, id: i64) -> Result<Option<ShowDetail>>;

    async fn season_detail(
        &self,
        show_id: i64,
        season_number: i32,
    ) -> Result<Option<SeasonDetail>>;

    /// Shows ordered by popularity (highest first, unknown last), then id.
    async fn show_summaries(&self, offset: u64, limit: u32) -> Result<Vec<ShowSummary>>;

    async fn count_shows(&self) -> Result<u64>;

    /// Subset of `ids` that are persisted shows.
    async fn existing_show_ids(&self, ids: &[i64]) -> Result<HashSet<i64>>;

    /// Remove a show with its seasons, episodes and association rows.
    /// Shared reference rows stay.
    async fn delete_show(&self, id: i64) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}
